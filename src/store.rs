//! Persistence (C5): a durable key/value store mapping canonical sentence to [`NodeRecord`],
//! backed by an embedded SQLite file so that child/descendant queries are indexed lookups rather
//! than full scans.

use std::collections::HashMap;
use std::path::Path;

use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::Result;
use crate::node::{NodeRecord, Status};

/// A durable map from canonical sentence to [`NodeRecord`].
///
/// Every write that represents one roll-out's backprop happens inside a single transaction
/// (§5: "either all updates for that roll-out are durable or none are").
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens (creating if necessary) the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             CREATE TABLE IF NOT EXISTS nodes (
                 sentence TEXT PRIMARY KEY,
                 parent TEXT NOT NULL,
                 score REAL NOT NULL,
                 cumulative REAL NOT NULL,
                 mean_descendant REAL NOT NULL,
                 visits INTEGER NOT NULL,
                 status INTEGER NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_nodes_parent ON nodes(parent);",
        )?;
        info!("opened store at {}", path.display());
        Ok(Self { conn })
    }

    /// Opens an in-memory store. Used by tests and by `check`-only invocations that never persist
    /// anything.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            "CREATE TABLE nodes (
                 sentence TEXT PRIMARY KEY,
                 parent TEXT NOT NULL,
                 score REAL NOT NULL,
                 cumulative REAL NOT NULL,
                 mean_descendant REAL NOT NULL,
                 visits INTEGER NOT NULL,
                 status INTEGER NOT NULL
             );
             CREATE INDEX idx_nodes_parent ON nodes(parent);",
        )?;
        Ok(Self { conn })
    }

    /// Looks up a node by its canonical sentence.
    pub fn get(&self, sentence: &str) -> Result<Option<NodeRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT sentence, parent, score, cumulative, mean_descendant, visits, status
                 FROM nodes WHERE sentence = ?1",
                params![sentence],
                row_to_record,
            )
            .optional()?;
        Ok(row)
    }

    /// Upserts a node record. `parent` is derived by the caller (dropping the sentence's last
    /// token) and stored as a plain column so `children_of` can be an indexed lookup (I1: a
    /// child's parent is always materialised first by the search loop before this call).
    pub fn put(&mut self, parent: &str, record: &NodeRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO nodes (sentence, parent, score, cumulative, mean_descendant, visits, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(sentence) DO UPDATE SET
                 score = excluded.score,
                 cumulative = excluded.cumulative,
                 mean_descendant = excluded.mean_descendant,
                 visits = excluded.visits,
                 status = excluded.status",
            params![
                record.sentence,
                parent,
                record.score,
                record.cumulative_score,
                record.mean_descendant_score,
                record.visits,
                record.status.code(),
            ],
        )?;
        debug!("wrote node `{}` (status={:?})", record.sentence, record.status);
        Ok(())
    }

    /// Runs `writes` inside a single transaction; all of them become durable together, or none
    /// do. Used by the search loop's backprop phase.
    pub fn with_transaction<F>(&mut self, writes: F) -> Result<()>
    where
        F: FnOnce(&mut Store) -> Result<()>,
    {
        self.conn.execute("BEGIN", [])?;
        match writes(self) {
            Ok(()) => {
                self.conn.execute("COMMIT", [])?;
                Ok(())
            }
            Err(e) => {
                // Best-effort rollback; if it fails too, the original error still propagates.
                let _ = self.conn.execute("ROLLBACK", []);
                Err(e)
            }
        }
    }

    /// All stored rows whose `parent` column equals `sentence`.
    pub fn children_of(&self, sentence: &str) -> Result<Vec<NodeRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT sentence, parent, score, cumulative, mean_descendant, visits, status
             FROM nodes WHERE parent = ?1",
        )?;
        let rows = stmt
            .query_map(params![sentence], row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Counts of children by status, including a synthetic `Unexplored` bucket for potential
    /// children that have never been written (computed by the caller, which knows `playable`).
    pub fn children_demographics(&self, sentence: &str) -> Result<HashMap<i64, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM nodes WHERE parent = ?1 GROUP BY status")?;
        let rows = stmt
            .query_map(params![sentence], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows.into_iter().collect())
    }

    /// Top `k` children of `sentence`, ordered by `score` descending.
    pub fn top_children(&self, sentence: &str, k: usize) -> Result<Vec<NodeRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT sentence, parent, score, cumulative, mean_descendant, visits, status
             FROM nodes WHERE parent = ?1 ORDER BY score DESC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![sentence, k as i64], row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Top `k` strict descendants of `sentence`, ordered by `mean_descendant_score` descending.
    pub fn top_descendants(&self, sentence: &str, k: usize) -> Result<Vec<NodeRecord>> {
        // A descendant's canonical string starts with `sentence ` (or `sentence` is root, in
        // which case every non-root row is a descendant).
        let prefix = if sentence.is_empty() {
            String::new()
        } else {
            format!("{sentence} ")
        };
        let mut stmt = self.conn.prepare(
            "SELECT sentence, parent, score, cumulative, mean_descendant, visits, status
             FROM nodes
             WHERE sentence LIKE ?1 || '%' AND sentence != ?2
             ORDER BY mean_descendant DESC LIMIT ?3",
        )?;
        let rows = stmt
            .query_map(params![prefix, sentence, k as i64], row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Deletes every strict descendant of `sentence`; optionally overwrites `sentence`'s own
    /// status. Leaves `sentence` and its ancestors intact (P6).
    pub fn trim(&mut self, sentence: &str, new_status: Option<Status>) -> Result<u64> {
        let prefix = if sentence.is_empty() {
            String::new()
        } else {
            format!("{sentence} ")
        };
        let deleted = self.conn.execute(
            "DELETE FROM nodes WHERE sentence LIKE ?1 || '%' AND sentence != ?2",
            params![prefix, sentence],
        )?;
        if let Some(status) = new_status {
            self.conn.execute(
                "UPDATE nodes SET status = ?1 WHERE sentence = ?2",
                params![status.code(), sentence],
            )?;
        }
        info!("trimmed {deleted} descendant(s) of `{sentence}`");
        Ok(deleted as u64)
    }

    /// Every row whose canonical string contains `needle` as a whole token, used by `prune`.
    pub fn sentences_containing_word(&self, needle: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT sentence FROM nodes")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows
            .into_iter()
            .filter(|s| s.split(' ').any(|tok| tok == needle))
            .collect())
    }

    /// All rows with `status = Open` that may still be selected. Used by the search loop's
    /// selection step; the caller filters further for "has an unexplored child".
    pub fn open_nodes(&self) -> Result<Vec<NodeRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT sentence, parent, score, cumulative, mean_descendant, visits, status
             FROM nodes WHERE status = ?1",
        )?;
        let rows = stmt
            .query_map(params![Status::Open.code()], row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<NodeRecord> {
    let status_code: i64 = row.get(6)?;
    let status = Status::from_code(status_code)
        .map_err(|e| rusqlite::Error::InvalidColumnName(e.to_string()))?;
    Ok(NodeRecord {
        sentence: row.get(0)?,
        score: row.get(2)?,
        cumulative_score: row.get(3)?,
        mean_descendant_score: row.get(4)?,
        visits: row.get::<_, i64>(5)? as u64,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sentence: &str, status: Status) -> NodeRecord {
        NodeRecord::new(sentence.to_string(), -1.0, -1.0, status)
    }

    #[test]
    fn put_then_get_round_trips() {
        let mut store = Store::open_in_memory().unwrap();
        store.put("", &record("I", Status::Open)).unwrap();
        let fetched = store.get("I").unwrap().unwrap();
        assert_eq!(fetched.sentence, "I");
        assert_eq!(fetched.status, Status::Open);
    }

    #[test]
    fn children_of_is_indexed_by_parent() {
        let mut store = Store::open_in_memory().unwrap();
        store.put("", &record("I", Status::Open)).unwrap();
        store.put("I", &record("I am", Status::Open)).unwrap();
        store.put("I", &record("I see", Status::Open)).unwrap();
        let mut children: Vec<String> = store
            .children_of("I")
            .unwrap()
            .into_iter()
            .map(|r| r.sentence)
            .collect();
        children.sort();
        assert_eq!(children, vec!["I am".to_string(), "I see".to_string()]);
    }

    #[test]
    fn trim_removes_only_strict_descendants() {
        let mut store = Store::open_in_memory().unwrap();
        store.put("", &record("I", Status::Open)).unwrap();
        store.put("I", &record("I am", Status::Open)).unwrap();
        store
            .put("I am", &record("I am here", Status::Open))
            .unwrap();

        let deleted = store.trim("I", None).unwrap();
        assert_eq!(deleted, 2);
        assert!(store.get("I").unwrap().is_some());
        assert!(store.get("I am").unwrap().is_none());
        assert!(store.get("I am here").unwrap().is_none());
    }

    #[test]
    fn trim_can_override_status_without_deleting_self() {
        let mut store = Store::open_in_memory().unwrap();
        store.put("", &record("I", Status::Open)).unwrap();
        store.trim("I", Some(Status::Excluded)).unwrap();
        assert_eq!(store.get("I").unwrap().unwrap().status, Status::Excluded);
    }

    #[test]
    fn top_children_orders_by_score_descending() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .put("I", &record("I am", Status::Open))
            .unwrap();
        let mut worse = record("I see", Status::Open);
        worse.score = -5.0;
        store.put("I", &worse).unwrap();

        let top = store.top_children("I", 2).unwrap();
        assert_eq!(top[0].sentence, "I am");
    }

    #[test]
    fn transaction_rolls_back_on_error() {
        let mut store = Store::open_in_memory().unwrap();
        let result = store.with_transaction(|s| {
            s.put("", &record("I", Status::Open))?;
            Err(crate::errors::Error::InvariantViolation("boom".to_string()))
        });
        assert!(result.is_err());
        assert!(store.get("I").unwrap().is_none());
    }
}
