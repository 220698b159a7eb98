//! Query/admin API (C7): the read/mutate surface the CLI drives directly — `candidates`, `check`,
//! and `prune`.

use std::collections::HashMap;

use anacryptogram_vocab::Vocabulary;

use crate::errors::Result;
use crate::node::{NodeRecord, Sentence, Status};
use crate::puzzle::PuzzleConfig;
use crate::store::Store;
use crate::validator::{ConstraintFlags, Validator};

/// One row of a `check` trace: a prefix's constraint flags, score, and resulting status.
#[derive(Clone, Debug, serde::Serialize)]
pub struct CheckRow {
    /// The prefix's canonical string.
    pub sentence: String,
    /// Per-constraint flags (`c1`..`c4` in wire order).
    pub flags: ConstraintFlags,
    /// Oracle score, or `f64::NEG_INFINITY` for a prefix whose `c1_contains` already fails.
    pub score: f64,
    /// The status label this prefix would be stored under (`"0"`, `"1"`, `"7"`, or `"U"`).
    pub status: String,
}

/// Traces `sentence` against `puzzle`/`vocabulary`, optionally restricting output to the full
/// sentence only (`candidate_only`).
///
/// Does not consult the store: `check` is a pure function of the puzzle configuration, so it can
/// be run against a sentence that was never searched.
pub fn check(
    puzzle: &PuzzleConfig,
    vocabulary: &Vocabulary,
    oracle: &dyn crate::oracle::Oracle,
    sentence: &str,
    candidate_only: bool,
) -> Result<Vec<CheckRow>> {
    let validator = Validator::new(puzzle, vocabulary);
    let parsed = Sentence::parse(sentence);
    let prefixes = if candidate_only {
        vec![parsed.clone()]
    } else {
        parsed.prefixes().into_iter().skip(1).collect()
    };

    let mut rows = Vec::with_capacity(prefixes.len());
    for prefix in prefixes {
        let flags = validator.trace(&prefix)?;
        let outcome = validator.soft_validate(&prefix)?;
        let score = if flags.c1_contains {
            oracle.score(&prefix)
        } else {
            f64::NEG_INFINITY
        };
        rows.push(CheckRow {
            sentence: prefix.canonical(),
            flags,
            score,
            status: outcome.status().label(),
        });
    }
    Ok(rows)
}

/// A report over one node's children and descendants, as rendered by `candidates`.
#[derive(Clone, Debug, Default)]
pub struct CandidatesReport {
    /// Count of children by status label (including a synthetic `"U"` bucket for potential
    /// children never written).
    pub demographics: HashMap<String, u64>,
    /// Top children ordered by `score` descending.
    pub top_children: Vec<NodeRecord>,
    /// Top descendants ordered by `mean_descendant_score` descending.
    pub top_descendants: Vec<NodeRecord>,
}

/// Builds a [`CandidatesReport`] for `prefix`, optionally trimming its descendants and/or
/// overriding its own status first.
pub fn candidates(
    store: &mut Store,
    puzzle: &PuzzleConfig,
    vocabulary: &Vocabulary,
    prefix: &str,
    top_k: usize,
    trim: bool,
    status_override: Option<Status>,
) -> Result<CandidatesReport> {
    if trim {
        store.trim(prefix, status_override)?;
    } else if let Some(status) = status_override {
        if let Some(mut record) = store.get(prefix)? {
            record.status = status;
            let parent = Sentence::parse(prefix).parent().canonical();
            store.put(&parent, &record)?;
        }
    }

    let mut demographics: HashMap<String, u64> = store
        .children_demographics(prefix)?
        .into_iter()
        .map(|(code, n)| {
            (
                Status::from_code(code).map(Status::label).unwrap_or_else(|_| code.to_string()),
                n,
            )
        })
        .collect();

    // Potential children that have never been written show up as a synthetic "U" bucket, since
    // `Status::Unexplored` is never persisted (I-the-root included: an unsearched prefix has a
    // full complement of unexplored children).
    let playable_count = Sentence::parse(prefix)
        .bank(&puzzle.bank)
        .map(|bank| vocabulary.playable(&bank).len() as u64)
        .unwrap_or(0);
    let explored_count: u64 = demographics.values().sum();
    let unexplored = playable_count.saturating_sub(explored_count);
    if unexplored > 0 {
        demographics.insert(Status::Unexplored.label(), unexplored);
    }

    let top_children = store.top_children(prefix, top_k)?;
    let top_descendants = store.top_descendants(prefix, top_k)?;

    Ok(CandidatesReport {
        demographics,
        top_children,
        top_descendants,
    })
}

/// For each word in `words`, finds every stored sentence containing it as a whole token and trims
/// at the first occurrence: everything from that token onward is discarded, keeping the prefix up
/// to and including the word itself.
pub fn prune(store: &mut Store, words: &[String]) -> Result<u64> {
    let mut total = 0;
    for word in words {
        let matches = store.sentences_containing_word(word)?;
        for sentence in matches {
            let parsed = Sentence::parse(&sentence);
            let Some(index) = parsed.tokens().iter().position(|t| t.as_str() == word) else {
                continue;
            };
            let cut = Sentence::from_tokens(parsed.tokens()[..=index].to_vec());
            total += store.trim(&cut.canonical(), None)?;
        }
    }
    Ok(total)
}
