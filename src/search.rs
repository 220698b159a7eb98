//! The search loop (C6): selection, expansion/roll-out, and backpropagation over the persistent
//! tree, in the style of a Monte-Carlo tree search driven by a single pure-function oracle.

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use anacryptogram_vocab::Vocabulary;

use crate::errors::Result;
use crate::node::{NodeRecord, Sentence, Status};
use crate::oracle::Oracle;
use crate::puzzle::PuzzleConfig;
use crate::store::Store;
use crate::validator::{Outcome, Validator};

/// Tunable parameters for one call to [`run`].
#[derive(Clone, Copy, Debug)]
pub struct SearchConfig {
    /// Softmax temperature used when sampling among open frontier nodes during selection. Higher
    /// values flatten the distribution toward uniform; lower values sharpen it toward the best
    /// `mean_descendant_score`. Defaults to `1.0` (open question (c)).
    pub temperature: f64,
    /// Maximum number of roll-outs to perform before returning, regardless of whether a terminal
    /// candidate was found.
    pub max_iterations: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            max_iterations: 1_000,
        }
    }
}

/// What one call to [`run`] accomplished.
#[derive(Clone, Debug, Default)]
pub struct SearchReport {
    /// Number of roll-outs actually performed (may be less than `max_iterations` if the frontier
    /// was exhausted or a terminal candidate caused early return).
    pub iterations: u64,
    /// Hard-valid terminal sentences discovered during this call.
    pub solutions: Vec<String>,
}

/// Runs up to `config.max_iterations` selection/expansion/backprop roll-outs rooted at the empty
/// sentence, persisting every result to `store`.
///
/// I1 (parent-first) and I2 (cumulative score is a root-to-node sum) are maintained by always
/// writing a node's own record before any of its children, and by deriving `cumulative_score`
/// from the parent's stored value rather than recomputing the whole path.
pub fn run(
    store: &mut Store,
    puzzle: &PuzzleConfig,
    vocabulary: &Vocabulary,
    oracle: &dyn Oracle,
    config: SearchConfig,
    seed: u64,
) -> Result<SearchReport> {
    let validator = Validator::new(puzzle, vocabulary);
    let mut rng = StdRng::seed_from_u64(seed);
    ensure_root(store, &validator, oracle)?;

    let mut report = SearchReport::default();
    for _ in 0..config.max_iterations {
        report.iterations += 1;
        let start = select(store, &validator, vocabulary, config.temperature, &mut rng)?;
        let Some(start) = start else {
            log::info!("frontier exhausted after {} iteration(s)", report.iterations);
            break;
        };

        let leaf = roll_out(store, &validator, vocabulary, oracle, &start, &mut rng)?;
        backpropagate(store, &leaf)?;

        if let Some(leaf_record) = store.get(&leaf)? {
            if matches!(
                validator.hard_validate(&Sentence::parse(&leaf))?,
                Outcome::ValidTerminal
            ) {
                log::info!("found solution: `{leaf}`");
                report.solutions.push(leaf_record.sentence);
            }
        }
    }
    Ok(report)
}

fn ensure_root(store: &mut Store, validator: &Validator<'_>, oracle: &dyn Oracle) -> Result<()> {
    if store.get("").is_ok_and(|r| r.is_some()) {
        return Ok(());
    }
    let root = Sentence::root();
    let outcome = validator.soft_validate(&root)?;
    let score = oracle.score(&root);
    let record = NodeRecord::new(String::new(), score, score, outcome.status());
    store.put("", &record)?;
    Ok(())
}

/// Selects an open frontier node to roll out from: a node with status `Open` that has at least
/// one playable child not yet written. Sampling among candidates is softmax-weighted by
/// `mean_descendant_score` at `temperature` (open question (c)); ties broken by RNG order.
fn select(
    store: &Store,
    validator: &Validator<'_>,
    vocabulary: &Vocabulary,
    temperature: f64,
    rng: &mut StdRng,
) -> Result<Option<String>> {
    let open = store.open_nodes()?;
    let mut frontier = Vec::new();
    for node in &open {
        let sentence = Sentence::parse(&node.sentence);
        let bank = sentence.bank(validator.puzzle_bank())?;
        let playable = vocabulary.playable(&bank);
        let explored = store.children_of(&node.sentence)?.len();
        if playable.len() > explored {
            frontier.push(node.clone());
        }
    }

    if frontier.is_empty() {
        return Ok(None);
    }

    let chosen = sample_weighted(&frontier, temperature, rng);
    Ok(Some(chosen.sentence.clone()))
}

/// Softmax sampling over `nodes` by `mean_descendant_score / temperature`. A `temperature` of
/// `1.0` reproduces plain softmax; values near zero sharpen toward the maximum.
pub fn sample_weighted(nodes: &[NodeRecord], temperature: f64, rng: &mut StdRng) -> NodeRecord {
    if nodes.len() == 1 {
        return nodes[0].clone();
    }
    let t = temperature.max(1e-6);
    let max_score = nodes
        .iter()
        .map(|n| n.mean_descendant_score)
        .fold(f64::NEG_INFINITY, f64::max);
    let weights: Vec<f64> = nodes
        .iter()
        .map(|n| ((n.mean_descendant_score - max_score) / t).exp())
        .collect();
    let total: f64 = weights.iter().sum();
    let mut draw = rng.gen::<f64>() * total;
    for (node, weight) in nodes.iter().zip(weights.iter()) {
        draw -= weight;
        if draw <= 0.0 {
            return node.clone();
        }
    }
    nodes.last().expect("nodes is non-empty").clone()
}

/// Expands `start` by one uniformly-chosen playable token that keeps the sentence soft-valid,
/// repeating until the bank is empty (a candidate) or no soft-valid extension remains (a dead
/// end). Every intermediate node visited is persisted as it is created.
fn roll_out(
    store: &mut Store,
    validator: &Validator<'_>,
    vocabulary: &Vocabulary,
    oracle: &dyn Oracle,
    start: &str,
    rng: &mut StdRng,
) -> Result<String> {
    let mut current = Sentence::parse(start);
    loop {
        let bank = current.bank(validator.puzzle_bank())?;
        if bank.is_empty() {
            return Ok(current.canonical());
        }

        let mut candidates = vocabulary.playable(&bank);
        if candidates.is_empty() {
            mark_dead_end(store, &current)?;
            return Ok(current.canonical());
        }
        // Deterministic order from `playable`, shuffled only by the seeded RNG so replays with the
        // same seed retry tokens in the same order.
        let index = rng.gen_range(0..candidates.len());
        let token = candidates.swap_remove(index);

        let next = current.appended(token);
        let outcome = validator.soft_validate(&next)?;
        let parent_record = store
            .get(&current.canonical())?
            .expect("parent was persisted before this call");

        let score = oracle.score(&next);
        let cumulative = parent_record.cumulative_score + score;
        let record = NodeRecord::new(next.canonical(), score, cumulative, outcome.status());
        store.put(&current.canonical(), &record)?;

        if matches!(outcome, Outcome::Invalid(_)) {
            return Ok(next.canonical());
        }
        current = next;
    }
}

fn mark_dead_end(store: &mut Store, sentence: &Sentence) -> Result<()> {
    if let Some(mut record) = store.get(&sentence.canonical())? {
        record.status = Status::HardInvalid;
        let parent = sentence.parent().canonical();
        store.put(&parent, &record)?;
    }
    Ok(())
}

/// Updates `mean_descendant_score` along the path from the root to `leaf` itself, treating this
/// roll-out's terminal score as one more sample in each node's running mean (visits += 1). The
/// leaf is included: it is never an ancestor of anything else, so this is its only chance to move
/// off its initial `cumulative_score`-seeded value.
fn backpropagate(store: &mut Store, leaf: &str) -> Result<()> {
    let leaf_record = match store.get(leaf)? {
        Some(r) => r,
        None => return Ok(()),
    };
    let terminal_score = leaf_record.score;

    let leaf_sentence = Sentence::parse(leaf);
    let ancestors = leaf_sentence.prefixes();

    store.with_transaction(|tx| {
        for ancestor in ancestors.iter().rev() {
            let key = ancestor.canonical();
            let Some(mut record) = tx.get(&key)? else {
                continue;
            };
            let n = record.visits as f64;
            record.mean_descendant_score =
                (record.mean_descendant_score * n + terminal_score) / (n + 1.0);
            record.visits += 1;
            let parent = ancestor.parent().canonical();
            tx.put(&parent, &record)?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::LengthPenaltyOracle;
    use anacryptogram_vocab::{LetterBank, Token};

    fn tiny_puzzle() -> PuzzleConfig {
        PuzzleConfig {
            name: "tiny".to_string(),
            bank: LetterBank::from_str("Iam"),
            required_first_token: Some("I".to_string()),
            required_punctuation: vec![],
            longest_word_len: None,
            second_longest_word_len: None,
            longest_words_adjacent: false,
            required_suffix: None,
            forbidden_tokens: vec![],
        }
    }

    fn tiny_vocab() -> Vocabulary {
        Vocabulary::from_tokens(["I", "am"].iter().map(|w| Token::new(*w).unwrap())).unwrap()
    }

    #[test]
    fn run_finds_the_only_possible_solution() {
        let mut store = Store::open_in_memory().unwrap();
        let puzzle = tiny_puzzle();
        let vocabulary = tiny_vocab();
        let oracle = LengthPenaltyOracle;
        let report = run(
            &mut store,
            &puzzle,
            &vocabulary,
            &oracle,
            SearchConfig {
                temperature: 1.0,
                max_iterations: 20,
            },
            42,
        )
        .unwrap();
        assert!(report.solutions.contains(&"I am".to_string()));
    }

    #[test]
    fn run_is_idempotent_on_already_fully_explored_tree() {
        let mut store = Store::open_in_memory().unwrap();
        let puzzle = tiny_puzzle();
        let vocabulary = tiny_vocab();
        let oracle = LengthPenaltyOracle;
        let config = SearchConfig {
            temperature: 1.0,
            max_iterations: 20,
        };
        run(&mut store, &puzzle, &vocabulary, &oracle, config, 1).unwrap();
        let before = store.children_of("").unwrap().len();
        run(&mut store, &puzzle, &vocabulary, &oracle, config, 1).unwrap();
        let after = store.children_of("").unwrap().len();
        assert_eq!(before, after);
    }
}
