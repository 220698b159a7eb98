//! Reference oracle (C11): an offline-trained log-frequency model.
//!
//! This is the informational "language model" of §4.3 made concrete without requiring a GPU or a
//! network call: unigram log-probabilities for known words, with a bigram transition adjustment
//! between consecutive words, summed across the sentence (punctuation tokens contribute zero).
//! Unknown words fall back to a fixed out-of-vocabulary penalty.
//!
//! Aggregation is a straight sum, not length-normalised — an explicit, documented choice (open
//! question (a) in the design notes): the oracle contract only requires determinism, and sum is
//! the simplest rule to reason about and test.

use std::collections::HashMap;
use std::path::Path;

use log::debug;

use crate::errors::{Error, Result};
use crate::node::Sentence;
use crate::oracle::Oracle;

/// Fallback log-probability assigned to a word never seen during training.
const OUT_OF_VOCABULARY_PENALTY: f64 = -12.0;

/// A log-frequency scoring model trained offline from a unigram count file and a bigram
/// transition count file.
///
/// Mirrors the shape of a segmenter's scoring model: per-word counts normalised into
/// log-probabilities at load time, plus a sparse table of transition adjustments.
pub struct FrequencyOracle {
    unigram_log_prob: HashMap<String, f64>,
    bigram_log_prob: HashMap<(String, String), f64>,
}

impl FrequencyOracle {
    /// Loads unigram counts from `lemma_counts` (CSV: `word,count`) and bigram transition counts
    /// from `transitions` (CSV: `first,second,count`), normalizing both into log-probabilities.
    pub fn new(lemma_counts: &Path, transitions: &Path) -> Result<Self> {
        let unigram_log_prob = load_unigram_counts(lemma_counts)?;
        let bigram_log_prob = load_bigram_counts(transitions)?;
        Ok(Self {
            unigram_log_prob,
            bigram_log_prob,
        })
    }

    /// Builds a model directly from counts, skipping file I/O. Used by tests and by callers that
    /// already have the counts in memory.
    pub fn from_counts(
        unigram_counts: HashMap<String, u64>,
        bigram_counts: HashMap<(String, String), u64>,
    ) -> Self {
        Self {
            unigram_log_prob: normalize_counts(unigram_counts),
            bigram_log_prob: normalize_bigram_counts(bigram_counts),
        }
    }

    fn word_log_prob(&self, word: &str) -> f64 {
        let key = word.to_lowercase();
        self.unigram_log_prob
            .get(&key)
            .copied()
            .unwrap_or(OUT_OF_VOCABULARY_PENALTY)
    }

    fn transition_log_prob(&self, prev: &str, cur: &str) -> f64 {
        let key = (prev.to_lowercase(), cur.to_lowercase());
        self.bigram_log_prob.get(&key).copied().unwrap_or(0.0)
    }
}

impl Oracle for FrequencyOracle {
    fn score(&self, sentence: &Sentence) -> f64 {
        let words: Vec<&str> = sentence
            .tokens()
            .iter()
            .map(|t| t.as_str())
            .filter(|text| text.chars().next().map(|c| c.is_alphabetic()).unwrap_or(false))
            .collect();

        let mut total = 0.0;
        for (i, word) in words.iter().enumerate() {
            total += self.word_log_prob(word);
            if i > 0 {
                total += self.transition_log_prob(words[i - 1], word);
            }
        }
        debug!("scored `{}` -> {}", sentence, total);
        total
    }
}

fn load_unigram_counts(path: &Path) -> Result<HashMap<String, f64>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| Error::Config(format!("could not read lemma counts at {path:?}: {e}")))?;

    let mut counts = HashMap::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::Config(e.to_string()))?;
        let word = record
            .get(0)
            .ok_or_else(|| Error::Config("lemma counts row missing word column".to_string()))?
            .to_lowercase();
        let count: u64 = record
            .get(1)
            .ok_or_else(|| Error::Config("lemma counts row missing count column".to_string()))?
            .parse()
            .map_err(|e| Error::Config(format!("invalid count: {e}")))?;
        counts.insert(word, count);
    }
    Ok(normalize_counts(counts))
}

fn load_bigram_counts(path: &Path) -> Result<HashMap<(String, String), f64>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| Error::Config(format!("could not read transitions at {path:?}: {e}")))?;

    let mut counts = HashMap::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::Config(e.to_string()))?;
        let first = record
            .get(0)
            .ok_or_else(|| Error::Config("transitions row missing first word".to_string()))?
            .to_lowercase();
        let second = record
            .get(1)
            .ok_or_else(|| Error::Config("transitions row missing second word".to_string()))?
            .to_lowercase();
        let count: u64 = record
            .get(2)
            .ok_or_else(|| Error::Config("transitions row missing count column".to_string()))?
            .parse()
            .map_err(|e| Error::Config(format!("invalid count: {e}")))?;
        counts.insert((first, second), count);
    }
    Ok(normalize_bigram_counts(counts))
}

fn normalize_counts(counts: HashMap<String, u64>) -> HashMap<String, f64> {
    let total: u64 = counts.values().sum();
    if total == 0 {
        return HashMap::new();
    }
    counts
        .into_iter()
        .map(|(word, n)| (word, (n as f64 / total as f64).ln()))
        .collect()
}

fn normalize_bigram_counts(
    counts: HashMap<(String, String), u64>,
) -> HashMap<(String, String), f64> {
    // Transition counts are normalised per-predecessor so each adjustment is a genuine log
    // conditional probability, not a raw joint frequency.
    let mut totals: HashMap<String, u64> = HashMap::new();
    for ((first, _), n) in &counts {
        *totals.entry(first.clone()).or_insert(0) += n;
    }
    counts
        .into_iter()
        .map(|(key, n)| {
            let total = totals.get(&key.0).copied().unwrap_or(1).max(1);
            (key, (n as f64 / total as f64).ln())
        })
        .collect()
}
