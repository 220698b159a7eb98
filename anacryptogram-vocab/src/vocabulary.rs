use std::collections::BTreeSet;

use fst::{IntoStreamer, Set, Streamer};
use multimap::MultiMap;

use crate::bank::LetterBank;
use crate::token::Token;

/// Error building or querying a [`Vocabulary`].
#[derive(thiserror::Error, Debug)]
pub enum VocabularyError {
    /// The `fst` membership index could not be built (e.g. an I/O failure while streaming).
    #[error("failed to build vocabulary membership index: {0}")]
    IndexBuild(#[from] fst::Error),
}

/// The fixed set of tokens a puzzle may draw on, loaded once at process start.
///
/// `playable` is the hot path of the search loop's expansion step, so `Vocabulary` keeps two
/// indexes alongside the plain token list: an `fst::Set` for O(log n) exact-membership checks,
/// and a per-letter bucket index so `playable` only re-examines tokens that could plausibly fit
/// the current bank instead of scanning the whole vocabulary.
pub struct Vocabulary {
    /// Tokens in load order. `playable` and `all` preserve this order so that output is
    /// deterministic given identical input files.
    tokens: Vec<Token>,
    /// `needs[c]` holds the indices (into `tokens`) of every token that uses character `c` at
    /// least once.
    needs: MultiMap<char, usize>,
    /// Exact membership index over token text, built once at load time.
    membership: Set<Vec<u8>>,
}

impl Vocabulary {
    /// Builds a vocabulary from an iterator of token texts, in the order given.
    ///
    /// Duplicate tokens are kept only once (first occurrence wins), preserving the determinism
    /// the rest of the search core relies on.
    pub fn from_tokens<I>(raw: I) -> Result<Self, VocabularyError>
    where
        I: IntoIterator<Item = Token>,
    {
        let mut seen = BTreeSet::new();
        let mut tokens = Vec::new();
        for token in raw {
            if seen.insert(token.as_str().to_string()) {
                tokens.push(token);
            }
        }

        let mut needs: MultiMap<char, usize> = MultiMap::new();
        for (i, token) in tokens.iter().enumerate() {
            let mut chars_seen = BTreeSet::new();
            for c in token.as_str().chars() {
                if chars_seen.insert(c) {
                    needs.insert(c, i);
                }
            }
        }

        let mut sorted_text: Vec<String> = tokens.iter().map(|t| t.as_str().to_string()).collect();
        sorted_text.sort_unstable();
        sorted_text.dedup();
        let membership = Set::from_iter(sorted_text.iter().map(|s| s.as_bytes()))?;

        Ok(Self {
            tokens,
            needs,
            membership,
        })
    }

    /// All tokens, in load order.
    pub fn all(&self) -> &[Token] {
        &self.tokens
    }

    /// True iff `token` is a member of this vocabulary (exact text match).
    pub fn contains(&self, token: &Token) -> bool {
        self.membership.contains(token.as_str())
    }

    /// Every token whose multiset of characters is a sub-multiset of `bank`.
    ///
    /// Deterministic: returned in the vocabulary's load order, never an arbitrary hash order.
    pub fn playable(&self, bank: &LetterBank) -> Vec<Token> {
        let present: Vec<char> = bank.iter().filter(|(_, n)| *n > 0).map(|(c, _)| c).collect();

        let mut candidates: BTreeSet<usize> = BTreeSet::new();
        for c in &present {
            if let Some(indices) = self.needs.get_vec(c) {
                candidates.extend(indices.iter().copied());
            }
        }

        candidates
            .into_iter()
            .map(|i| &self.tokens[i])
            .filter(|token| bank.contains(token.as_str()))
            .cloned()
            .collect()
    }

    /// Number of distinct tokens in the vocabulary.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True iff the vocabulary has no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Streams the membership index back out as sorted strings; used by diagnostics and tests to
    /// confirm the `fst::Set` and the token list agree.
    pub fn membership_strings(&self) -> Vec<String> {
        let mut stream = self.membership.stream();
        let mut out = Vec::new();
        while let Some(key) = stream.next() {
            out.push(String::from_utf8_lossy(key).into_owned());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(words: &[&str]) -> Vocabulary {
        Vocabulary::from_tokens(words.iter().map(|w| Token::new(*w).unwrap())).unwrap()
    }

    #[test]
    fn playable_respects_bank_multiset() {
        let v = vocab(&["a", "b", "ab", "abc"]);
        let bank = LetterBank::from_str("ab");
        let mut playable: Vec<String> = v
            .playable(&bank)
            .into_iter()
            .map(|t| t.as_str().to_string())
            .collect();
        playable.sort();
        assert_eq!(playable, vec!["a", "ab", "b"]);
    }

    #[test]
    fn playable_is_deterministic_in_load_order() {
        let v = vocab(&["ma", "am", "I"]);
        let bank = LetterBank::from_str("I am a ma");
        let first: Vec<String> = v
            .playable(&bank)
            .into_iter()
            .map(|t| t.as_str().to_string())
            .collect();
        let second: Vec<String> = v
            .playable(&bank)
            .into_iter()
            .map(|t| t.as_str().to_string())
            .collect();
        assert_eq!(first, second);
        assert_eq!(first, vec!["ma", "am", "I"]);
    }

    #[test]
    fn contains_is_exact() {
        let v = vocab(&["cat", "cats"]);
        assert!(v.contains(&Token::new("cat").unwrap()));
        assert!(!v.contains(&Token::new("ca").unwrap()));
    }

    #[test]
    fn duplicate_tokens_are_deduplicated() {
        let v = vocab(&["a", "a", "b"]);
        assert_eq!(v.len(), 2);
    }
}
