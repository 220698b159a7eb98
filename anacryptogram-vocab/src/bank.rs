use std::collections::HashMap;
use std::fmt;

/// Error returned when an operation on a [`LetterBank`] would violate one of its invariants.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BankError {
    /// `subtract` was called with a word the bank does not fully contain.
    #[error("bank does not contain enough letters for `{word}`")]
    InsufficientLetters {
        /// The word that could not be subtracted.
        word: String,
    },
}

/// A multiset of characters: the letters (and punctuation) still available for placement.
///
/// Case-sensitive; punctuation characters are counted exactly like letters. Internally a sparse
/// map keyed by code point, since puzzle banks are small (at most a few hundred characters) and
/// rarely span more than one script.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LetterBank {
    counts: HashMap<char, u32>,
}

impl LetterBank {
    /// Builds a bank from the literal multiset of characters in `text`.
    pub fn from_str(text: &str) -> Self {
        let mut counts = HashMap::new();
        for c in text.chars() {
            *counts.entry(c).or_insert(0) += 1;
        }
        Self { counts }
    }

    /// True iff `word`'s multiset of characters is a sub-multiset of this bank.
    pub fn contains(&self, word: &str) -> bool {
        let mut needed: HashMap<char, u32> = HashMap::new();
        for c in word.chars() {
            *needed.entry(c).or_insert(0) += 1;
        }
        needed
            .iter()
            .all(|(c, n)| self.counts.get(c).copied().unwrap_or(0) >= *n)
    }

    /// Removes `word`'s characters from the bank, returning the new bank.
    ///
    /// # Errors
    /// Returns [`BankError::InsufficientLetters`] if `contains(word)` is false. Callers in the
    /// search core treat this as an `InvariantViolation`: it indicates a bug upstream (a token
    /// was offered that the bank could not actually support), not a normal rejection.
    pub fn subtract(&self, word: &str) -> Result<Self, BankError> {
        if !self.contains(word) {
            return Err(BankError::InsufficientLetters {
                word: word.to_string(),
            });
        }
        let mut counts = self.counts.clone();
        for c in word.chars() {
            if let Some(n) = counts.get_mut(&c) {
                *n -= 1;
            }
        }
        counts.retain(|_, n| *n > 0);
        Ok(Self { counts })
    }

    /// Adds `word`'s characters back into the bank. Inverse of [`subtract`](Self::subtract),
    /// used by property tests and by `prune`-style undo operations.
    pub fn add(&self, word: &str) -> Self {
        let mut counts = self.counts.clone();
        for c in word.chars() {
            *counts.entry(c).or_insert(0) += 1;
        }
        Self { counts }
    }

    /// Total number of characters remaining.
    pub fn size(&self) -> usize {
        self.counts.values().map(|n| *n as usize).sum()
    }

    /// True iff no characters remain.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns the count of a single character.
    pub fn count_of(&self, c: char) -> u32 {
        self.counts.get(&c).copied().unwrap_or(0)
    }

    /// Returns a bank with every punctuation character zeroed out, leaving only letters.
    ///
    /// Used by the validator's vowel floor, which must ignore leftover punctuation when deciding
    /// whether a prefix can still be completed.
    pub fn letters_only(&self) -> Self {
        let counts = self
            .counts
            .iter()
            .filter(|(c, _)| c.is_alphabetic())
            .map(|(c, n)| (*c, *n))
            .collect();
        Self { counts }
    }

    /// Iterates over the distinct characters still present, with their remaining counts.
    pub fn iter(&self) -> impl Iterator<Item = (char, u32)> + '_ {
        self.counts.iter().map(|(c, n)| (*c, *n))
    }
}

impl fmt::Display for LetterBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chars: Vec<char> = self
            .counts
            .iter()
            .flat_map(|(c, n)| std::iter::repeat(*c).take(*n as usize))
            .collect();
        chars.sort_unstable();
        write!(f, "{}", chars.into_iter().collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_respects_multiplicity() {
        let bank = LetterBank::from_str("aab");
        assert!(bank.contains("aa"));
        assert!(bank.contains("ab"));
        assert!(!bank.contains("aaa"));
        assert!(!bank.contains("b b".replace(' ', "bb").as_str()));
    }

    #[test]
    fn subtract_then_add_round_trips() {
        let bank = LetterBank::from_str("hello world");
        let reduced = bank.subtract("hello").unwrap();
        assert_eq!(reduced.add("hello"), bank);
    }

    #[test]
    fn subtract_rejects_unsupported_word() {
        let bank = LetterBank::from_str("ab");
        let err = bank.subtract("abc").unwrap_err();
        assert_eq!(
            err,
            BankError::InsufficientLetters {
                word: "abc".to_string()
            }
        );
    }

    #[test]
    fn letters_only_drops_punctuation() {
        let bank = LetterBank::from_str("a, b!");
        let letters = bank.letters_only();
        assert_eq!(letters.count_of(','), 0);
        assert_eq!(letters.count_of('!'), 0);
        assert_eq!(letters.count_of('a'), 1);
    }

    #[test]
    fn size_and_is_empty() {
        let bank = LetterBank::from_str("xyz");
        assert_eq!(bank.size(), 3);
        assert!(!bank.is_empty());
        let empty = bank.subtract("xyz").unwrap();
        assert!(empty.is_empty());
    }
}
