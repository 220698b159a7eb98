//! The soft/hard validator (C4): rejects prefixes no completion of which could satisfy the
//! puzzle.

use anacryptogram_vocab::{LetterBank, Vocabulary};

use crate::errors::{Error, Result};
use crate::node::{Sentence, Status};
use crate::puzzle::PuzzleConfig;

const VOWELS: &[char] = &['a', 'e', 'i', 'o', 'u', 'A', 'E', 'I', 'O', 'U'];

/// The outcome of validating a sentence against a puzzle configuration.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// No constraint is violated yet, and the bank is not empty: still open to extension.
    ValidOpen,
    /// The bank is empty and every hard constraint holds: a winning candidate.
    ValidTerminal,
    /// Some constraint is violated; no extension of this sentence could win. Carries a
    /// human-readable reason for `check` to report.
    Invalid(String),
}

impl Outcome {
    /// Maps the outcome onto the persisted node status.
    pub fn status(&self) -> Status {
        match self {
            Outcome::ValidOpen | Outcome::ValidTerminal => Status::Open,
            Outcome::Invalid(_) => Status::HardInvalid,
        }
    }
}

/// The four per-constraint flags reported by `check --json`, in wire order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ConstraintFlags {
    /// `contains`: the sentence's multiset fits within the puzzle bank.
    pub c1_contains: bool,
    /// The remaining letters still contain a vowel, or none remain.
    pub c2_vowel_floor: bool,
    /// A sufficiently long word remains playable, or one already appears.
    pub c3_longest_word_feasible: bool,
    /// Required punctuation order and the first-token/suffix anchors all still agree.
    pub c4_anchors_and_punctuation: bool,
}

impl ConstraintFlags {
    fn all_pass(&self) -> bool {
        self.c1_contains && self.c2_vowel_floor && self.c3_longest_word_feasible && self.c4_anchors_and_punctuation
    }
}

/// Validates sentences against one puzzle configuration and vocabulary.
pub struct Validator<'a> {
    puzzle: &'a PuzzleConfig,
    vocabulary: &'a Vocabulary,
}

impl<'a> Validator<'a> {
    /// Builds a validator for `puzzle`, consulting `vocabulary` for longest-word feasibility.
    pub fn new(puzzle: &'a PuzzleConfig, vocabulary: &'a Vocabulary) -> Self {
        Self { puzzle, vocabulary }
    }

    /// The full puzzle bank this validator checks sentences against.
    pub fn puzzle_bank(&self) -> &LetterBank {
        &self.puzzle.bank
    }

    /// Computes the per-constraint flags for `sentence`, without deciding open/terminal/invalid.
    pub fn trace(&self, sentence: &Sentence) -> Result<ConstraintFlags> {
        let bank = sentence.bank(&self.puzzle.bank);
        let c1_contains = bank.is_ok();
        let bank = match bank {
            Ok(b) => b,
            Err(_) => return Ok(ConstraintFlags::default()),
        };

        let c2_vowel_floor = self.vowel_floor_holds(&bank);
        let c3_longest_word_feasible = self.longest_word_feasible(sentence, &bank);
        let c4_anchors_and_punctuation =
            self.punctuation_order_holds(sentence) && self.anchors_hold(sentence, &bank);

        Ok(ConstraintFlags {
            c1_contains,
            c2_vowel_floor,
            c3_longest_word_feasible,
            c4_anchors_and_punctuation,
        })
    }

    /// Soft validation: cheap checks that reject only sentences no extension of which could win.
    pub fn soft_validate(&self, sentence: &Sentence) -> Result<Outcome> {
        let flags = self.trace(sentence)?;
        if !flags.all_pass() {
            return Ok(Outcome::Invalid(self.describe_failure(&flags)));
        }
        let bank = sentence
            .bank(&self.puzzle.bank)
            .map_err(|_| Error::InvariantViolation("bank recompute failed after trace".into()))?;
        if bank.is_empty() {
            Ok(Outcome::ValidTerminal)
        } else {
            Ok(Outcome::ValidOpen)
        }
    }

    /// Hard validation: applied only to candidates with an empty bank. Runs every soft check plus
    /// the puzzle-specific predicates that only make sense once the bank is exhausted.
    pub fn hard_validate(&self, sentence: &Sentence) -> Result<Outcome> {
        let bank = sentence.bank(&self.puzzle.bank)?;
        if !bank.is_empty() {
            return Ok(Outcome::Invalid("bank not empty at terminal".to_string()));
        }

        let soft = self.soft_validate(sentence)?;
        if matches!(soft, Outcome::Invalid(_)) {
            return Ok(soft);
        }

        if !self.longest_words_ok(sentence) {
            return Ok(Outcome::Invalid(
                "longest/second-longest word lengths or adjacency do not match".to_string(),
            ));
        }
        if self.uses_forbidden_token(sentence) {
            return Ok(Outcome::Invalid("uses a forbidden token".to_string()));
        }

        Ok(Outcome::ValidTerminal)
    }

    fn vowel_floor_holds(&self, bank: &LetterBank) -> bool {
        if bank.letters_only().is_empty() {
            return true;
        }
        bank.iter().any(|(c, n)| n > 0 && VOWELS.contains(&c))
    }

    fn longest_word_feasible(&self, sentence: &Sentence, bank: &LetterBank) -> bool {
        let Some(required_len) = self.puzzle.longest_word_len else {
            return true;
        };
        let already_has = sentence
            .tokens()
            .iter()
            .any(|t| !t.is_punctuation() && t.len() >= required_len);
        if already_has {
            return true;
        }
        self.vocabulary
            .playable(bank)
            .iter()
            .any(|t| !t.is_punctuation() && t.len() >= required_len)
    }

    fn punctuation_order_holds(&self, sentence: &Sentence) -> bool {
        let placed: Vec<char> = sentence
            .tokens()
            .iter()
            .filter(|t| t.is_punctuation())
            .filter_map(|t| t.as_str().chars().next())
            .collect();
        placed
            .iter()
            .zip(self.puzzle.required_punctuation.iter())
            .all(|(a, b)| a == b)
            && placed.len() <= self.puzzle.required_punctuation.len()
    }

    fn anchors_hold(&self, sentence: &Sentence, bank: &LetterBank) -> bool {
        if let (Some(first), Some(required)) =
            (sentence.tokens().first(), &self.puzzle.required_first_token)
        {
            if first.as_str() != required {
                return false;
            }
        }

        if let Some(suffix) = &self.puzzle.required_suffix {
            if bank.is_empty() {
                // Tokens concatenate with no inter-word space when placed into the bank's letter
                // sequence; the space-joined canonical form would never match a suffix spanning a
                // word/punctuation boundary (e.g. "w!!" against tokens `["wow", "!", "!"]`).
                let concatenated: String = sentence.tokens().iter().map(|t| t.as_str()).collect();
                return concatenated.ends_with(suffix.as_str());
            }
        }
        true
    }

    fn longest_words_ok(&self, sentence: &Sentence) -> bool {
        let words: Vec<&str> = sentence
            .tokens()
            .iter()
            .filter(|t| !t.is_punctuation())
            .map(|t| t.as_str())
            .collect();

        let mut lengths: Vec<usize> = words.iter().map(|w| w.chars().count()).collect();
        lengths.sort_unstable_by(|a, b| b.cmp(a));

        if let Some(expected_longest) = self.puzzle.longest_word_len {
            if lengths.first().copied() != Some(expected_longest) {
                return false;
            }
        }
        if let Some(expected_second) = self.puzzle.second_longest_word_len {
            if lengths.get(1).copied() != Some(expected_second) {
                return false;
            }
        }
        if self.puzzle.longest_words_adjacent {
            let longest_idx = words
                .iter()
                .position(|w| Some(w.chars().count()) == self.puzzle.longest_word_len);
            let second_idx = words
                .iter()
                .position(|w| Some(w.chars().count()) == self.puzzle.second_longest_word_len);
            if let (Some(a), Some(b)) = (longest_idx, second_idx) {
                if a.abs_diff(b) != 1 {
                    return false;
                }
            } else {
                return false;
            }
        }
        true
    }

    fn uses_forbidden_token(&self, sentence: &Sentence) -> bool {
        sentence.tokens().iter().any(|t| {
            self.puzzle
                .forbidden_tokens
                .iter()
                .any(|f| f.eq_ignore_ascii_case(t.as_str()))
        })
    }

    fn describe_failure(&self, flags: &ConstraintFlags) -> String {
        if !flags.c1_contains {
            "sentence's letters exceed the puzzle bank".to_string()
        } else if !flags.c2_vowel_floor {
            "remaining letters contain no vowel".to_string()
        } else if !flags.c3_longest_word_feasible {
            "no remaining word can satisfy the longest-word requirement".to_string()
        } else {
            "required punctuation order or anchors violated".to_string()
        }
    }
}
