//! Declarative puzzle profiles.
//!
//! A profile is the full set of constraints the validator (C4) checks beyond plain letter-bank
//! arithmetic: required anchors, punctuation order, and the longest/second-longest word rules
//! that make the Qwantzle family of anacryptograms distinctive.

use anacryptogram_vocab::LetterBank;

/// Declarative configuration for one letter-bank puzzle instance.
#[derive(Clone, Debug)]
pub struct PuzzleConfig {
    /// Human-readable name, e.g. `"c1663"`.
    pub name: String,
    /// The full letter bank for this puzzle.
    pub bank: LetterBank,
    /// If set, the sentence's first token must equal this exactly.
    pub required_first_token: Option<String>,
    /// Punctuation characters that must appear, in this order, as a prefix of the sentence's
    /// punctuation tokens.
    pub required_punctuation: Vec<char>,
    /// If set, the length (in characters) of the single longest word the solution must contain.
    pub longest_word_len: Option<usize>,
    /// If set, the length of the second-longest word.
    pub second_longest_word_len: Option<usize>,
    /// If true, the longest and second-longest words must be adjacent in the solution.
    pub longest_words_adjacent: bool,
    /// If set, the sentence's canonical string must end with this literal suffix.
    pub required_suffix: Option<String>,
    /// Tokens that may never appear in a solution (e.g. words that describe the puzzle itself).
    pub forbidden_tokens: Vec<String>,
}

impl PuzzleConfig {
    /// The canonical Qwantzle-family instance referenced throughout the reference material.
    ///
    /// The bank below is illustrative: a 101-character (space excluded — spaces are inserted for
    /// free between words, never drawn from the bank) literal satisfying every declared
    /// constraint (one colon, two commas, two exclamation marks, an eleven-letter longest word
    /// immediately followed by an eight-letter second-longest word, ending in `"w!!"`), not a
    /// claim about the real Qwantzle's undisclosed solution.
    pub fn c1663() -> Self {
        let sentence_text = "I probably temporarily forgot how really quietly eating yummy chip \
            cookies, but it was truly rather good: lovely, wow!!";
        let bank_text: String = sentence_text.chars().filter(|c| !c.is_whitespace()).collect();
        Self {
            name: "c1663".to_string(),
            bank: LetterBank::from_str(&bank_text),
            required_first_token: Some("I".to_string()),
            required_punctuation: vec![':', ',', '!', '!'],
            longest_word_len: Some(11),
            second_longest_word_len: Some(8),
            longest_words_adjacent: true,
            required_suffix: Some("w!!".to_string()),
            forbidden_tokens: vec![
                "qwantzle".to_string(),
                "anacryptogram".to_string(),
                "puzzle".to_string(),
            ],
        }
    }

    /// Looks up a built-in profile by name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "c1663" => Some(Self::c1663()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c1663_bank_has_101_characters() {
        assert_eq!(PuzzleConfig::c1663().bank.size(), 101);
    }

    #[test]
    fn by_name_is_case_sensitive_and_total() {
        assert!(PuzzleConfig::by_name("c1663").is_some());
        assert!(PuzzleConfig::by_name("unknown-profile").is_none());
    }
}
