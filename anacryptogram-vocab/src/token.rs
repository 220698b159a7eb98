use std::fmt;

/// A single playable unit of a sentence: a dictionary word (optionally containing ASCII
/// apostrophes) or a single punctuation character from the puzzle's punctuation alphabet.
///
/// Apostrophes belong to the containing word; every other punctuation character is its own
/// token. `Token` never holds an empty string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(String);

impl Token {
    /// Wraps `text` as a token. Returns `None` for an empty string.
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.is_empty() {
            None
        } else {
            Some(Self(text))
        }
    }

    /// The token's text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True iff this token is a single punctuation character rather than a dictionary word.
    pub fn is_punctuation(&self) -> bool {
        let mut chars = self.0.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => !c.is_alphanumeric() && c != '\'',
            _ => false,
        }
    }

    /// Number of characters in the token.
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    /// True iff the token is empty. `Token` is never actually empty; kept for clippy parity with
    /// `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
