//! The search tree's logical node shape: canonical sentences, their persisted status, and the
//! bank arithmetic used to derive a node's remaining letters from its ancestors.

use std::fmt;

use anacryptogram_vocab::{LetterBank, Token};

use crate::errors::{Error, Result};

/// An ordered sequence of tokens. The canonical string form (tokens joined by single spaces) is
/// the primary key of the search tree; two sentences are equal iff their canonical strings match
/// byte-for-byte.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Sentence {
    tokens: Vec<Token>,
}

impl Sentence {
    /// The empty sentence: the root of the tree.
    pub fn root() -> Self {
        Self { tokens: Vec::new() }
    }

    /// Builds a sentence from a token sequence.
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// Parses a canonical string back into tokens, splitting on single spaces. Used by the CLI
    /// when a user passes a sentence on the command line.
    pub fn parse(canonical: &str) -> Self {
        if canonical.is_empty() {
            return Self::root();
        }
        let tokens = canonical
            .split(' ')
            .filter_map(Token::new)
            .collect();
        Self { tokens }
    }

    /// Returns a new sentence with `token` appended.
    pub fn appended(&self, token: Token) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.push(token);
        Self { tokens }
    }

    /// The sentence with its last token removed. An empty sentence is its own parent (I1 treats
    /// the root as self-terminating).
    pub fn parent(&self) -> Self {
        if self.tokens.is_empty() {
            self.clone()
        } else {
            Self {
                tokens: self.tokens[..self.tokens.len() - 1].to_vec(),
            }
        }
    }

    /// True iff this is the root (empty) sentence.
    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The tokens, in order.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Every strict prefix of this sentence, root first, ending with the full sentence.
    pub fn prefixes(&self) -> Vec<Sentence> {
        let mut out = Vec::with_capacity(self.tokens.len() + 1);
        for i in 0..=self.tokens.len() {
            out.push(Sentence {
                tokens: self.tokens[..i].to_vec(),
            });
        }
        out
    }

    /// The canonical string form: tokens joined by single spaces.
    pub fn canonical(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Derives the remaining bank for this sentence by subtracting every token's multiset from
    /// `puzzle_bank`, in order (I4: the bank is never stored, always recomputed).
    ///
    /// # Errors
    /// Returns [`Error::InvariantViolation`] if any token's characters exceed what remains in the
    /// bank at that point — this should never happen for a sentence that was built through the
    /// search loop's expansion step, since every token placed there was drawn from `playable`.
    pub fn bank(&self, puzzle_bank: &LetterBank) -> Result<LetterBank> {
        let mut bank = puzzle_bank.clone();
        for token in &self.tokens {
            bank = bank.subtract(token.as_str()).map_err(Error::from)?;
        }
        Ok(bank)
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

/// The status a stored node can carry.
///
/// `Unexplored` (`U`) is never actually written: a node that has never been scored exists only as
/// a missing row, and `U` appears solely in synthetic demographic summaries (C7).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// Open for selection, expansion, and roll-out.
    Open,
    /// No soft-valid extension exists; excluded from selection (I3).
    HardInvalid,
    /// Manually excluded by an operator (`candidates --status 7`); excluded from selection (I3).
    /// Status code 7 unifies "manual intervention" and "ignore from search" per the same rule.
    Excluded,
    /// Synthetic: a potential child that has never been written. Emitted only by
    /// `children_demographics`, never stored.
    Unexplored,
}

impl Status {
    /// The integer code this status maps to in the persisted schema and in CLI output.
    pub fn code(self) -> i64 {
        match self {
            Status::Open => 0,
            Status::HardInvalid => 1,
            Status::Excluded => 7,
            Status::Unexplored => -1, // never persisted; see `Self::label`.
        }
    }

    /// The code as it appears in human- and machine-readable reports (`U` for unexplored).
    pub fn label(self) -> String {
        match self {
            Status::Unexplored => "U".to_string(),
            other => other.code().to_string(),
        }
    }

    /// True iff a node with this status may be selected, expanded, or used as a roll-out start
    /// (I3).
    pub fn is_selectable(self) -> bool {
        matches!(self, Status::Open)
    }

    /// Parses a persisted integer code back into a status.
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            0 => Ok(Status::Open),
            1 => Ok(Status::HardInvalid),
            7 => Ok(Status::Excluded),
            other => Err(Error::InvariantViolation(format!(
                "unrecognized status code {other}"
            ))),
        }
    }
}

/// The persisted value associated with a canonical sentence.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeRecord {
    /// The canonical string form; the store's primary key.
    pub sentence: String,
    /// Oracle score for this node alone, or `f64::NEG_INFINITY` if invalid.
    pub score: f64,
    /// Sum of oracle scores along the root-to-node path (I2).
    pub cumulative_score: f64,
    /// Running mean over rolled-out descendants.
    pub mean_descendant_score: f64,
    /// Count of roll-outs that crossed this node.
    pub visits: u64,
    /// Current status.
    pub status: Status,
}

impl NodeRecord {
    /// A freshly created record for a node that has just been scored for the first time.
    pub fn new(sentence: String, score: f64, cumulative_score: f64, status: Status) -> Self {
        Self {
            sentence,
            score,
            cumulative_score,
            mean_descendant_score: cumulative_score,
            visits: 0,
            status,
        }
    }
}
