#![deny(missing_docs)]
//! Letter-bank arithmetic and vocabulary index shared by the search core and the CLI.
//!
//! This crate has no notion of a search tree, a score, or a store; it answers exactly two
//! questions: "what characters are left" and "which words can still be played".

mod bank;
mod token;
mod vocabulary;

/// Re-exported for convenience; see [`bank::LetterBank`] and [`bank::BankError`].
pub use bank::{BankError, LetterBank};
/// Re-exported for convenience; see [`token::Token`].
pub use token::Token;
/// Re-exported for convenience; see [`vocabulary::Vocabulary`] and [`vocabulary::VocabularyError`].
pub use vocabulary::{Vocabulary, VocabularyError};
