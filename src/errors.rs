//! Error kinds shared by every component of the search core.
//!
//! The core never propagates a recoverable error across loop iterations (each iteration is
//! atomic with respect to persistence); everything in this enum is either a reason to stop the
//! whole process, or (for [`Error::ValidationFailure`]) a value that the search loop converts
//! into a node status rather than ever actually returning.

use thiserror::Error;

/// The result type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong in the search core.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed command or flags. Surfaced to the user; exit code 1.
    #[error("usage error: {0}")]
    Usage(String),

    /// Missing or unreadable vocabulary, oracle model, or store configuration. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O or corruption in the persistence layer.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// A prefix failed validation. Not an error in the usual sense: a normal outcome of a
    /// roll-out, recorded as `Status::HardInvalid` rather than propagated.
    #[error("validation failed: {0}")]
    ValidationFailure(String),

    /// The oracle failed to score a sentence. The current roll-out is aborted and retried with a
    /// fresh selection; three consecutive failures are fatal.
    #[error("oracle error: {0}")]
    Oracle(String),

    /// A precondition the rest of the core relies on was violated. Always indicates a bug, never
    /// a normal outcome of search.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl From<anacryptogram_vocab::BankError> for Error {
    fn from(e: anacryptogram_vocab::BankError) -> Self {
        Error::InvariantViolation(e.to_string())
    }
}
