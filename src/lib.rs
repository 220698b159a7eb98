#![deny(missing_docs)]
//! Persistent, guided tree search for anacryptogram-style letter-bank puzzles.
//!
//! A puzzle gives a multiset of characters (the "bank") known to rearrange, with spaces inserted
//! for free, into some natural-language sentence. This crate explores the tree of partial
//! sentences built from a fixed vocabulary, gated by a soft/hard validator and guided by a
//! pluggable scoring oracle, persisting the search tree so that a run can be resumed, inspected,
//! and pruned.

pub mod admin;
pub mod config;
pub mod errors;
pub mod node;
pub mod oracle;
pub mod puzzle;
pub mod scoring;
pub mod search;
pub mod store;
pub mod validator;

/// Re-exported for convenience; see [`errors::Error`] and [`errors::Result`].
pub use errors::{Error, Result};
/// Re-exported for convenience; see [`node`].
pub use node::{NodeRecord, Sentence, Status};
/// Re-exported for convenience; see [`oracle::Oracle`].
pub use oracle::Oracle;
/// Re-exported for convenience; see [`puzzle::PuzzleConfig`].
pub use puzzle::PuzzleConfig;
/// Re-exported for convenience; see [`store::Store`].
pub use store::Store;
/// Re-exported for convenience; see [`validator::Validator`].
pub use validator::Validator;
