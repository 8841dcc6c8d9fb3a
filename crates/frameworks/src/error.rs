//! Framework Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A framework parsing error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for framework operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The moniker does not name a framework family this crate understands.
    /// Callers should keep the raw moniker rather than fail.
    #[display("unknown framework: {_0}")]
    UnknownFramework(#[error(not(source))] String),
    /// The family was recognised but the version part could not be parsed.
    #[display("invalid framework version: {_0}")]
    InvalidVersion(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // A moniker either parses or it doesn't.
        false
    }
}
