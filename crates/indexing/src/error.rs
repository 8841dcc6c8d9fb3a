//! Indexing Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An indexing or registry service error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for indexing and registry service operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a failure.
///
/// Rejected uploads are not errors: they are reported as
/// [`IndexResult`](crate::IndexResult) outcomes.
///
/// ### Operational Errors
/// - [`ErrorKind::Conflict`]
/// - [`ErrorKind::Extraction`]
/// - [`ErrorKind::Task`]
/// - [`ErrorKind::Upload`]
///
/// ### Dependency Errors
/// - [`ErrorKind::Catalog`]
/// - [`ErrorKind::Storage`]
#[derive(Debug, Display, Error, PartialEq)]
pub enum ErrorKind {
    /// Blobs already stored for this version differ from the upload. Stored
    /// content is immutable; an operator has to resolve this.
    #[display("stored content for {id} {version} differs from the upload")]
    Conflict { id: String, version: String },
    /// The archive could not be read or an entry could not be buffered.
    #[display("package extraction failed")]
    Extraction,
    /// A blocking task panicked or was cancelled.
    #[display("background task failed")]
    Task,
    /// An upload could not be read from disk.
    #[display("could not read upload: {}", _0.display())]
    Upload(#[error(not(source))] PathBuf),
    /// A query or update via [`burrow_catalog::Repository`] failed.
    #[display("catalog operation failed")]
    Catalog,
    /// A blob store operation (read, write, delete, list) failed.
    #[display("storage operation failed")]
    Storage,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Task)
    }
}
