//! Package Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A package reading error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for package operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The upload is not a readable zip archive.
    #[display("not a valid package archive: {_0}")]
    InvalidArchive(#[error(not(source))] String),
    /// The archive has no `.nuspec` at its root.
    #[display("package archive has no manifest")]
    MissingManifest,
    /// The manifest is not well-formed XML or is not a package manifest.
    #[display("malformed manifest: {_0}")]
    MalformedManifest(#[error(not(source))] String),
    /// A required manifest field is absent or empty.
    #[display("missing required field: {_0}")]
    MissingField(#[error(not(source))] &'static str),
    /// A field was found but is not acceptable.
    #[display("invalid value for '{field}': {value}")]
    InvalidField {
        /// The offending field.
        field: &'static str,
        /// What was found.
        value: String,
    },
    /// The manifest points at an archive entry that does not exist.
    #[display("archive entry not found: {_0}")]
    MissingEntry(#[error(not(source))] String),
    /// An entry decompresses to more than the archive may carry.
    #[display("archive entry {entry} exceeds {limit} bytes")]
    EntryTooLarge {
        entry: String,
        limit: u64,
    },
    /// Copying an entry out of the archive failed.
    #[display("failed to extract archive entry: {_0}")]
    Extraction(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // An archive is either valid or it isn't. Extraction failures come from
        // the writer the caller handed in, which might recover.
        matches!(self, Self::Extraction(_))
    }
}
