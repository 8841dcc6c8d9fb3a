use std::path::PathBuf;
use time::OffsetDateTime;

use crate::models::ContentType;

/// Blob metadata returned by storage backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Relative path from storage root
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modified timestamp
    pub modified: OffsetDateTime,
    pub content_type: ContentType,
}
impl FileInfo {
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: OffsetDateTime, content_type: ContentType) -> Self {
        Self {
            path: path.into(),
            size,
            modified,
            content_type,
        }
    }
}
