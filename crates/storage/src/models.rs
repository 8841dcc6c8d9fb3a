//! Storage models.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;

/// Content type recorded alongside a blob.
///
/// The strings are what NuGet clients have historically been served by this
/// kind of registry, including the non-standard `image/xyz` for icons whose
/// real format is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// Raw `.nupkg` archive.
    OctetStream,
    /// The `.nuspec` manifest.
    PlainText,
    /// Embedded readme.
    Markdown,
    /// Embedded icon.
    Image,
}
impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OctetStream => "binary/octet-stream",
            Self::PlainText => "text/plain",
            Self::Markdown => "text/markdown",
            Self::Image => "image/xyz",
        }
    }

    /// Guess the content type from a stored file name. Backends that cannot
    /// keep per-blob metadata (plain filesystems) rely on this.
    ///
    /// ```
    /// use std::path::Path;
    /// use burrow_storage::ContentType;
    /// assert_eq!(ContentType::from_path(Path::new("a/b/a.1.0.0.nupkg")), ContentType::OctetStream);
    /// assert_eq!(ContentType::from_path(Path::new("a/b/readme")), ContentType::Markdown);
    /// ```
    pub fn from_path(path: &Path) -> Self {
        match path.file_name().and_then(|name| name.to_str()) {
            Some("readme") => Self::Markdown,
            Some("icon") => Self::Image,
            Some(name) if name.ends_with(".nuspec") => Self::PlainText,
            _ => Self::OctetStream,
        }
    }
}
impl Display for ContentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Outcome of an exclusive-create write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutResult {
    /// Nothing was at the path; the blob is now stored.
    Success,
    /// Byte-identical content was already stored. Nothing was written.
    AlreadyExists,
    /// Different content is stored at the path. Nothing was written.
    Conflict,
}
