//! Path confinement for storage backends.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Normalise a storage path and make sure it stays under the storage root.
///
/// `.` components and repeated or trailing separators are dropped, `..` is
/// resolved against the components seen so far. A path that climbs above the
/// root, carries a Windows prefix or a null byte, or normalises to nothing is
/// rejected with [`InvalidPath`](crate::error::ErrorKind::InvalidPath).
///
/// Backslashes, non-UTF8 bytes and other platform oddities are left alone.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use burrow_storage::validate_path;
/// assert!(validate_path("packages/newtonsoft.json/13.0.3/newtonsoft.json.nuspec").is_ok());
/// assert!(validate_path("packages/../icon").is_ok());
/// assert!(validate_path("../etc/passwd").is_err());
/// assert!(validate_path("packages/../../secret").is_err());
/// assert!(validate_path("a\0b").is_err());
/// assert_eq!(
///     validate_path("packages//demo/./1.0.0/../2.0.0/readme/").unwrap(),
///     Path::new("packages/demo/2.0.0/readme")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let invalid = || ErrorKind::InvalidPath(original.to_path_buf());
    let mut components = Vec::new();
    for component in original.components() {
        match component {
            Component::Normal(segment) => {
                // Components() lets null bytes through on Unix; syscalls would truncate at them.
                if segment.as_encoded_bytes().contains(&0) {
                    exn::bail!(invalid());
                }
                components.push(segment)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
        }
    }
    if components.is_empty() {
        exn::bail!(invalid());
    }
    Ok(components.into_iter().collect())
}
