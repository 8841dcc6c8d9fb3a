//! Package archives, manifests and the records describing them.

mod archive;
mod consts;
pub mod error;
mod manifest;
pub mod models;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use crate::archive::PackageArchive;
pub use crate::consts::{
    DEFAULT_PACKAGE_TYPE, MAX_ID_LENGTH, MAX_TARGET_FRAMEWORK_LENGTH, MAX_VERSION_LENGTH, MAX_VERSION_RANGE_LENGTH,
};
pub use crate::manifest::{DeclaredDependency, DependencyGroup, Manifest};
