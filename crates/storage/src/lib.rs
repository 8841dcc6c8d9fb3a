pub mod backend;
pub mod error;
pub mod file;
mod models;
mod package;
mod path;

pub use crate::backend::StorageBackend;
pub use crate::file::FileInfo;
pub use crate::models::{ContentType, PutResult};
pub use crate::package::{PackageAsset, PackageBlobs, PackageStorage};
pub use crate::path::validate as validate_path;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
