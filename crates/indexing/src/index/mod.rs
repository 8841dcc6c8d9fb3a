//! Package ingestion.
//!
//! An upload moves through these states:
//!
//! ```text
//! Received -> Extracting -> ExtractionFailed                  => InvalidPackage
//!                        -> Extracted -> DuplicateCheck
//!                              duplicate, overwrites disabled => PackageAlreadyExists
//!                              duplicate, overwrites enabled  -> Purge -> Write
//!                              new                            -> Write
//!                        Write -> ContentPersisted -> MetadataPersisted => Success
//! ```
//!
//! Blobs are written before the catalog record, so a failure in between
//! leaves orphaned blobs but never a record without content. Replacing an
//! existing version is not atomic: the old record and blobs are removed
//! before the new ones are written.

mod extract;
mod stream;

pub(crate) use self::extract::blocking;
pub use self::stream::{IndexEvent, index_files};

use self::extract::{Extracted, Spool, extract};
use crate::error::{ErrorKind, Result};
use burrow_catalog::{AddResult, Repository};
use burrow_storage::backend::from_bytes;
use burrow_storage::error::ErrorKind as StorageErrorKind;
use burrow_storage::{PackageBlobs, PackageStorage};
use exn::ResultExt;
use std::ops::Deref;
use std::sync::Arc;
use tracing::{Span, error, field, info, instrument, warn};

/// The outcome of indexing one upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexResult {
    /// Content and metadata were persisted.
    Success,
    /// The upload is not a readable package.
    InvalidPackage,
    /// This id and version are already published.
    PackageAlreadyExists,
}

/// Validates uploads and persists their content and metadata.
#[derive(Clone)]
pub struct Indexer {
    storage: PackageStorage,
    catalog: Repository,
    allow_overwrites: bool,
}
impl Indexer {
    /// With `allow_overwrites`, uploading an existing version replaces it
    /// instead of being rejected.
    pub fn new(storage: PackageStorage, catalog: Repository, allow_overwrites: bool) -> Self {
        Self { storage, catalog, allow_overwrites }
    }

    /// Index one uploaded `.nupkg`.
    ///
    /// # Errors
    /// Rejections are reported as [`IndexResult`]s. Errors are reserved for
    /// operational failures, including [`ErrorKind::Conflict`] when stored
    /// blobs differ from the upload.
    #[instrument(skip_all, fields(id = field::Empty, version = field::Empty))]
    pub async fn index(&self, bytes: impl Into<Arc<[u8]>>) -> Result<IndexResult> {
        let bytes = bytes.into();
        let Extracted { package, manifest, readme, icon } = match extract(bytes.clone()).await {
            Ok(extracted) => extracted,
            Err(err) => {
                warn!(error = %err, size = bytes.len(), "rejected upload that is not a valid package");
                return Ok(IndexResult::InvalidPackage);
            },
        };
        let id = package.id.clone();
        let version = package.normalized_version();
        Span::current().record("id", id.as_str()).record("version", version.as_str());
        info!("validated package");

        if self.catalog.exists(&id, &package.version).await.or_raise(|| ErrorKind::Catalog)? {
            if !self.allow_overwrites {
                info!("package version already exists");
                return Ok(IndexResult::PackageAlreadyExists);
            }
            warn!("replacing existing package version");
            self.catalog.hard_delete(&id, &package.version).await.or_raise(|| ErrorKind::Catalog)?;
            self.storage.delete(&id, &version).await.or_raise(|| ErrorKind::Storage)?;
        }

        let blobs = PackageBlobs {
            package: from_bytes(bytes),
            manifest: manifest.into_reader()?,
            readme: readme.map(Spool::into_reader).transpose()?,
            icon: icon.map(Spool::into_reader).transpose()?,
        };
        match self.storage.save(&id, &version, blobs).await {
            Ok(()) => info!("persisted package content"),
            Err(err) if matches!(err.deref(), StorageErrorKind::Conflict(_)) => {
                error!("stored package content differs from the upload");
                return Err(err).or_raise(|| ErrorKind::Conflict { id, version });
            },
            Err(err) => return Err(err).or_raise(|| ErrorKind::Storage),
        }

        match self.catalog.add(&package).await.or_raise(|| ErrorKind::Catalog)? {
            AddResult::Success => {
                info!("persisted package metadata");
                Ok(IndexResult::Success)
            },
            AddResult::AlreadyExists => {
                warn!("another upload of this version committed first");
                Ok(IndexResult::PackageAlreadyExists)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burrow_catalog::Database;
    use burrow_package::models::NuGetVersion;
    use burrow_package::testing::NupkgBuilder;
    use burrow_storage::PackageAsset;
    use burrow_storage::backend::MockBackend;

    async fn indexer(allow_overwrites: bool) -> (Arc<MockBackend>, Repository, Indexer) {
        let backend = Arc::new(MockBackend::default());
        let db = Database::connect_in_memory().await.unwrap();
        let catalog = Repository::from(&db);
        let indexer = Indexer::new(PackageStorage::new(backend.clone()), catalog.clone(), allow_overwrites);
        (backend, catalog, indexer)
    }

    #[tokio::test]
    async fn test_index_new_package() {
        let (backend, catalog, indexer) = indexer(false).await;
        let upload = NupkgBuilder::new("Demo", "1.0.0").readme("# Demo").build();
        assert_eq!(indexer.index(upload).await.unwrap(), IndexResult::Success);
        assert_eq!(backend.len().await, 3);
        let version = NuGetVersion::parse("1.0.0").unwrap();
        let package = catalog.find_one("demo", &version, false).await.unwrap().unwrap();
        assert!(package.has_readme);
        assert!(!package.has_embedded_icon);
    }

    #[tokio::test]
    async fn test_index_invalid_package_touches_nothing() {
        let (backend, catalog, indexer) = indexer(false).await;
        let upload = NupkgBuilder::new("Demo", "1.0.0").without_manifest().build();
        assert_eq!(indexer.index(upload).await.unwrap(), IndexResult::InvalidPackage);
        assert!(backend.is_empty().await);
        assert!(!catalog.exists_id("Demo").await.unwrap());
    }

    #[tokio::test]
    async fn test_conflicting_orphan_blob_is_an_error() {
        let (backend, catalog, indexer) = indexer(false).await;
        // Blobs without a record, e.g. left behind by a crash before commit.
        let path = PackageAsset::Package.path("Demo", "1.0.0");
        let storage = PackageStorage::new(backend.clone());
        let orphan = PackageBlobs {
            package: from_bytes(b"something else"),
            manifest: from_bytes(b"<package/>"),
            readme: None,
            icon: None,
        };
        storage.save("Demo", "1.0.0", orphan).await.unwrap();

        let upload = NupkgBuilder::new("Demo", "1.0.0").build();
        let err = indexer.index(upload).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Conflict { id: "Demo".to_string(), version: "1.0.0".to_string() });
        assert_eq!(storage.backend().read(&path).await.unwrap(), b"something else");
        assert!(!catalog.exists_id("Demo").await.unwrap());
    }

    #[tokio::test]
    async fn test_identical_orphan_blobs_are_adopted() {
        let (backend, catalog, indexer) = indexer(false).await;
        let builder = NupkgBuilder::new("Demo", "1.0.0");
        let upload = builder.build();
        let nuspec = builder.nuspec();
        let storage = PackageStorage::new(backend.clone());
        let orphan = PackageBlobs {
            package: from_bytes(upload.clone()),
            manifest: from_bytes(nuspec),
            readme: None,
            icon: None,
        };
        storage.save("Demo", "1.0.0", orphan).await.unwrap();

        assert_eq!(indexer.index(upload).await.unwrap(), IndexResult::Success);
        assert!(catalog.exists_id("Demo").await.unwrap());
    }
}
