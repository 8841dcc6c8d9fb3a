//! Unlisting, relisting and deleting package versions.

use crate::error::{ErrorKind, Result};
use burrow_catalog::Repository;
use burrow_package::models::NuGetVersion;
use burrow_storage::PackageStorage;
use exn::ResultExt;
use tracing::{info, instrument};

/// What a delete request does to a package version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletionBehavior {
    /// Hide the version from search and listings; it stays downloadable.
    #[default]
    Unlist,
    /// Remove the record and every blob of the version.
    HardDelete,
}

#[derive(Clone)]
pub struct DeletionService {
    storage: PackageStorage,
    catalog: Repository,
    behavior: DeletionBehavior,
}
impl DeletionService {
    pub fn new(storage: PackageStorage, catalog: Repository, behavior: DeletionBehavior) -> Self {
        Self { storage, catalog, behavior }
    }

    /// Delete a version according to the configured [`DeletionBehavior`].
    /// Returns `false` if the version does not exist.
    pub async fn delete(&self, id: &str, version: &NuGetVersion) -> Result<bool> {
        match self.behavior {
            DeletionBehavior::Unlist => self.unlist(id, version).await,
            DeletionBehavior::HardDelete => self.hard_delete(id, version).await,
        }
    }

    #[instrument(skip(self, version), fields(version = %version))]
    pub async fn unlist(&self, id: &str, version: &NuGetVersion) -> Result<bool> {
        let found = self.catalog.set_listed(id, version, false).await.or_raise(|| ErrorKind::Catalog)?;
        if found {
            info!("unlisted package version");
        }
        Ok(found)
    }

    #[instrument(skip(self, version), fields(version = %version))]
    pub async fn relist(&self, id: &str, version: &NuGetVersion) -> Result<bool> {
        let found = self.catalog.set_listed(id, version, true).await.or_raise(|| ErrorKind::Catalog)?;
        if found {
            info!("relisted package version");
        }
        Ok(found)
    }

    /// Remove the record, then the blobs. Blobs are removed even when no
    /// record exists, which also cleans up orphans of that version.
    #[instrument(skip(self, version), fields(version = %version))]
    pub async fn hard_delete(&self, id: &str, version: &NuGetVersion) -> Result<bool> {
        let found = self.catalog.hard_delete(id, version).await.or_raise(|| ErrorKind::Catalog)?;
        self.storage
            .delete(id, &version.to_normalized_string())
            .await
            .or_raise(|| ErrorKind::Storage)?;
        if found {
            info!("deleted package version");
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Indexer;
    use burrow_catalog::Database;
    use burrow_package::testing::NupkgBuilder;
    use burrow_storage::backend::MockBackend;
    use rstest::rstest;
    use std::sync::Arc;

    async fn service(behavior: DeletionBehavior) -> (Arc<MockBackend>, Repository, DeletionService) {
        let backend = Arc::new(MockBackend::default());
        let storage = PackageStorage::new(backend.clone());
        let db = Database::connect_in_memory().await.unwrap();
        let catalog = Repository::from(&db);
        let indexer = Indexer::new(storage.clone(), catalog.clone(), false);
        indexer.index(NupkgBuilder::new("Demo", "1.0.0").build()).await.unwrap();
        (backend, catalog.clone(), DeletionService::new(storage, catalog, behavior))
    }

    fn v(version: &str) -> NuGetVersion {
        NuGetVersion::parse(version).unwrap()
    }

    #[tokio::test]
    async fn test_unlist_then_relist() {
        let (_, catalog, service) = service(DeletionBehavior::Unlist).await;
        assert!(service.unlist("demo", &v("1.0")).await.unwrap());
        assert!(catalog.find("Demo", false).await.unwrap().is_empty());
        assert!(service.relist("demo", &v("1.0")).await.unwrap());
        assert_eq!(catalog.find("Demo", false).await.unwrap().len(), 1);
    }

    #[rstest]
    #[case(DeletionBehavior::Unlist, true, 2)]
    #[case(DeletionBehavior::HardDelete, false, 0)]
    #[tokio::test]
    async fn test_delete_follows_behavior(
        #[case] behavior: DeletionBehavior,
        #[case] record_kept: bool,
        #[case] blobs_kept: usize,
    ) {
        let (backend, catalog, service) = service(behavior).await;
        assert!(service.delete("Demo", &v("1.0.0")).await.unwrap());
        assert_eq!(catalog.exists("Demo", &v("1.0.0")).await.unwrap(), record_kept);
        assert_eq!(backend.len().await, blobs_kept);
    }

    #[tokio::test]
    async fn test_missing_version() {
        let (backend, _, service) = service(DeletionBehavior::HardDelete).await;
        assert!(!service.unlist("Demo", &v("2.0.0")).await.unwrap());
        assert!(!service.delete("Demo", &v("2.0.0")).await.unwrap());
        assert_eq!(backend.len().await, 2);
    }
}
