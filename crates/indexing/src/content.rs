//! Package content: archives, manifests, readmes, icons and the versions
//! document of the package base address resource.

use crate::error::{ErrorKind, Result};
use burrow_catalog::Repository;
use burrow_package::models::NuGetVersion;
use burrow_protocol::models::PackageVersions;
use burrow_protocol::package_versions;
use burrow_storage::backend::BoxSyncRead;
use burrow_storage::{PackageAsset, PackageStorage};
use exn::ResultExt;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct ContentService {
    storage: PackageStorage,
    catalog: Repository,
}
impl ContentService {
    pub fn new(storage: PackageStorage, catalog: Repository) -> Self {
        Self { storage, catalog }
    }

    /// Every version of `id`, unlisted ones included, or `None` if the id is
    /// unknown.
    pub async fn versions(&self, id: &str) -> Result<Option<PackageVersions>> {
        let packages = self.catalog.find(id, true).await.or_raise(|| ErrorKind::Catalog)?;
        if packages.is_empty() {
            return Ok(None);
        }
        Ok(Some(package_versions(packages.iter().map(|p| &p.version))))
    }

    /// Open the `.nupkg` of a version and count the download. Only a
    /// download that can be served is counted.
    #[instrument(skip(self, version), fields(version = %version))]
    pub async fn download(&self, id: &str, version: &NuGetVersion) -> Result<Option<BoxSyncRead>> {
        if !self.catalog.exists(id, version).await.or_raise(|| ErrorKind::Catalog)? {
            return Ok(None);
        }
        let reader = self.open(id, version, PackageAsset::Package).await?;
        self.catalog.increment_download(id, version).await.or_raise(|| ErrorKind::Catalog)?;
        debug!("counted download");
        Ok(Some(reader))
    }

    pub async fn manifest(&self, id: &str, version: &NuGetVersion) -> Result<Option<BoxSyncRead>> {
        if !self.catalog.exists(id, version).await.or_raise(|| ErrorKind::Catalog)? {
            return Ok(None);
        }
        self.open(id, version, PackageAsset::Manifest).await.map(Some)
    }

    /// The embedded readme, or `None` if the version has none.
    pub async fn readme(&self, id: &str, version: &NuGetVersion) -> Result<Option<BoxSyncRead>> {
        let package = self.catalog.find_one(id, version, true).await.or_raise(|| ErrorKind::Catalog)?;
        match package {
            Some(package) if package.has_readme => self.open(id, version, PackageAsset::Readme).await.map(Some),
            _ => Ok(None),
        }
    }

    /// The embedded icon, or `None` if the version has none.
    pub async fn icon(&self, id: &str, version: &NuGetVersion) -> Result<Option<BoxSyncRead>> {
        let package = self.catalog.find_one(id, version, true).await.or_raise(|| ErrorKind::Catalog)?;
        match package {
            Some(package) if package.has_embedded_icon => self.open(id, version, PackageAsset::Icon).await.map(Some),
            _ => Ok(None),
        }
    }

    async fn open(&self, id: &str, version: &NuGetVersion, asset: PackageAsset) -> Result<BoxSyncRead> {
        self.storage
            .reader(id, &version.to_normalized_string(), asset)
            .await
            .or_raise(|| ErrorKind::Storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Indexer;
    use burrow_catalog::Database;
    use burrow_package::testing::NupkgBuilder;
    use burrow_storage::backend::MockBackend;
    use std::io::Read;
    use std::sync::Arc;

    async fn service(uploads: &[NupkgBuilder]) -> (Repository, ContentService) {
        let storage = PackageStorage::new(Arc::new(MockBackend::default()));
        let db = Database::connect_in_memory().await.unwrap();
        let catalog = Repository::from(&db);
        let indexer = Indexer::new(storage.clone(), catalog.clone(), false);
        for upload in uploads {
            indexer.index(upload.build()).await.unwrap();
        }
        (catalog.clone(), ContentService::new(storage, catalog))
    }

    fn read_all(mut reader: BoxSyncRead) -> Vec<u8> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data).unwrap();
        data
    }

    fn v(version: &str) -> NuGetVersion {
        NuGetVersion::parse(version).unwrap()
    }

    #[tokio::test]
    async fn test_download_counts() {
        let upload = NupkgBuilder::new("Demo", "1.0.0");
        let (catalog, service) = service(std::slice::from_ref(&upload)).await;
        let reader = service.download("DEMO", &v("1.0")).await.unwrap().unwrap();
        assert_eq!(read_all(reader), upload.build());
        service.download("demo", &v("1.0.0")).await.unwrap().unwrap();
        let package = catalog.find_one("demo", &v("1.0.0"), true).await.unwrap().unwrap();
        assert_eq!(package.downloads, 2);
    }

    #[tokio::test]
    async fn test_unreadable_package_is_not_counted() {
        let storage = PackageStorage::new(Arc::new(MockBackend::default()));
        let db = Database::connect_in_memory().await.unwrap();
        let catalog = Repository::from(&db);
        let indexer = Indexer::new(storage.clone(), catalog.clone(), false);
        indexer.index(NupkgBuilder::new("Demo", "1.0.0").build()).await.unwrap();
        storage.delete("Demo", "1.0.0").await.unwrap();

        let service = ContentService::new(storage, catalog.clone());
        let err = service.download("Demo", &v("1.0.0")).await.err().unwrap();
        assert_eq!(*err, ErrorKind::Storage);
        let package = catalog.find_one("Demo", &v("1.0.0"), true).await.unwrap().unwrap();
        assert_eq!(package.downloads, 0);
    }

    #[tokio::test]
    async fn test_missing_version() {
        let (_, service) = service(&[NupkgBuilder::new("Demo", "1.0.0")]).await;
        assert!(service.download("Demo", &v("2.0.0")).await.unwrap().is_none());
        assert!(service.manifest("Other", &v("1.0.0")).await.unwrap().is_none());
        assert!(service.versions("Other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_manifest() {
        let (_, service) = service(&[NupkgBuilder::new("Demo", "1.0.0")]).await;
        let manifest = read_all(service.manifest("Demo", &v("1.0.0")).await.unwrap().unwrap());
        assert!(String::from_utf8(manifest).unwrap().contains("<id>Demo</id>"));
    }

    #[tokio::test]
    async fn test_readme_and_icon_follow_flags() {
        let uploads = [
            NupkgBuilder::new("Demo", "1.0.0"),
            NupkgBuilder::new("Demo", "2.0.0").readme("# Demo").icon(vec![1, 2, 3]),
        ];
        let (_, service) = service(&uploads).await;
        assert!(service.readme("Demo", &v("1.0.0")).await.unwrap().is_none());
        assert!(service.icon("Demo", &v("1.0.0")).await.unwrap().is_none());
        assert_eq!(read_all(service.readme("Demo", &v("2.0.0")).await.unwrap().unwrap()), b"# Demo");
        assert_eq!(read_all(service.icon("Demo", &v("2.0.0")).await.unwrap().unwrap()), [1, 2, 3]);
    }

    #[tokio::test]
    async fn test_versions_include_unlisted() {
        let uploads = [NupkgBuilder::new("Demo", "2.0.0-Beta"), NupkgBuilder::new("Demo", "1.0.0")];
        let (catalog, service) = service(&uploads).await;
        catalog.set_listed("Demo", &v("1.0.0"), false).await.unwrap();
        let versions = service.versions("demo").await.unwrap().unwrap();
        assert_eq!(versions.versions, ["1.0.0", "2.0.0-beta"]);
    }
}
