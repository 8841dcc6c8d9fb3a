//! Registration documents of the package metadata resource.

use crate::error::{ErrorKind, Result};
use burrow_catalog::Repository;
use burrow_package::models::{NuGetVersion, PackageRegistration};
use burrow_protocol::RegistrationBuilder;
use burrow_protocol::models::{RegistrationIndex, RegistrationLeaf};
use exn::ResultExt;

#[derive(Clone)]
pub struct MetadataService {
    catalog: Repository,
    builder: RegistrationBuilder,
}
impl MetadataService {
    pub fn new(catalog: Repository, builder: RegistrationBuilder) -> Self {
        Self { catalog, builder }
    }

    /// The registration index of `id`, covering unlisted versions too.
    pub async fn registration_index(&self, id: &str) -> Result<Option<RegistrationIndex>> {
        let packages = self.catalog.find(id, true).await.or_raise(|| ErrorKind::Catalog)?;
        let Some(first) = packages.first() else {
            return Ok(None);
        };
        let registration = PackageRegistration::new(first.id.clone(), packages);
        Ok(self.builder.build_index(&registration))
    }

    pub async fn registration_leaf(&self, id: &str, version: &NuGetVersion) -> Result<Option<RegistrationLeaf>> {
        let package = self.catalog.find_one(id, version, true).await.or_raise(|| ErrorKind::Catalog)?;
        Ok(package.map(|package| self.builder.build_leaf(&package)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Indexer;
    use burrow_catalog::Database;
    use burrow_package::testing::NupkgBuilder;
    use burrow_protocol::UrlGenerator;
    use burrow_storage::PackageStorage;
    use burrow_storage::backend::MockBackend;
    use std::sync::Arc;

    async fn service(uploads: &[NupkgBuilder]) -> (Repository, MetadataService) {
        let storage = PackageStorage::new(Arc::new(MockBackend::default()));
        let db = Database::connect_in_memory().await.unwrap();
        let catalog = Repository::from(&db);
        let indexer = Indexer::new(storage, catalog.clone(), false);
        for upload in uploads {
            indexer.index(upload.build()).await.unwrap();
        }
        let builder = RegistrationBuilder::new(UrlGenerator::new("https://nuget.example.com/"));
        (catalog.clone(), MetadataService::new(catalog, builder))
    }

    #[tokio::test]
    async fn test_registration_index() {
        let uploads = [
            NupkgBuilder::new("Demo", "1.0.0"),
            NupkgBuilder::new("Demo", "2.0.0-beta"),
            NupkgBuilder::new("Demo", "1.5.0"),
        ];
        let (catalog, service) = service(&uploads).await;
        catalog.set_listed("Demo", &NuGetVersion::parse("1.5.0").unwrap(), false).await.unwrap();

        let index = service.registration_index("DEMO").await.unwrap().unwrap();
        assert_eq!(index.url, "https://nuget.example.com/v3/registration/demo/index.json");
        let page = &index.items[0];
        assert_eq!((page.count, page.lower.as_str(), page.upper.as_str()), (3, "1.0.0", "2.0.0-beta"));
        let versions = page.items.iter().map(|item| item.catalog_entry.version.as_str()).collect::<Vec<_>>();
        assert_eq!(versions, ["1.0.0", "1.5.0", "2.0.0-beta"]);
        assert!(!page.items[1].catalog_entry.listed);
    }

    #[tokio::test]
    async fn test_registration_leaf() {
        let (_, service) = service(&[NupkgBuilder::new("Demo", "1.0.0")]).await;
        let leaf = service.registration_leaf("demo", &NuGetVersion::parse("1.0").unwrap()).await.unwrap().unwrap();
        assert_eq!(leaf.url, "https://nuget.example.com/v3/registration/demo/1.0.0.json");
        assert_eq!(leaf.package_content, "https://nuget.example.com/v3/package/demo/1.0.0/demo.1.0.0.nupkg");
        assert!(leaf.listed);
    }

    #[tokio::test]
    async fn test_unknown_package() {
        let (_, service) = service(&[]).await;
        assert!(service.registration_index("Demo").await.unwrap().is_none());
        let version = NuGetVersion::parse("1.0.0").unwrap();
        assert!(service.registration_leaf("Demo", &version).await.unwrap().is_none());
    }
}
