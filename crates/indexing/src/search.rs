//! Search, autocomplete and dependents queries.

use crate::error::{ErrorKind, Result};
use burrow_catalog::{Repository, SearchQuery};
use burrow_protocol::SearchResponseBuilder;
use burrow_protocol::models::{AutocompleteResponse, DependentsResponse, SearchResponse};
use exn::ResultExt;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct SearchService {
    catalog: Repository,
    builder: SearchResponseBuilder,
}
impl SearchService {
    pub fn new(catalog: Repository, builder: SearchResponseBuilder) -> Self {
        Self { catalog, builder }
    }

    #[instrument(skip(self))]
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResponse> {
        let registrations = self.catalog.search(query).await.or_raise(|| ErrorKind::Catalog)?;
        debug!(hits = registrations.len(), "searched packages");
        Ok(self.builder.build_search(&registrations))
    }

    /// Package ids matching the query, most downloaded first.
    #[instrument(skip(self))]
    pub async fn autocomplete(&self, query: &SearchQuery) -> Result<AutocompleteResponse> {
        let ids = self.catalog.autocomplete(query).await.or_raise(|| ErrorKind::Catalog)?;
        Ok(self.builder.build_autocomplete(ids))
    }

    /// Listed versions of one package, ascending, in the autocomplete shape.
    pub async fn versions(
        &self,
        id: &str,
        include_prerelease: bool,
        include_semver2: bool,
    ) -> Result<AutocompleteResponse> {
        let versions = self
            .catalog
            .list_versions(id, include_prerelease, include_semver2)
            .await
            .or_raise(|| ErrorKind::Catalog)?;
        Ok(self.builder.build_autocomplete(versions.iter().map(|v| v.to_normalized_string()).collect()))
    }

    pub async fn dependents(&self, id: &str) -> Result<DependentsResponse> {
        let packages = self.catalog.dependents(id).await.or_raise(|| ErrorKind::Catalog)?;
        Ok(self.builder.build_dependents(&packages))
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

    async fn service(uploads: &[NupkgBuilder]) -> SearchService {
        let storage = PackageStorage::new(Arc::new(MockBackend::default()));
        let db = Database::connect_in_memory().await.unwrap();
        let catalog = Repository::from(&db);
        let indexer = Indexer::new(storage, catalog.clone(), false);
        for upload in uploads {
            indexer.index(upload.build()).await.unwrap();
        }
        SearchService::new(catalog, SearchResponseBuilder::new(UrlGenerator::new("https://nuget.example.com")))
    }

    fn depends_on(id: &str, version: &str, dependency: &str) -> NupkgBuilder {
        NupkgBuilder::new(id, version).metadata(format!(
            r#"<dependencies><dependency id="{dependency}" version="1.0.0" /></dependencies>"#
        ))
    }

    #[tokio::test]
    async fn test_search_excludes_prerelease_by_default() {
        let service = service(&[NupkgBuilder::new("Demo", "1.0.0"), NupkgBuilder::new("Demo", "2.0.0-beta")]).await;

        let response = service.search(&SearchQuery::text("dem")).await.unwrap();
        assert_eq!(response.total_hits, 1);
        assert_eq!(response.data[0].version, "1.0.0");
        assert_eq!(response.data[0].versions.len(), 1);

        let query = SearchQuery { include_prerelease: true, ..SearchQuery::text("dem") };
        let response = service.search(&query).await.unwrap();
        assert_eq!(response.data[0].version, "2.0.0-beta");
        assert_eq!(response.data[0].versions.len(), 2);
    }

    #[tokio::test]
    async fn test_autocomplete_and_versions() {
        let uploads = [
            NupkgBuilder::new("Demo", "1.0.0"),
            NupkgBuilder::new("Demo", "1.1.0-rc.1"),
            NupkgBuilder::new("Demo.Extras", "1.0.0"),
        ];
        let service = service(&uploads).await;
        let ids = service.autocomplete(&SearchQuery::text("demo")).await.unwrap();
        assert_eq!(ids.data, ["Demo", "Demo.Extras"]);
        assert_eq!(service.versions("demo", false, false).await.unwrap().data, ["1.0.0"]);
        assert_eq!(service.versions("demo", true, true).await.unwrap().data, ["1.0.0", "1.1.0-rc.1"]);
    }

    #[tokio::test]
    async fn test_dependents() {
        let uploads = [
            NupkgBuilder::new("Core", "1.0.0"),
            depends_on("App", "1.0.0", "Core"),
            depends_on("App", "2.0.0", "core"),
            depends_on("Tool", "1.0.0", "Other"),
        ];
        let service = service(&uploads).await;
        let response = service.dependents("Core").await.unwrap();
        assert_eq!(response.total_hits, 1);
        assert_eq!(response.data[0].id, "App");
    }
}
