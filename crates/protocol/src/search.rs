//! Search, autocomplete and dependents documents.

use burrow_package::models::{Package, PackageRegistration};

use crate::models::{
    AutocompleteResponse, DependentsResponse, PackageDependent, SCHEMA_VOCABULARY, SearchContext, SearchResponse,
    SearchResult, SearchResultPackageType, SearchResultVersion,
};
use crate::url::UrlGenerator;

#[derive(Debug, Clone)]
pub struct SearchResponseBuilder {
    url: UrlGenerator,
}
impl SearchResponseBuilder {
    pub fn new(url: UrlGenerator) -> Self {
        Self { url }
    }

    /// One result per registration, described by its newest version.
    /// Registrations without packages are skipped.
    pub fn build_search(&self, registrations: &[PackageRegistration]) -> SearchResponse {
        let data = registrations.iter().filter_map(|r| self.result(r)).collect::<Vec<_>>();
        SearchResponse {
            context: SearchContext {
                vocabulary: SCHEMA_VOCABULARY.to_string(),
                base: Some(self.url.package_metadata_resource()),
            },
            total_hits: data.len(),
            data,
        }
    }

    pub fn build_autocomplete(&self, data: Vec<String>) -> AutocompleteResponse {
        AutocompleteResponse {
            context: SearchContext {
                vocabulary: SCHEMA_VOCABULARY.to_string(),
                base: None,
            },
            total_hits: data.len(),
            data,
        }
    }

    pub fn build_dependents(&self, packages: &[Package]) -> DependentsResponse {
        let data = packages
            .iter()
            .map(|package| PackageDependent {
                id: package.id.clone(),
                description: package.description.clone(),
                total_downloads: package.downloads,
            })
            .collect::<Vec<_>>();
        DependentsResponse {
            total_hits: data.len(),
            data,
        }
    }

    fn result(&self, registration: &PackageRegistration) -> Option<SearchResult> {
        let mut versions = registration.packages.iter().collect::<Vec<_>>();
        versions.sort_by(|a, b| b.version.cmp(&a.version));
        let latest = *versions.first()?;
        let icon_url = if latest.has_embedded_icon {
            self.url.package_icon(&latest.id, &latest.version)
        } else {
            latest.icon_url.clone().unwrap_or_default()
        };
        Some(SearchResult {
            id: latest.id.clone(),
            version: latest.version.to_full_string(),
            description: latest.description.clone(),
            authors: latest.authors.clone(),
            icon_url,
            license_url: latest.license_url.clone().unwrap_or_default(),
            package_types: latest
                .package_types
                .iter()
                .map(|t| SearchResultPackageType { name: t.name.clone() })
                .collect(),
            project_url: latest.project_url.clone().unwrap_or_default(),
            registration_index: self.url.registration_index(&latest.id),
            summary: latest.summary.clone(),
            tags: latest.tags.clone(),
            title: latest.title.clone(),
            total_downloads: versions.iter().map(|p| p.downloads).sum(),
            versions: versions
                .iter()
                .map(|p| SearchResultVersion {
                    leaf_url: self.url.registration_leaf(&p.id, &p.version),
                    version: p.version.to_full_string(),
                    downloads: p.downloads,
                })
                .collect(),
        })
    }
}
