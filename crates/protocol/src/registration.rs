//! Registration index and leaf documents (`RegistrationsBaseUrl`).

use burrow_package::models::{Package, PackageRegistration};

use crate::models::{
    CatalogEntry, DependencyGroupItem, DependencyItem, RegistrationIndex, RegistrationLeaf, RegistrationPage,
    RegistrationPageItem,
};
use crate::url::UrlGenerator;

const INDEX_TYPES: &[&str] = &["catalog:CatalogRoot", "PackageRegistration", "catalog:Permalink"];
const LEAF_TYPES: &[&str] = &["Package", "http://schema.nuget.org/catalog#Permalink"];

#[derive(Debug, Clone)]
pub struct RegistrationBuilder {
    url: UrlGenerator,
}
impl RegistrationBuilder {
    pub fn new(url: UrlGenerator) -> Self {
        Self { url }
    }

    /// Every version of a package on a single page, ascending.
    ///
    /// Returns `None` for a registration without packages; there is no
    /// version range to describe.
    pub fn build_index(&self, registration: &PackageRegistration) -> Option<RegistrationIndex> {
        let mut packages = registration.packages.iter().collect::<Vec<_>>();
        packages.sort_by(|a, b| a.version.cmp(&b.version));
        let lower = packages.first()?.version.to_lower_normalized();
        let upper = packages.last()?.version.to_lower_normalized();
        let index_url = self.url.registration_index(&registration.id);
        Some(RegistrationIndex {
            url: index_url.clone(),
            kinds: INDEX_TYPES.iter().map(|kind| kind.to_string()).collect(),
            count: 1,
            total_downloads: registration.total_downloads(),
            items: vec![RegistrationPage {
                url: index_url,
                count: packages.len(),
                lower,
                upper,
                items: packages.into_iter().map(|package| self.page_item(package)).collect(),
            }],
        })
    }

    pub fn build_leaf(&self, package: &Package) -> RegistrationLeaf {
        RegistrationLeaf {
            url: self.url.registration_leaf(&package.id, &package.version),
            kinds: LEAF_TYPES.iter().map(|kind| kind.to_string()).collect(),
            listed: package.listed,
            package_content: self.url.package_download(&package.id, &package.version),
            published: package.published,
            registration_index: self.url.registration_index(&package.id),
        }
    }

    fn page_item(&self, package: &Package) -> RegistrationPageItem {
        let leaf_url = self.url.registration_leaf(&package.id, &package.version);
        let package_content = self.url.package_download(&package.id, &package.version);
        let icon_url = if package.has_embedded_icon {
            self.url.package_icon(&package.id, &package.version)
        } else {
            package.icon_url.clone().unwrap_or_default()
        };
        RegistrationPageItem {
            leaf_url: leaf_url.clone(),
            package_content: package_content.clone(),
            catalog_entry: CatalogEntry {
                url: leaf_url,
                id: package.id.clone(),
                version: package.version.to_full_string(),
                authors: package.authors.join(", "),
                dependency_groups: dependency_groups(package),
                description: package.description.clone(),
                downloads: package.downloads,
                has_readme: package.has_readme,
                icon_url,
                language: package.language.clone(),
                license_url: package.license_url.clone().unwrap_or_default(),
                listed: package.listed,
                min_client_version: package.min_client_version.clone(),
                package_content,
                package_types: package
                    .package_types
                    .iter()
                    .filter(|t| !t.name.is_empty())
                    .map(|t| t.name.clone())
                    .collect(),
                project_url: package.project_url.clone().unwrap_or_default(),
                published: package.published,
                release_notes: package.release_notes.clone().unwrap_or_default(),
                repository_url: package.repository_url.clone().unwrap_or_default(),
                repository_type: Some(package.repository_type.clone()).filter(|t| !t.is_empty()),
                require_license_acceptance: package.require_license_acceptance,
                summary: package.summary.clone(),
                tags: package.tags.clone(),
                title: package.title.clone(),
            },
        }
    }
}

/// Group dependency rows by framework, in order of first appearance.
///
/// Empty-group marker rows keep their group in the output but add no
/// dependency to it.
fn dependency_groups(package: &Package) -> Vec<DependencyGroupItem> {
    let mut groups: Vec<DependencyGroupItem> = Vec::new();
    for dependency in &package.dependencies {
        let index = match groups.iter().position(|g| g.target_framework == dependency.target_framework) {
            Some(index) => index,
            None => {
                groups.push(DependencyGroupItem {
                    target_framework: dependency.target_framework.clone(),
                    dependencies: Vec::new(),
                });
                groups.len() - 1
            },
        };
        if let (Some(id), Some(range)) = (&dependency.id, &dependency.version_range) {
            groups[index].dependencies.push(DependencyItem {
                id: id.clone(),
                range: range.clone(),
            });
        }
    }
    groups
}
