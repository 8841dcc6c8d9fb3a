//! Wire documents of the NuGet V3 protocol. Field names are part of the
//! protocol and must not change.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub const SCHEMA_VOCABULARY: &str = "http://schema.nuget.org/schema#";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceIndex {
    pub version: String,
    pub resources: Vec<ServiceIndexResource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceIndexResource {
    #[serde(rename = "@id")]
    pub url: String,
    #[serde(rename = "@type")]
    pub kind: String,
}

// =============================================================================
// Registrations
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationIndex {
    #[serde(rename = "@id")]
    pub url: String,
    #[serde(rename = "@type")]
    pub kinds: Vec<String>,
    /// Number of pages.
    pub count: usize,
    #[serde(rename = "totalDownloads")]
    pub total_downloads: i64,
    pub items: Vec<RegistrationPage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationPage {
    #[serde(rename = "@id")]
    pub url: String,
    /// Number of versions on the page.
    pub count: usize,
    pub lower: String,
    pub upper: String,
    pub items: Vec<RegistrationPageItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationPageItem {
    #[serde(rename = "@id")]
    pub leaf_url: String,
    #[serde(rename = "packageContent")]
    pub package_content: String,
    #[serde(rename = "catalogEntry")]
    pub catalog_entry: CatalogEntry,
}

/// Snapshot of one package version inside a registration page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "@id")]
    pub url: String,
    pub id: String,
    pub version: String,
    pub authors: String,
    #[serde(rename = "dependencyGroups")]
    pub dependency_groups: Vec<DependencyGroupItem>,
    pub description: String,
    pub downloads: i64,
    #[serde(rename = "hasReadme")]
    pub has_readme: bool,
    #[serde(rename = "iconUrl")]
    pub icon_url: String,
    pub language: String,
    #[serde(rename = "licenseUrl")]
    pub license_url: String,
    pub listed: bool,
    #[serde(rename = "minClientVersion")]
    pub min_client_version: String,
    #[serde(rename = "packageContent")]
    pub package_content: String,
    #[serde(rename = "packageTypes")]
    pub package_types: Vec<String>,
    #[serde(rename = "projectUrl")]
    pub project_url: String,
    #[serde(with = "time::serde::rfc3339")]
    pub published: OffsetDateTime,
    #[serde(rename = "releaseNotes")]
    pub release_notes: String,
    #[serde(rename = "repositoryUrl")]
    pub repository_url: String,
    #[serde(rename = "repositoryType", default, skip_serializing_if = "Option::is_none")]
    pub repository_type: Option<String>,
    #[serde(rename = "requireLicenseAcceptance")]
    pub require_license_acceptance: bool,
    pub summary: String,
    pub tags: Vec<String>,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGroupItem {
    #[serde(rename = "targetFramework", default, skip_serializing_if = "Option::is_none")]
    pub target_framework: Option<String>,
    pub dependencies: Vec<DependencyItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyItem {
    pub id: String,
    pub range: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationLeaf {
    #[serde(rename = "@id")]
    pub url: String,
    #[serde(rename = "@type")]
    pub kinds: Vec<String>,
    pub listed: bool,
    #[serde(rename = "packageContent")]
    pub package_content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub published: OffsetDateTime,
    #[serde(rename = "registration")]
    pub registration_index: String,
}

// =============================================================================
// Search
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchContext {
    #[serde(rename = "@vocab")]
    pub vocabulary: String,
    #[serde(rename = "@base", default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "@context")]
    pub context: SearchContext,
    #[serde(rename = "totalHits")]
    pub total_hits: usize,
    pub data: Vec<SearchResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub version: String,
    pub description: String,
    pub authors: Vec<String>,
    #[serde(rename = "iconUrl")]
    pub icon_url: String,
    #[serde(rename = "licenseUrl")]
    pub license_url: String,
    #[serde(rename = "packageTypes")]
    pub package_types: Vec<SearchResultPackageType>,
    #[serde(rename = "projectUrl")]
    pub project_url: String,
    #[serde(rename = "registration")]
    pub registration_index: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub title: String,
    #[serde(rename = "totalDownloads")]
    pub total_downloads: i64,
    pub versions: Vec<SearchResultVersion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResultPackageType {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResultVersion {
    #[serde(rename = "@id")]
    pub leaf_url: String,
    pub version: String,
    pub downloads: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutocompleteResponse {
    #[serde(rename = "@context")]
    pub context: SearchContext,
    #[serde(rename = "totalHits")]
    pub total_hits: usize,
    pub data: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependentsResponse {
    #[serde(rename = "totalHits")]
    pub total_hits: usize,
    pub data: Vec<PackageDependent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDependent {
    pub id: String,
    pub description: String,
    #[serde(rename = "totalDownloads")]
    pub total_downloads: i64,
}

// =============================================================================
// Package content
// =============================================================================

/// Every version of a package, lowercased and normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVersions {
    pub versions: Vec<String>,
}
