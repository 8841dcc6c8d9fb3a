//! NuGet V3 protocol documents.
//!
//! Builders project package records into the documents clients read: the
//! service index, registration indexes and leaves, search, autocomplete,
//! dependents and version listings. URLs come from a [`UrlGenerator`] rooted
//! at the registry's public base URL.

pub mod models;
mod registration;
mod search;
mod service_index;
mod url;

use burrow_package::models::NuGetVersion;

pub use crate::registration::RegistrationBuilder;
pub use crate::search::SearchResponseBuilder;
pub use crate::service_index::{SERVICE_INDEX_VERSION, service_index};
pub use crate::url::UrlGenerator;

/// The `PackageBaseAddress` versions document.
pub fn package_versions<'a>(versions: impl IntoIterator<Item = &'a NuGetVersion>) -> models::PackageVersions {
    let mut versions = versions.into_iter().collect::<Vec<_>>();
    versions.sort();
    models::PackageVersions {
        versions: versions.into_iter().map(NuGetVersion::to_lower_normalized).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burrow_package::models::Package;
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn test_package_versions() {
        let versions = ["2.0.0", "1.0.0-Beta", "1.0.0"].map(|v| NuGetVersion::parse(v).unwrap());
        assert_eq!(package_versions(&versions).versions, ["1.0.0-beta", "1.0.0", "2.0.0"]);
    }

    #[test]
    fn test_leaf_wire_format() {
        let mut package = Package::new("Demo", NuGetVersion::parse("1.0.0").unwrap());
        package.published = datetime!(2024-05-01 12:30:00 UTC);
        let leaf = RegistrationBuilder::new(UrlGenerator::new("https://feed")).build_leaf(&package);
        assert_eq!(
            serde_json::to_value(&leaf).unwrap(),
            json!({
                "@id": "https://feed/v3/registration/demo/1.0.0.json",
                "@type": ["Package", "http://schema.nuget.org/catalog#Permalink"],
                "listed": true,
                "packageContent": "https://feed/v3/package/demo/1.0.0/demo.1.0.0.nupkg",
                "published": "2024-05-01T12:30:00Z",
                "registration": "https://feed/v3/registration/demo/index.json",
            })
        );
    }

    #[test]
    fn test_autocomplete_wire_format() {
        let builder = SearchResponseBuilder::new(UrlGenerator::new("https://feed"));
        let response = builder.build_autocomplete(vec!["Demo".into()]);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "@context": {"@vocab": "http://schema.nuget.org/schema#"},
                "totalHits": 1,
                "data": ["Demo"],
            })
        );
    }

    #[test]
    fn test_catalog_entry_omits_empty_repository_type() {
        let package = Package::new("Demo", NuGetVersion::parse("1.0.0").unwrap());
        let registration = burrow_package::models::PackageRegistration::new("Demo", vec![package]);
        let index = RegistrationBuilder::new(UrlGenerator::new("https://feed")).build_index(&registration).unwrap();
        let value = serde_json::to_value(&index).unwrap();
        let entry = &value["items"][0]["items"][0]["catalogEntry"];
        assert_eq!(entry["id"], "Demo");
        assert!(entry.get("repositoryType").is_none());
        assert_eq!(value["totalDownloads"], 0);
    }
}
