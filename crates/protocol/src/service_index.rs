use crate::models::{ServiceIndex, ServiceIndexResource};
use crate::url::UrlGenerator;

pub const SERVICE_INDEX_VERSION: &str = "3.0.0";

/// The entry document clients fetch first to discover every other resource.
///
/// Each resource is advertised under several type versions; an empty version
/// advertises the bare type.
pub fn service_index(url: &UrlGenerator) -> ServiceIndex {
    let resources: [(&str, String, &[&str]); 5] = [
        ("PackagePublish", url.package_publish(), &["2.0.0"]),
        ("SearchQueryService", url.search(), &["", "3.0.0-beta", "3.0.0-rc"]),
        ("RegistrationsBaseUrl", url.package_metadata_resource(), &["", "3.0.0-rc", "3.0.0-beta"]),
        ("PackageBaseAddress", url.package_content_resource(), &["3.0.0"]),
        ("SearchAutocompleteService", url.autocomplete(), &["", "3.0.0-rc", "3.0.0-beta"]),
    ];
    let resources = resources
        .into_iter()
        .flat_map(|(name, address, versions)| {
            versions.iter().map(move |version| ServiceIndexResource {
                url: address.clone(),
                kind: if version.is_empty() { name.to_string() } else { format!("{name}/{version}") },
            })
        })
        .collect();
    ServiceIndex {
        version: SERVICE_INDEX_VERSION.to_string(),
        resources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resources() {
        let index = service_index(&UrlGenerator::new("https://nuget.example.com/"));
        assert_eq!(index.version, "3.0.0");
        assert_eq!(index.resources.len(), 11);
        let find = |kind: &str| index.resources.iter().find(|r| r.kind == kind).map(|r| r.url.as_str());
        assert_eq!(find("PackagePublish/2.0.0"), Some("https://nuget.example.com/api/v2/package"));
        assert_eq!(find("SearchQueryService/3.0.0-rc"), Some("https://nuget.example.com/v3/search"));
        assert_eq!(find("RegistrationsBaseUrl"), Some("https://nuget.example.com/v3/registration"));
        assert_eq!(find("PackageBaseAddress/3.0.0"), Some("https://nuget.example.com/v3/package"));
        assert_eq!(find("SearchAutocompleteService/3.0.0-beta"), Some("https://nuget.example.com/v3/autocomplete"));
        assert_eq!(find("SymbolPackagePublish/4.9.0"), None);
    }
}
