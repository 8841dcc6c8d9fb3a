use burrow_package::models::NuGetVersion;

/// Absolute URLs of every resource the registry serves.
///
/// Ids and versions in URLs are lowercased, versions normalized, so every
/// spelling of a package resolves to the same address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlGenerator {
    base: String,
}
impl UrlGenerator {
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            base: base_url.as_ref().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn absolute(&self, path: impl AsRef<str>) -> String {
        format!("{}/{}", self.base, path.as_ref())
    }

    pub fn service_index(&self) -> String {
        self.absolute("v3/index.json")
    }

    pub fn package_publish(&self) -> String {
        self.absolute("api/v2/package")
    }

    pub fn search(&self) -> String {
        self.absolute("v3/search")
    }

    pub fn autocomplete(&self) -> String {
        self.absolute("v3/autocomplete")
    }

    /// Base of the `PackageBaseAddress` resource.
    pub fn package_content_resource(&self) -> String {
        self.absolute("v3/package")
    }

    /// Base of the `RegistrationsBaseUrl` resource.
    pub fn package_metadata_resource(&self) -> String {
        self.absolute("v3/registration")
    }

    pub fn registration_index(&self, id: &str) -> String {
        self.absolute(format!("v3/registration/{}/index.json", id.to_lowercase()))
    }

    pub fn registration_leaf(&self, id: &str, version: &NuGetVersion) -> String {
        self.absolute(format!("v3/registration/{}/{}.json", id.to_lowercase(), version.to_lower_normalized()))
    }

    pub fn package_versions(&self, id: &str) -> String {
        self.absolute(format!("v3/package/{}/index.json", id.to_lowercase()))
    }

    pub fn package_download(&self, id: &str, version: &NuGetVersion) -> String {
        let (id, version) = (id.to_lowercase(), version.to_lower_normalized());
        self.absolute(format!("v3/package/{id}/{version}/{id}.{version}.nupkg"))
    }

    pub fn package_manifest(&self, id: &str, version: &NuGetVersion) -> String {
        let (id, version) = (id.to_lowercase(), version.to_lower_normalized());
        self.absolute(format!("v3/package/{id}/{version}/{id}.nuspec"))
    }

    pub fn package_readme(&self, id: &str, version: &NuGetVersion) -> String {
        let (id, version) = (id.to_lowercase(), version.to_lower_normalized());
        self.absolute(format!("v3/package/{id}/{version}/readme"))
    }

    pub fn package_icon(&self, id: &str, version: &NuGetVersion) -> String {
        let (id, version) = (id.to_lowercase(), version.to_lower_normalized());
        self.absolute(format!("v3/package/{id}/{version}/icon"))
    }
}
