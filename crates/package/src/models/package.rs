use time::OffsetDateTime;

use super::{Dependency, NuGetVersion, PackageType};

/// Whether older clients can see a package version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SemVerLevel {
    /// Visible to every client.
    #[default]
    Legacy,
    /// The version or one of its dependency ranges uses SemVer 2.0.0 syntax.
    SemVer2,
}
impl SemVerLevel {
    /// Numeric form used by the metadata store and the NuGet protocol.
    pub fn as_i64(&self) -> i64 {
        match self {
            Self::Legacy => 0,
            Self::SemVer2 => 2,
        }
    }

    pub fn from_i64(value: i64) -> Self {
        match value {
            2 => Self::SemVer2,
            _ => Self::Legacy,
        }
    }
}

/// Everything known about one version of one package.
///
/// `id` keeps the casing it was uploaded with but is compared
/// case-insensitively. The version's identity is its lowercased normalized
/// form; [`NuGetVersion::original`] keeps the spelling from the manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub id: String,
    pub version: NuGetVersion,
    pub authors: Vec<String>,
    pub description: String,
    pub downloads: i64,
    pub has_readme: bool,
    pub has_embedded_icon: bool,
    pub is_prerelease: bool,
    pub release_notes: Option<String>,
    pub language: String,
    pub listed: bool,
    pub min_client_version: String,
    pub published: OffsetDateTime,
    pub require_license_acceptance: bool,
    pub semver_level: SemVerLevel,
    pub summary: String,
    pub title: String,
    pub icon_url: Option<String>,
    pub license_url: Option<String>,
    pub project_url: Option<String>,
    pub repository_url: Option<String>,
    pub repository_type: String,
    pub tags: Vec<String>,
    pub dependencies: Vec<Dependency>,
    pub package_types: Vec<PackageType>,
    pub target_frameworks: Vec<String>,
    /// Concurrency token; bumped by the metadata store on every update.
    pub row_version: i64,
}
impl Package {
    /// A fresh, listed record with nothing but the coordinates filled in.
    pub fn new(id: impl Into<String>, version: NuGetVersion) -> Self {
        let is_prerelease = version.is_prerelease();
        let semver_level = if version.is_semver2() { SemVerLevel::SemVer2 } else { SemVerLevel::Legacy };
        Self {
            id: id.into(),
            version,
            authors: Vec::new(),
            description: String::new(),
            downloads: 0,
            has_readme: false,
            has_embedded_icon: false,
            is_prerelease,
            release_notes: None,
            language: String::new(),
            listed: true,
            min_client_version: String::new(),
            published: OffsetDateTime::now_utc(),
            require_license_acceptance: false,
            semver_level,
            summary: String::new(),
            title: String::new(),
            icon_url: None,
            license_url: None,
            project_url: None,
            repository_url: None,
            repository_type: String::new(),
            tags: Vec::new(),
            dependencies: Vec::new(),
            package_types: Vec::new(),
            target_frameworks: Vec::new(),
            row_version: 0,
        }
    }

    /// Lowercased normalized version, the form stored and compared.
    pub fn normalized_version(&self) -> String {
        self.version.to_lower_normalized()
    }

    /// Dependency rows that name an actual dependency.
    pub fn real_dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies.iter().filter(|dependency| !dependency.is_empty_group_marker())
    }
}
