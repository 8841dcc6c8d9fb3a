use crate::error::{Error, ErrorKind};
use crate::models::Children;
use burrow_package::models::{NuGetVersion, Package, SemVerLevel};
use exn::ResultExt;
use facet_json::{from_str as from_json, to_string as to_json};
use time::OffsetDateTime;

#[derive(sqlx::FromRow)]
pub(crate) struct PackageRow {
    #[sqlx(default)]
    pub(crate) pkey: i64,
    pub(crate) id: String,
    pub(crate) id_lower: String,
    pub(crate) normalized_version: String,
    pub(crate) original_version: Option<String>,
    pub(crate) authors: String,
    pub(crate) description: String,
    pub(crate) downloads: i64,
    pub(crate) has_readme: bool,
    pub(crate) has_embedded_icon: bool,
    pub(crate) is_prerelease: bool,
    pub(crate) release_notes: Option<String>,
    pub(crate) language: String,
    pub(crate) listed: bool,
    pub(crate) min_client_version: String,
    pub(crate) published: i64,
    pub(crate) require_license_acceptance: bool,
    pub(crate) semver_level: i64,
    pub(crate) summary: String,
    pub(crate) title: String,
    pub(crate) icon_url: Option<String>,
    pub(crate) license_url: Option<String>,
    pub(crate) project_url: Option<String>,
    pub(crate) repository_url: Option<String>,
    pub(crate) repository_type: String,
    pub(crate) tags: String,
    pub(crate) row_version: i64,
}
impl TryFrom<&Package> for PackageRow {
    type Error = Error;
    fn try_from(package: &Package) -> Result<Self, Self::Error> {
        Ok(Self {
            pkey: 0,
            id: package.id.clone(),
            id_lower: package.id.to_lowercase(),
            normalized_version: package.normalized_version(),
            original_version: Some(package.version.original().to_string()),
            authors: to_json(&package.authors).or_raise(|| ErrorKind::InvalidData("authors"))?,
            description: package.description.clone(),
            downloads: package.downloads,
            has_readme: package.has_readme,
            has_embedded_icon: package.has_embedded_icon,
            is_prerelease: package.is_prerelease,
            release_notes: package.release_notes.clone(),
            language: package.language.clone(),
            listed: package.listed,
            min_client_version: package.min_client_version.clone(),
            published: package.published.unix_timestamp(),
            require_license_acceptance: package.require_license_acceptance,
            semver_level: package.semver_level.as_i64(),
            summary: package.summary.clone(),
            title: package.title.clone(),
            icon_url: package.icon_url.clone(),
            license_url: package.license_url.clone(),
            project_url: package.project_url.clone(),
            repository_url: package.repository_url.clone(),
            repository_type: package.repository_type.clone(),
            tags: to_json(&package.tags).or_raise(|| ErrorKind::InvalidData("tags"))?,
            row_version: package.row_version,
        })
    }
}
impl PackageRow {
    /// Version as uploaded, falling back to the normalized form for rows that
    /// never recorded the original spelling.
    pub(crate) fn version(&self) -> Result<NuGetVersion, Error> {
        let raw = self.original_version.as_deref().unwrap_or(&self.normalized_version);
        NuGetVersion::parse(raw).or_raise(|| ErrorKind::InvalidData("version"))
    }
}
impl PackageRow {
    pub(crate) fn into_package(self, children: Children) -> Result<Package, Error> {
        let row = self;
        Ok(Package {
            version: row.version()?,
            id: row.id,
            authors: from_json::<Vec<String>>(&row.authors).or_raise(|| ErrorKind::InvalidData("authors"))?,
            description: row.description,
            downloads: row.downloads,
            has_readme: row.has_readme,
            has_embedded_icon: row.has_embedded_icon,
            is_prerelease: row.is_prerelease,
            release_notes: row.release_notes,
            language: row.language,
            listed: row.listed,
            min_client_version: row.min_client_version,
            published: OffsetDateTime::from_unix_timestamp(row.published)
                .or_raise(|| ErrorKind::InvalidData("published"))?,
            require_license_acceptance: row.require_license_acceptance,
            semver_level: SemVerLevel::from_i64(row.semver_level),
            summary: row.summary,
            title: row.title,
            icon_url: row.icon_url,
            license_url: row.license_url,
            project_url: row.project_url,
            repository_url: row.repository_url,
            repository_type: row.repository_type,
            tags: from_json::<Vec<String>>(&row.tags).or_raise(|| ErrorKind::InvalidData("tags"))?,
            dependencies: children.dependencies,
            package_types: children.package_types,
            target_frameworks: children.target_frameworks,
            row_version: row.row_version,
        })
    }
}
