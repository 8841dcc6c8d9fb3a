//! `.nuspec` manifest parsing.
//!
//! Elements are matched on their local name so every nuspec schema namespace
//! (2010/07, 2011/08, 2012/06, 2013/05, ...) reads the same.

use std::collections::BTreeSet;

use burrow_frameworks::normalize_moniker;
use exn::{OptionExt, ResultExt};
use roxmltree::{Document, Node};
use tracing::instrument;

use crate::consts::{
    DEFAULT_PACKAGE_TYPE, DEFAULT_PACKAGE_TYPE_VERSION, MAX_ID_LENGTH, MAX_TARGET_FRAMEWORK_LENGTH,
    MAX_VERSION_LENGTH, MAX_VERSION_RANGE_LENGTH, PACKAGE_ID_REGEX,
};
use crate::error::{ErrorKind, Result};
use crate::models::{Dependency, NuGetVersion, Package, PackageType, SemVerLevel, VersionRange};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGroup {
    /// Canonical short folder name, `None` when the group has no framework.
    pub target_framework: Option<String>,
    pub dependencies: Vec<DeclaredDependency>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredDependency {
    pub id: String,
    pub range: Option<VersionRange>,
    /// The attribute as written, kept when it could not be parsed.
    pub raw_range: Option<String>,
}
impl DeclaredDependency {
    fn range_string(&self) -> String {
        match (&self.range, &self.raw_range) {
            (Some(range), _) => range.to_string(),
            (None, Some(raw)) => raw.clone(),
            (None, None) => VersionRange::all().to_string(),
        }
    }
}

/// Parsed package manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub id: String,
    pub version: NuGetVersion,
    pub authors: Vec<String>,
    pub description: String,
    pub release_notes: Option<String>,
    pub language: String,
    pub min_client_version: String,
    pub require_license_acceptance: bool,
    pub summary: String,
    pub title: String,
    pub icon_url: Option<String>,
    pub license_url: Option<String>,
    pub project_url: Option<String>,
    pub repository_url: Option<String>,
    pub repository_type: String,
    pub tags: Vec<String>,
    /// Archive path of the embedded readme.
    pub readme: Option<String>,
    /// Archive path of the embedded icon.
    pub icon: Option<String>,
    pub dependency_groups: Vec<DependencyGroup>,
    pub package_types: Vec<PackageType>,
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.is_element() && n.tag_name().name() == name)
}

fn children<'a, 'input: 'a>(node: Node<'a, 'input>, name: &'a str) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |n| n.is_element() && n.tag_name().name() == name)
}

fn text(node: Node<'_, '_>, name: &str) -> Option<String> {
    child(node, name)
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn attribute(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute(name).map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Normalise an archive path written in a manifest (`docs\README.md`,
/// `./icon.png`) to a zip entry name.
pub(crate) fn entry_name(path: &str) -> String {
    let forward = path.trim().replace('\\', "/");
    let mut rest = forward.as_str();
    loop {
        if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('/') {
            rest = stripped;
        } else {
            break rest.to_string();
        }
    }
}

fn split_list(value: Option<String>, separators: &[char]) -> Vec<String> {
    value
        .map(|value| {
            value
                .split(separators)
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn check_length(field: &'static str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        exn::bail!(ErrorKind::InvalidField {
            field,
            value: format!("longer than {max} characters"),
        });
    }
    Ok(())
}

impl Manifest {
    #[instrument(level = "debug", skip(xml), fields(xml_size = xml.len()))]
    pub fn parse(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).or_raise(|| ErrorKind::MalformedManifest("not well-formed XML".into()))?;
        let package = document.root_element();
        if package.tag_name().name() != "package" {
            exn::bail!(ErrorKind::MalformedManifest(format!("unexpected root <{}>", package.tag_name().name())));
        }
        let metadata = child(package, "metadata").ok_or_raise(|| ErrorKind::MissingField("metadata"))?;

        let id = text(metadata, "id").ok_or_raise(|| ErrorKind::MissingField("id"))?;
        check_length("id", &id, MAX_ID_LENGTH)?;
        if !PACKAGE_ID_REGEX.is_match(&id) {
            exn::bail!(ErrorKind::InvalidField { field: "id", value: id });
        }
        let raw_version = text(metadata, "version").ok_or_raise(|| ErrorKind::MissingField("version"))?;
        let version = NuGetVersion::parse(&raw_version)?;
        check_length("version", &version.to_normalized_string(), MAX_VERSION_LENGTH)?;

        let repository = child(metadata, "repository");
        Ok(Self {
            id,
            version,
            authors: split_list(text(metadata, "authors"), &[',']),
            description: text(metadata, "description").unwrap_or_default(),
            release_notes: text(metadata, "releaseNotes"),
            language: text(metadata, "language").unwrap_or_default(),
            min_client_version: attribute(metadata, "minClientVersion").unwrap_or_default(),
            require_license_acceptance: text(metadata, "requireLicenseAcceptance")
                .is_some_and(|value| value.eq_ignore_ascii_case("true")),
            summary: text(metadata, "summary").unwrap_or_default(),
            title: text(metadata, "title").unwrap_or_default(),
            icon_url: text(metadata, "iconUrl"),
            license_url: text(metadata, "licenseUrl"),
            project_url: text(metadata, "projectUrl"),
            repository_url: repository.and_then(|node| attribute(node, "url")),
            repository_type: repository.and_then(|node| attribute(node, "type")).unwrap_or_default(),
            tags: split_list(text(metadata, "tags"), &[' ', ',', ';', '\t', '\n', '\r']),
            readme: text(metadata, "readme").map(|path| entry_name(&path)),
            icon: text(metadata, "icon").map(|path| entry_name(&path)),
            dependency_groups: Self::dependency_groups(metadata)?,
            package_types: Self::package_types(metadata),
        })
    }

    fn declared_dependency(node: Node<'_, '_>) -> Result<DeclaredDependency> {
        let id = attribute(node, "id").ok_or_raise(|| ErrorKind::MissingField("dependency id"))?;
        let raw_range = attribute(node, "version");
        // Ranges this parser cannot read (floating versions) are kept verbatim.
        let range = raw_range.as_deref().map(VersionRange::parse).and_then(|parsed| parsed.ok());
        let dependency = DeclaredDependency { id, range, raw_range };
        check_length("dependency version range", &dependency.range_string(), MAX_VERSION_RANGE_LENGTH)?;
        Ok(dependency)
    }

    fn dependency_groups(metadata: Node<'_, '_>) -> Result<Vec<DependencyGroup>> {
        let Some(dependencies) = child(metadata, "dependencies") else {
            return Ok(Vec::new());
        };
        let mut groups = Vec::new();
        for group in children(dependencies, "group") {
            let target_framework = attribute(group, "targetFramework").map(|tfm| normalize_moniker(&tfm));
            if let Some(tfm) = &target_framework {
                check_length("target framework", tfm, MAX_TARGET_FRAMEWORK_LENGTH)?;
            }
            groups.push(DependencyGroup {
                target_framework,
                dependencies: children(group, "dependency").map(Self::declared_dependency).collect::<Result<_>>()?,
            });
        }
        // Pre-2.0 manifests list dependencies without groups.
        let ungrouped = children(dependencies, "dependency")
            .map(Self::declared_dependency)
            .collect::<Result<Vec<_>>>()?;
        if !ungrouped.is_empty() {
            groups.push(DependencyGroup {
                target_framework: None,
                dependencies: ungrouped,
            });
        }
        Ok(groups)
    }

    fn package_types(metadata: Node<'_, '_>) -> Vec<PackageType> {
        let declared = child(metadata, "packageTypes")
            .map(|types| {
                children(types, "packageType")
                    .filter_map(|node| {
                        let name = attribute(node, "name")?;
                        let version = attribute(node, "version").unwrap_or_else(|| DEFAULT_PACKAGE_TYPE_VERSION.into());
                        Some(PackageType::new(name, version))
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        if declared.is_empty() {
            return vec![PackageType::new(DEFAULT_PACKAGE_TYPE, DEFAULT_PACKAGE_TYPE_VERSION)];
        }
        declared
    }

    /// Whether the version or any dependency range needs a SemVer 2.0.0 client.
    pub fn semver_level(&self) -> SemVerLevel {
        let ranges_need_semver2 = self
            .dependency_groups
            .iter()
            .flat_map(|group| &group.dependencies)
            .filter_map(|dependency| dependency.range.as_ref())
            .any(VersionRange::is_semver2);
        match self.version.is_semver2() || ranges_need_semver2 {
            true => SemVerLevel::SemVer2,
            false => SemVerLevel::Legacy,
        }
    }

    /// Frameworks named by dependency groups.
    pub fn dependency_frameworks(&self) -> impl Iterator<Item = &str> {
        self.dependency_groups.iter().filter_map(|group| group.target_framework.as_deref())
    }

    /// Build the package record. `target_frameworks` are the frameworks the
    /// archive supports, as found by the caller.
    pub fn into_package(self, target_frameworks: BTreeSet<String>) -> Package {
        let semver_level = self.semver_level();
        let dependencies = self
            .dependency_groups
            .iter()
            .flat_map(|group| {
                if group.dependencies.is_empty() {
                    return vec![Dependency::empty_group(group.target_framework.clone())];
                }
                group
                    .dependencies
                    .iter()
                    .map(|dependency| {
                        Dependency::new(group.target_framework.clone(), &dependency.id, dependency.range_string())
                    })
                    .collect()
            })
            .collect();
        let mut package = Package::new(self.id, self.version);
        package.authors = self.authors;
        package.description = self.description;
        package.has_readme = self.readme.is_some();
        package.has_embedded_icon = self.icon.is_some();
        package.release_notes = self.release_notes;
        package.language = self.language;
        package.min_client_version = self.min_client_version;
        package.require_license_acceptance = self.require_license_acceptance;
        package.semver_level = semver_level;
        package.summary = self.summary;
        package.title = self.title;
        package.icon_url = self.icon_url;
        package.license_url = self.license_url;
        package.project_url = self.project_url;
        package.repository_url = self.repository_url;
        package.repository_type = self.repository_type;
        package.tags = self.tags;
        package.dependencies = dependencies;
        package.package_types = self.package_types;
        package.target_frameworks = target_frameworks.into_iter().collect();
        package
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const FULL: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd">
  <metadata minClientVersion="4.0">
    <id>Contoso.Utility</id>
    <version>2.1.0-beta+build.9</version>
    <title>Contoso Utility</title>
    <authors>Ada, Grace ,</authors>
    <requireLicenseAcceptance>true</requireLicenseAcceptance>
    <description>Helpers.</description>
    <summary>Short.</summary>
    <releaseNotes>Fixed things.</releaseNotes>
    <language>en-US</language>
    <projectUrl>https://example.com/</projectUrl>
    <repository type="git" url="https://example.com/repo.git" />
    <tags>util  helpers,misc</tags>
    <readme>docs\README.md</readme>
    <icon>./images/icon.png</icon>
    <packageTypes>
      <packageType name="DotnetTool" />
    </packageTypes>
    <dependencies>
      <group targetFramework=".NETStandard2.0">
        <dependency id="Newtonsoft.Json" version="13.0.1" />
        <dependency id="Contoso.Core" version="[1.0.0-alpha.1, 2.0.0)" />
      </group>
      <group targetFramework="net472" />
    </dependencies>
  </metadata>
</package>"#;

    #[test]
    fn test_parse_full_manifest() {
        let manifest = Manifest::parse(FULL).unwrap();
        assert_eq!(manifest.id, "Contoso.Utility");
        assert_eq!(manifest.version.original(), "2.1.0-beta+build.9");
        assert_eq!(manifest.authors, ["Ada", "Grace"]);
        assert!(manifest.require_license_acceptance);
        assert_eq!(manifest.min_client_version, "4.0");
        assert_eq!(manifest.repository_type, "git");
        assert_eq!(manifest.repository_url.as_deref(), Some("https://example.com/repo.git"));
        assert_eq!(manifest.tags, ["util", "helpers", "misc"]);
        assert_eq!(manifest.readme.as_deref(), Some("docs/README.md"));
        assert_eq!(manifest.icon.as_deref(), Some("images/icon.png"));
        assert_eq!(manifest.package_types, [PackageType::new("DotnetTool", "0.0")]);
        assert_eq!(manifest.dependency_frameworks().collect::<Vec<_>>(), ["netstandard2.0", "net472"]);
        assert_eq!(manifest.semver_level(), SemVerLevel::SemVer2);
    }

    #[test]
    fn test_into_package_dependencies() {
        let package = Manifest::parse(FULL).unwrap().into_package(BTreeSet::new());
        assert_eq!(
            package.dependencies,
            [
                Dependency::new(Some("netstandard2.0".into()), "Newtonsoft.Json", "[13.0.1, )"),
                Dependency::new(Some("netstandard2.0".into()), "Contoso.Core", "[1.0.0-alpha.1, 2.0.0)"),
                Dependency::empty_group(Some("net472".into())),
            ]
        );
        assert_eq!(package.real_dependencies().count(), 2);
        assert!(package.has_readme);
        assert!(package.has_embedded_icon);
        assert!(package.is_prerelease);
        assert!(package.listed);
        assert_eq!(package.downloads, 0);
    }

    #[test]
    fn test_minimal_manifest_defaults() {
        let xml = "<package><metadata><id>Demo</id><version>1.0.0</version></metadata></package>";
        let manifest = Manifest::parse(xml).unwrap();
        assert!(manifest.readme.is_none());
        assert!(manifest.dependency_groups.is_empty());
        assert_eq!(manifest.package_types, [PackageType::new("Dependency", "0.0")]);
        assert_eq!(manifest.semver_level(), SemVerLevel::Legacy);
    }

    #[test]
    fn test_ungrouped_dependencies() {
        let xml = r#"<package><metadata><id>Old</id><version>1.0</version>
            <dependencies><dependency id="Dep" /><dependency id="Float" version="1.*" /></dependencies>
            </metadata></package>"#;
        let package = Manifest::parse(xml).unwrap().into_package(BTreeSet::new());
        assert_eq!(
            package.dependencies,
            [Dependency::new(None, "Dep", "(, )"), Dependency::new(None, "Float", "1.*")]
        );
    }

    #[test]
    fn test_semver2_from_dependency_range_only() {
        let xml = r#"<package><metadata><id>A</id><version>1.0.0</version>
            <dependencies><group><dependency id="B" version="[1.0.0-rc.1, )" /></group></dependencies>
            </metadata></package>"#;
        let manifest = Manifest::parse(xml).unwrap();
        assert!(!manifest.version.is_semver2());
        assert_eq!(manifest.semver_level(), SemVerLevel::SemVer2);
    }

    #[rstest]
    #[case("not xml at all", ErrorKind::MalformedManifest("not well-formed XML".into()))]
    #[case("<nuspec/>", ErrorKind::MalformedManifest("unexpected root <nuspec>".into()))]
    #[case("<package/>", ErrorKind::MissingField("metadata"))]
    #[case("<package><metadata><version>1.0</version></metadata></package>", ErrorKind::MissingField("id"))]
    #[case("<package><metadata><id>Demo</id></metadata></package>", ErrorKind::MissingField("version"))]
    fn test_rejected(#[case] xml: &str, #[case] expected: ErrorKind) {
        let err = Manifest::parse(xml).unwrap_err();
        assert_eq!(*err, expected);
    }

    #[rstest]
    #[case("Bad Id")]
    #[case("../escape")]
    #[case(".leading")]
    fn test_invalid_ids(#[case] id: &str) {
        let xml = format!("<package><metadata><id>{id}</id><version>1.0</version></metadata></package>");
        assert!(Manifest::parse(&xml).is_err());
    }

    #[test]
    fn test_id_length_limit() {
        let xml = format!("<package><metadata><id>{}</id><version>1.0</version></metadata></package>", "a".repeat(129));
        assert!(matches!(&*Manifest::parse(&xml).unwrap_err(), ErrorKind::InvalidField { field: "id", .. }));
    }

    #[rstest]
    #[case("README.md", "README.md")]
    #[case("docs\\README.md", "docs/README.md")]
    #[case("./docs/README.md", "docs/README.md")]
    #[case("/icon.png", "icon.png")]
    fn test_entry_name(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(entry_name(input), expected);
    }
}
