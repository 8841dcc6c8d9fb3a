/// One dependency row of a package version.
///
/// A row with neither `id` nor `version_range` marks a target framework the
/// package supports without needing anything; it is never reported as a
/// dependency but its framework still counts as supported.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    /// Short folder name of the dependency group, `None` for ungrouped
    /// dependencies.
    pub target_framework: Option<String>,
    pub id: Option<String>,
    /// Normalized range in interval notation when it could be parsed,
    /// otherwise as written in the manifest.
    pub version_range: Option<String>,
}
impl Dependency {
    pub fn new(target_framework: Option<String>, id: impl Into<String>, version_range: impl Into<String>) -> Self {
        Self {
            target_framework,
            id: Some(id.into()),
            version_range: Some(version_range.into()),
        }
    }

    /// Marker row for a framework the package supports with no dependencies.
    pub fn empty_group(target_framework: Option<String>) -> Self {
        Self {
            target_framework,
            id: None,
            version_range: None,
        }
    }

    pub fn is_empty_group_marker(&self) -> bool {
        self.id.is_none() && self.version_range.is_none()
    }
}

/// Declared package type (`Dependency`, `DotnetTool`, `Template`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageType {
    pub name: String,
    pub version: String,
}
impl PackageType {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}
