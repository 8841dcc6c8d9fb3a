use burrow_package::models::{Dependency, PackageType};
use std::collections::HashMap;

#[derive(sqlx::FromRow)]
pub(crate) struct DependencyRow {
    pub(crate) package_key: i64,
    pub(crate) target_framework: Option<String>,
    pub(crate) id: Option<String>,
    pub(crate) version_range: Option<String>,
}
impl From<DependencyRow> for Dependency {
    fn from(row: DependencyRow) -> Self {
        Self {
            target_framework: row.target_framework,
            id: row.id,
            version_range: row.version_range,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PackageTypeRow {
    pub(crate) package_key: i64,
    pub(crate) name: String,
    pub(crate) version: String,
}
impl From<PackageTypeRow> for PackageType {
    fn from(row: PackageTypeRow) -> Self {
        Self {
            name: row.name,
            version: row.version,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct FrameworkRow {
    pub(crate) package_key: i64,
    pub(crate) moniker: String,
}

/// Rows of the child tables, keyed by the package they belong to.
#[derive(Debug, Default)]
pub(crate) struct Children {
    pub(crate) dependencies: Vec<Dependency>,
    pub(crate) package_types: Vec<PackageType>,
    pub(crate) target_frameworks: Vec<String>,
}
impl Children {
    pub(crate) fn collect(
        dependencies: Vec<DependencyRow>,
        package_types: Vec<PackageTypeRow>,
        frameworks: Vec<FrameworkRow>,
    ) -> HashMap<i64, Self> {
        let mut map: HashMap<i64, Self> = HashMap::new();
        for row in dependencies {
            map.entry(row.package_key).or_default().dependencies.push(row.into());
        }
        for row in package_types {
            map.entry(row.package_key).or_default().package_types.push(row.into());
        }
        for row in frameworks {
            map.entry(row.package_key).or_default().target_frameworks.push(row.moniker);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_groups_by_package() {
        let map = Children::collect(
            vec![
                DependencyRow {
                    package_key: 1,
                    target_framework: Some("net472".to_string()),
                    id: None,
                    version_range: None,
                },
                DependencyRow {
                    package_key: 2,
                    target_framework: None,
                    id: Some("Other".to_string()),
                    version_range: Some("[1.0.0, )".to_string()),
                },
            ],
            vec![PackageTypeRow {
                package_key: 1,
                name: "Dependency".to_string(),
                version: "0.0".to_string(),
            }],
            vec![
                FrameworkRow {
                    package_key: 1,
                    moniker: "net472".to_string(),
                },
                FrameworkRow {
                    package_key: 1,
                    moniker: "netstandard2.0".to_string(),
                },
            ],
        );
        let first = &map[&1];
        assert!(first.dependencies[0].is_empty_group_marker());
        assert_eq!(first.package_types, [PackageType::new("Dependency", "0.0")]);
        assert_eq!(first.target_frameworks, ["net472", "netstandard2.0"]);
        let second = &map[&2];
        assert_eq!(second.dependencies[0].id.as_deref(), Some("Other"));
        assert!(second.target_frameworks.is_empty());
    }
}
