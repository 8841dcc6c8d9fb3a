//! Static framework tables.

use crate::framework::{Family, Framework, FrameworkVersion};

const fn v(major: u32, minor: u32, build: u32) -> FrameworkVersion {
    FrameworkVersion::new(major, minor, build, 0)
}
const fn netfx(major: u32, minor: u32, build: u32) -> Framework {
    Framework::new(Family::NetFramework, v(major, minor, build))
}
const fn netstd(major: u32, minor: u32) -> Framework {
    Framework::new(Family::NetStandard, v(major, minor, 0))
}
const fn netcore(major: u32, minor: u32) -> Framework {
    Framework::new(Family::NetCoreApp, v(major, minor, 0))
}

/// Every framework the resolver is able to offer as a compatible target.
pub const KNOWN_FRAMEWORKS: &[Framework] = &[
    netfx(1, 1, 0),
    netfx(2, 0, 0),
    netfx(3, 5, 0),
    netfx(4, 0, 0),
    netfx(4, 0, 3),
    netfx(4, 5, 0),
    netfx(4, 5, 1),
    netfx(4, 5, 2),
    netfx(4, 6, 0),
    netfx(4, 6, 1),
    netfx(4, 6, 2),
    netfx(4, 6, 3),
    netfx(4, 7, 0),
    netfx(4, 7, 1),
    netfx(4, 7, 2),
    netfx(4, 8, 0),
    netfx(4, 8, 1),
    netstd(1, 0),
    netstd(1, 1),
    netstd(1, 2),
    netstd(1, 3),
    netstd(1, 4),
    netstd(1, 5),
    netstd(1, 6),
    netstd(2, 0),
    netstd(2, 1),
    netcore(1, 0),
    netcore(1, 1),
    netcore(2, 0),
    netcore(2, 1),
    netcore(2, 2),
    netcore(3, 0),
    netcore(3, 1),
    netcore(5, 0),
    netcore(6, 0),
    netcore(7, 0),
    netcore(8, 0),
    netcore(9, 0),
];

/// A contiguous, closed range of versions inside one family. An absent
/// `max` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameworkRange {
    pub family: Family,
    pub min: FrameworkVersion,
    pub max: Option<FrameworkVersion>,
}
impl FrameworkRange {
    const fn at_least(family: Family, min: FrameworkVersion) -> Self {
        Self { family, min, max: None }
    }

    const fn up_to(family: Family, max: FrameworkVersion) -> Self {
        Self { family, min: v(0, 0, 0), max: Some(max) }
    }

    pub fn satisfies(&self, framework: &Framework) -> bool {
        framework.family == self.family
            && framework.version >= self.min
            && self.max.is_none_or(|max| framework.version <= max)
    }
}

/// One-way compatibility: a project targeting anything in `target` can
/// consume assets built for anything in `supported`.
#[derive(Debug, Clone, Copy)]
pub struct CompatibilityMapping {
    pub target: FrameworkRange,
    pub supported: FrameworkRange,
}

/// Rule shorthand: `family >= min` can consume `netstandard <= standard`.
const fn standard_rule(family: Family, min: FrameworkVersion, standard: FrameworkVersion) -> CompatibilityMapping {
    CompatibilityMapping {
        target: FrameworkRange::at_least(family, min),
        supported: FrameworkRange::up_to(Family::NetStandard, standard),
    }
}

pub const COMPATIBILITY_MAPPINGS: &[CompatibilityMapping] = &[
    standard_rule(Family::NetCoreApp, v(1, 0, 0), v(1, 6, 0)),
    standard_rule(Family::NetCoreApp, v(2, 0, 0), v(2, 0, 0)),
    standard_rule(Family::NetCoreApp, v(3, 0, 0), v(2, 1, 0)),
    standard_rule(Family::NetFramework, v(4, 5, 0), v(1, 1, 0)),
    standard_rule(Family::NetFramework, v(4, 5, 1), v(1, 2, 0)),
    standard_rule(Family::NetFramework, v(4, 6, 0), v(1, 3, 0)),
    standard_rule(Family::NetFramework, v(4, 6, 1), v(2, 0, 0)),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_frameworks_render_uniquely() {
        let mut names = KNOWN_FRAMEWORKS.iter().map(Framework::short_folder_name).collect::<Vec<_>>();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_known_frameworks_round_trip_through_parser() {
        for framework in KNOWN_FRAMEWORKS {
            let parsed = Framework::parse(&framework.short_folder_name()).unwrap();
            assert_eq!(&parsed, framework);
        }
    }

    #[test]
    fn test_range_bounds() {
        let range = FrameworkRange::up_to(Family::NetStandard, v(2, 0, 0));
        assert!(range.satisfies(&netstd(1, 0)));
        assert!(range.satisfies(&netstd(2, 0)));
        assert!(!range.satisfies(&netstd(2, 1)));
        assert!(!range.satisfies(&netcore(2, 0)));
    }
}
