use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::error::{ErrorKind, Result};
use crate::models::NuGetVersion;

/// A dependency version range in NuGet interval notation.
///
/// `1.0` is shorthand for `[1.0, )`; `[1.0]` pins an exact version. Floating
/// ranges (`1.*`) are not understood and fail to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    min: Option<NuGetVersion>,
    min_inclusive: bool,
    max: Option<NuGetVersion>,
    max_inclusive: bool,
}
impl VersionRange {
    /// Everything, as declared by a dependency without a `version` attribute.
    pub fn all() -> Self {
        Self {
            min: None,
            min_inclusive: false,
            max: None,
            max_inclusive: false,
        }
    }

    /// ```
    /// use burrow_package::models::VersionRange;
    /// assert_eq!(VersionRange::parse("1.0").unwrap().to_string(), "[1.0.0, )");
    /// assert_eq!(VersionRange::parse("[1.0,2.0)").unwrap().to_string(), "[1.0.0, 2.0.0)");
    /// assert_eq!(VersionRange::parse("(,3]").unwrap().to_string(), "(, 3.0.0]");
    /// assert_eq!(VersionRange::parse("[1.2.3]").unwrap().to_string(), "[1.2.3]");
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let invalid = || ErrorKind::InvalidField {
            field: "version range",
            value: input.to_string(),
        };
        let bound = |part: &str| -> Result<Option<NuGetVersion>> {
            match part.trim() {
                "" => Ok(None),
                version => NuGetVersion::parse(version).map(Some),
            }
        };

        let (Some(open), Some(close)) = (trimmed.chars().next(), trimmed.chars().last()) else {
            exn::bail!(invalid());
        };
        if !matches!(open, '[' | '(') {
            return Ok(Self {
                min: Some(NuGetVersion::parse(trimmed)?),
                min_inclusive: true,
                ..Self::all()
            });
        }
        if !matches!(close, ']' | ')') || trimmed.len() < 2 {
            exn::bail!(invalid());
        }
        let inner = &trimmed[1..trimmed.len() - 1];
        let (min_inclusive, max_inclusive) = (open == '[', close == ']');
        match inner.split_once(',') {
            Some((lower, upper)) => {
                let range = Self {
                    min: bound(lower)?,
                    min_inclusive,
                    max: bound(upper)?,
                    max_inclusive,
                };
                if let (Some(min), Some(max)) = (&range.min, &range.max)
                    && min > max
                {
                    exn::bail!(invalid());
                }
                Ok(range)
            },
            // `[1.0]` is an exact pin; `(1.0)` means nothing.
            None if min_inclusive && max_inclusive => {
                let exact = bound(inner)?.ok_or_else(|| exn::Exn::from(invalid()))?;
                Ok(Self {
                    min: Some(exact.clone()),
                    min_inclusive,
                    max: Some(exact),
                    max_inclusive,
                })
            },
            None => exn::bail!(invalid()),
        }
    }

    pub fn min(&self) -> Option<&NuGetVersion> {
        self.min.as_ref()
    }

    pub fn max(&self) -> Option<&NuGetVersion> {
        self.max.as_ref()
    }

    pub fn satisfies(&self, version: &NuGetVersion) -> bool {
        let above = match &self.min {
            Some(min) if self.min_inclusive => version >= min,
            Some(min) => version > min,
            None => true,
        };
        let below = match &self.max {
            Some(max) if self.max_inclusive => version <= max,
            Some(max) => version < max,
            None => true,
        };
        above && below
    }

    /// A range only SemVer 2.0.0 clients can read.
    pub fn is_semver2(&self) -> bool {
        self.min.iter().chain(self.max.iter()).any(NuGetVersion::is_semver2)
    }
}
impl Display for VersionRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let render = |version: &Option<NuGetVersion>| version.as_ref().map(NuGetVersion::to_normalized_string);
        if let (Some(min), Some(max)) = (&self.min, &self.max)
            && self.min_inclusive
            && self.max_inclusive
            && min == max
        {
            return write!(f, "[{}]", min.to_normalized_string());
        }
        write!(
            f,
            "{}{}, {}{}",
            if self.min_inclusive { '[' } else { '(' },
            render(&self.min).unwrap_or_default(),
            render(&self.max).unwrap_or_default(),
            if self.max_inclusive { ']' } else { ')' },
        )
    }
}
