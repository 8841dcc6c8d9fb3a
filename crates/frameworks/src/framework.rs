//! Target framework identities.
//!
//! Monikers come in two textual shapes: the short folder names used inside
//! package archives (`net472`, `netstandard2.0`, `net8.0`) and the long
//! identifiers used by `.nuspec` dependency groups (`.NETFramework4.7.2`,
//! `.NETStandard,Version=v2.0`). Both parse into the same [`Framework`], which
//! renders back to the canonical short folder name.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use exn::ResultExt;

use crate::error::{Error, ErrorKind, Result};

/// Framework family (the "framework identifier").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Family {
    /// .NET Framework (`net45`, `net472`, ...)
    NetFramework,
    /// .NET Standard (`netstandard2.0`, ...)
    NetStandard,
    /// .NET Core and .NET 5+ (`netcoreapp3.1`, `net8.0`, ...)
    NetCoreApp,
}
impl Family {
    /// Long identifier as written in `.nuspec` files.
    pub fn identifier(&self) -> &'static str {
        match self {
            Family::NetFramework => ".NETFramework",
            Family::NetStandard => ".NETStandard",
            Family::NetCoreApp => ".NETCoreApp",
        }
    }
}
impl Display for Family {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.identifier())
    }
}

/// Four-part framework version. Field order gives the derived ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameworkVersion {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
    pub revision: u32,
}
impl FrameworkVersion {
    pub const fn new(major: u32, minor: u32, build: u32, revision: u32) -> Self {
        Self { major, minor, build, revision }
    }

    /// Parse a dotted version (`4.7.2`, `2.0`, `8`).
    fn parse_dotted(input: &str) -> Result<Self> {
        let parts = input.split('.').collect::<Vec<_>>();
        if parts.is_empty() || parts.len() > 4 {
            exn::bail!(ErrorKind::InvalidVersion(input.to_string()));
        }
        let mut numbers = [0u32; 4];
        for (slot, part) in numbers.iter_mut().zip(parts) {
            *slot = part.parse::<u32>().or_raise(|| ErrorKind::InvalidVersion(input.to_string()))?;
        }
        Ok(Self::new(numbers[0], numbers[1], numbers[2], numbers[3]))
    }

    /// Parse the compact .NET Framework form where every digit is one
    /// component (`472` is 4.7.2, `11` is 1.1).
    fn parse_compact(input: &str) -> Result<Self> {
        if input.is_empty() || input.len() > 4 || !input.bytes().all(|b| b.is_ascii_digit()) {
            exn::bail!(ErrorKind::InvalidVersion(input.to_string()));
        }
        let mut numbers = [0u32; 4];
        for (slot, digit) in numbers.iter_mut().zip(input.bytes()) {
            *slot = u32::from(digit - b'0');
        }
        Ok(Self::new(numbers[0], numbers[1], numbers[2], numbers[3]))
    }

    fn is_compactable(&self) -> bool {
        self.major < 10 && self.minor < 10 && self.build < 10 && self.revision < 10
    }
}
impl Display for FrameworkVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}.{}", self.major, self.minor)?;
        if self.build > 0 || self.revision > 0 {
            write!(f, ".{}", self.build)?;
        }
        if self.revision > 0 {
            write!(f, ".{}", self.revision)?;
        }
        Ok(())
    }
}

/// A resolved target framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Framework {
    pub family: Family,
    pub version: FrameworkVersion,
}
impl Framework {
    pub const fn new(family: Family, version: FrameworkVersion) -> Self {
        Self { family, version }
    }

    /// Parse either a short folder name or a long `.nuspec` identifier.
    ///
    /// Platform-qualified monikers (`net6.0-windows`) and portable profiles
    /// are not modelled and return [`ErrorKind::UnknownFramework`].
    ///
    /// ```
    /// use burrow_frameworks::{Family, Framework};
    /// let a = Framework::parse("net472").unwrap();
    /// let b = Framework::parse(".NETFramework,Version=v4.7.2").unwrap();
    /// assert_eq!(a, b);
    /// assert_eq!(a.family, Family::NetFramework);
    /// assert_eq!(b.short_folder_name(), "net472");
    /// ```
    pub fn parse(moniker: &str) -> Result<Self> {
        let lowered = moniker.trim().to_ascii_lowercase();
        let unknown = || ErrorKind::UnknownFramework(moniker.to_string());
        if lowered.contains('-') || lowered.contains('+') || lowered.is_empty() {
            exn::bail!(unknown());
        }
        match lowered.strip_prefix('.') {
            Some(long) => Self::parse_long(long).or_raise(unknown),
            None => Self::parse_short(&lowered).or_raise(unknown),
        }
    }

    fn parse_long(long: &str) -> Result<Self> {
        let (family, rest) = [
            ("netframework", Family::NetFramework),
            ("netstandard", Family::NetStandard),
            ("netcoreapp", Family::NetCoreApp),
        ]
        .into_iter()
        .find_map(|(prefix, family)| long.strip_prefix(prefix).map(|rest| (family, rest)))
        .ok_or_else(|| Error::from(ErrorKind::UnknownFramework(long.to_string())))?;
        let rest = rest.strip_prefix(",version=").unwrap_or(rest);
        let rest = rest.strip_prefix('v').unwrap_or(rest);
        Ok(Self::new(family, FrameworkVersion::parse_dotted(rest)?))
    }

    fn parse_short(short: &str) -> Result<Self> {
        if let Some(rest) = short.strip_prefix("netstandard") {
            return Ok(Self::new(Family::NetStandard, FrameworkVersion::parse_dotted(rest)?));
        }
        if let Some(rest) = short.strip_prefix("netcoreapp") {
            return Ok(Self::new(Family::NetCoreApp, FrameworkVersion::parse_dotted(rest)?));
        }
        let Some(rest) = short.strip_prefix("net") else {
            exn::bail!(ErrorKind::UnknownFramework(short.to_string()));
        };
        if rest.contains('.') {
            let version = FrameworkVersion::parse_dotted(rest)?;
            // `net5.0` and later are .NET Core releases under a new name.
            let family = if version.major >= 5 { Family::NetCoreApp } else { Family::NetFramework };
            return Ok(Self::new(family, version));
        }
        Ok(Self::new(Family::NetFramework, FrameworkVersion::parse_compact(rest)?))
    }

    /// Canonical short folder name, as used for stored monikers.
    pub fn short_folder_name(&self) -> String {
        let v = self.version;
        match self.family {
            Family::NetStandard => format!("netstandard{}.{}", v.major, v.minor),
            Family::NetCoreApp if v.major >= 5 => format!("net{}.{}", v.major, v.minor),
            Family::NetCoreApp => format!("netcoreapp{}.{}", v.major, v.minor),
            Family::NetFramework if v.is_compactable() => {
                let mut name = format!("net{}{}", v.major, v.minor);
                if v.build > 0 || v.revision > 0 {
                    name.push_str(&v.build.to_string());
                }
                if v.revision > 0 {
                    name.push_str(&v.revision.to_string());
                }
                name
            },
            Family::NetFramework => format!("net{v}"),
        }
    }
}
impl Display for Framework {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.short_folder_name())
    }
}
impl FromStr for Framework {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Normalise a moniker to its canonical short folder name, keeping the
/// lowercased input when it cannot be parsed.
///
/// ```
/// use burrow_frameworks::normalize_moniker;
/// assert_eq!(normalize_moniker(".NETStandard2.0"), "netstandard2.0");
/// assert_eq!(normalize_moniker("net6.0-windows7.0"), "net6.0-windows7.0");
/// ```
pub fn normalize_moniker(moniker: &str) -> String {
    match Framework::parse(moniker) {
        Ok(framework) => framework.short_folder_name(),
        Err(_) => moniker.trim().to_ascii_lowercase(),
    }
}
