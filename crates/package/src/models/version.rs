use std::cmp::Ordering;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use exn::{OptionExt, ResultExt};

use crate::consts::VERSION_REGEX;
use crate::error::{Error, ErrorKind, Result};

/// A NuGet package version.
///
/// Up to four numeric components, optional dot-separated release labels and
/// optional build metadata. Equality and ordering follow NuGet precedence:
/// metadata and the original spelling are ignored, labels compare
/// case-insensitively, numeric labels sort before alphanumeric ones and a
/// release version sorts after all of its prereleases.
///
/// Numeric labels are stored without leading zeros, so two versions are equal
/// exactly when their [`to_lower_normalized`](Self::to_lower_normalized)
/// strings are.
#[derive(Debug, Clone)]
pub struct NuGetVersion {
    major: u64,
    minor: u64,
    patch: u64,
    revision: u64,
    release_labels: Vec<String>,
    metadata: Option<String>,
    original: String,
}
impl NuGetVersion {
    /// ```
    /// use burrow_package::models::NuGetVersion;
    /// let version = NuGetVersion::parse("1.0.0.0-Beta.1+sha.5114f85").unwrap();
    /// assert_eq!(version.to_normalized_string(), "1.0.0-Beta.1");
    /// assert_eq!(version.to_full_string(), "1.0.0-Beta.1+sha.5114f85");
    /// assert_eq!(version.original(), "1.0.0.0-Beta.1+sha.5114f85");
    /// assert!(version.is_prerelease());
    /// assert!(version.is_semver2());
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || ErrorKind::InvalidField {
            field: "version",
            value: input.to_string(),
        };
        let trimmed = input.trim();
        let captures = VERSION_REGEX.captures(trimmed).ok_or_raise(invalid)?;
        let numbers = captures.name("numbers").ok_or_raise(invalid)?.as_str();
        let mut parts = [0u64; 4];
        for (slot, part) in parts.iter_mut().zip(numbers.split('.')) {
            *slot = part.parse::<u64>().or_raise(invalid)?;
        }
        Ok(Self {
            major: parts[0],
            minor: parts[1],
            patch: parts[2],
            revision: parts[3],
            release_labels: captures
                .name("release")
                .map(|labels| labels.as_str().split('.').map(normalize_label).collect())
                .unwrap_or_default(),
            metadata: captures.name("metadata").map(|m| m.as_str().to_string()),
            original: trimmed.to_string(),
        })
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn patch(&self) -> u64 {
        self.patch
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn release_labels(&self) -> &[String] {
        &self.release_labels
    }

    pub fn metadata(&self) -> Option<&str> {
        self.metadata.as_deref()
    }

    /// The string this version was parsed from.
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn is_prerelease(&self) -> bool {
        !self.release_labels.is_empty()
    }

    /// Dotted release labels and build metadata only exist in SemVer 2.0.0;
    /// older clients cannot see such versions.
    pub fn is_semver2(&self) -> bool {
        self.release_labels.len() > 1 || self.metadata.is_some()
    }

    /// Three numeric components (four when the revision is set) and release
    /// labels, without metadata. Case is preserved.
    pub fn to_normalized_string(&self) -> String {
        let mut normalized = format!("{}.{}.{}", self.major, self.minor, self.patch);
        if self.revision > 0 {
            normalized.push_str(&format!(".{}", self.revision));
        }
        if self.is_prerelease() {
            normalized.push('-');
            normalized.push_str(&self.release_labels.join("."));
        }
        normalized
    }

    /// The normalized form used as the identity of a version everywhere it is
    /// stored or compared as a string.
    pub fn to_lower_normalized(&self) -> String {
        self.to_normalized_string().to_lowercase()
    }

    /// Normalized string plus build metadata.
    pub fn to_full_string(&self) -> String {
        match &self.metadata {
            Some(metadata) => format!("{}+{metadata}", self.to_normalized_string()),
            None => self.to_normalized_string(),
        }
    }
}

/// `007` becomes `7`. Labels too long for a `u64` stay alphanumeric.
fn normalize_label(label: &str) -> String {
    match label.parse::<u64>() {
        Ok(number) => number.to_string(),
        Err(_) => label.to_string(),
    }
}

fn compare_label(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase()),
    }
}

fn compare_release(a: &[String], b: &[String]) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a
            .iter()
            .zip(b)
            .map(|(a, b)| compare_label(a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| a.len().cmp(&b.len())),
    }
}

impl Ord for NuGetVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch, self.revision)
            .cmp(&(other.major, other.minor, other.patch, other.revision))
            .then_with(|| compare_release(&self.release_labels, &other.release_labels))
    }
}
impl PartialOrd for NuGetVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl PartialEq for NuGetVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}
impl Eq for NuGetVersion {}
impl Hash for NuGetVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_lower_normalized().hash(state);
    }
}
impl Display for NuGetVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.to_full_string())
    }
}
impl FromStr for NuGetVersion {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
impl TryFrom<&str> for NuGetVersion {
    type Error = Error;
    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}
