//! Reading `.nupkg` archives.

use std::collections::BTreeSet;
use std::io::{Cursor, Read, Write};
use std::sync::Arc;

use burrow_frameworks::{ANY_FRAMEWORK, normalize_moniker};
use exn::ResultExt;
use tracing::{debug, instrument};
use zip::ZipArchive;

use crate::consts::{MAX_ASSET_SIZE, MAX_MANIFEST_SIZE, MAX_TARGET_FRAMEWORK_LENGTH};
use crate::error::{ErrorKind, Result};
use crate::manifest::Manifest;
use crate::models::Package;

/// Top-level archive folders whose second path segment is a framework.
const FRAMEWORK_FOLDERS: &[&str] = &["lib", "ref", "build", "buildtransitive", "tools"];

/// An uploaded package held in memory.
///
/// Cloning is cheap: the archive bytes and the zip central directory are
/// shared, so a clone can be moved onto a blocking task to extract one entry
/// while other clones extract others.
#[derive(Clone, Debug)]
pub struct PackageArchive {
    zip: ZipArchive<Cursor<Arc<[u8]>>>,
    manifest_entry: String,
    manifest: Manifest,
    target_frameworks: BTreeSet<String>,
}
impl PackageArchive {
    /// Open an archive and read its manifest.
    ///
    /// Fails if the bytes are not a zip file, there is not exactly one
    /// `.nuspec` at the archive root, or the manifest is invalid.
    #[instrument(skip(bytes))]
    pub fn open(bytes: impl Into<Arc<[u8]>>) -> Result<Self> {
        let bytes = bytes.into();
        debug!(size = bytes.len(), "opening package archive");
        let mut zip =
            ZipArchive::new(Cursor::new(bytes)).map_err(|e| ErrorKind::InvalidArchive(e.to_string()))?;
        let mut manifests = zip
            .file_names()
            .filter(|name| !name.contains('/') && name.to_ascii_lowercase().ends_with(".nuspec"))
            .map(str::to_string)
            .collect::<Vec<_>>();
        let manifest_entry = match manifests.len() {
            0 => exn::bail!(ErrorKind::MissingManifest),
            1 => manifests.remove(0),
            _ => exn::bail!(ErrorKind::MalformedManifest("more than one .nuspec at archive root".into())),
        };
        let xml = {
            let entry = zip.by_name(&manifest_entry).map_err(|e| ErrorKind::InvalidArchive(e.to_string()))?;
            let mut xml = String::new();
            entry
                .take(MAX_MANIFEST_SIZE + 1)
                .read_to_string(&mut xml)
                .or_raise(|| ErrorKind::MalformedManifest("not valid UTF-8".into()))?;
            if xml.len() as u64 > MAX_MANIFEST_SIZE {
                exn::bail!(ErrorKind::EntryTooLarge {
                    entry: manifest_entry,
                    limit: MAX_MANIFEST_SIZE,
                });
            }
            xml
        };
        // Skip a UTF-8 byte order mark; some packers write one.
        let manifest = Manifest::parse(xml.trim_start_matches('\u{feff}'))?;

        let mut target_frameworks = BTreeSet::new();
        let declared = manifest.dependency_frameworks().map(String::from);
        for framework in zip.file_names().filter_map(asset_framework).chain(declared) {
            if framework.chars().count() > MAX_TARGET_FRAMEWORK_LENGTH {
                exn::bail!(ErrorKind::InvalidField {
                    field: "target framework",
                    value: framework,
                });
            }
            target_frameworks.insert(framework);
        }
        if target_frameworks.is_empty() {
            // Nothing framework specific, so usable from anywhere.
            target_frameworks.insert(ANY_FRAMEWORK.to_string());
        }
        Ok(Self {
            zip,
            manifest_entry,
            manifest,
            target_frameworks,
        })
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Frameworks this package supports, from its asset folders and
    /// dependency groups.
    pub fn target_frameworks(&self) -> &BTreeSet<String> {
        &self.target_frameworks
    }

    /// The package record described by this archive.
    pub fn descriptor(&self) -> Package {
        self.manifest.clone().into_package(self.target_frameworks.clone())
    }

    /// Copy the `.nuspec` into `writer`, returning the number of bytes written.
    pub fn extract_manifest(&self, writer: &mut impl Write) -> Result<u64> {
        self.copy_entry(&self.manifest_entry, MAX_MANIFEST_SIZE, writer)
    }

    /// Copy the embedded readme into `writer`.
    pub fn extract_readme(&self, writer: &mut impl Write) -> Result<u64> {
        match &self.manifest.readme {
            Some(path) => self.copy_entry(path, MAX_ASSET_SIZE, writer),
            None => exn::bail!(ErrorKind::MissingField("readme")),
        }
    }

    /// Copy the embedded icon into `writer`.
    pub fn extract_icon(&self, writer: &mut impl Write) -> Result<u64> {
        match &self.manifest.icon {
            Some(path) => self.copy_entry(path, MAX_ASSET_SIZE, writer),
            None => exn::bail!(ErrorKind::MissingField("icon")),
        }
    }

    /// Copy at most `limit` decompressed bytes of an entry. The declared
    /// size is not trusted; the copy stops one byte past the limit.
    fn copy_entry(&self, name: &str, limit: u64, writer: &mut impl Write) -> Result<u64> {
        let mut zip = self.zip.clone();
        // Entry names are matched case-insensitively, like the client does.
        let entry_name = zip
            .file_names()
            .find(|candidate| candidate.eq_ignore_ascii_case(name))
            .map(str::to_string)
            .ok_or_else(|| exn::Exn::from(ErrorKind::MissingEntry(name.to_string())))?;
        let entry = zip.by_name(&entry_name).map_err(|e| ErrorKind::InvalidArchive(e.to_string()))?;
        let too_large = || ErrorKind::EntryTooLarge { entry: entry_name.clone(), limit };
        if entry.size() > limit {
            exn::bail!(too_large());
        }
        let copied = std::io::copy(&mut entry.take(limit + 1), writer)
            .or_raise(|| ErrorKind::Extraction(entry_name.clone()))?;
        if copied > limit {
            exn::bail!(too_large());
        }
        Ok(copied)
    }
}

/// Framework of an asset entry such as `lib/net472/Foo.dll`. Files directly
/// under `lib/`, and content files, are for [`ANY_FRAMEWORK`].
fn asset_framework(entry: &str) -> Option<String> {
    let segments = entry.split('/').collect::<Vec<_>>();
    let folder = segments.first()?.to_ascii_lowercase();
    let file = segments.last()?;
    if segments.len() < 2 || file.is_empty() {
        return None;
    }
    match segments.as_slice() {
        [_, _] if folder == "lib" => return Some(ANY_FRAMEWORK.to_string()),
        _ if folder == "content" => return Some(ANY_FRAMEWORK.to_string()),
        _ => {},
    }
    let framework = segments[1];
    if segments.len() < 3 || framework.is_empty() || !FRAMEWORK_FOLDERS.contains(&folder.as_str()) {
        return None;
    }
    // Packers escape `+` in entry names (`portable-net45%2Bwin8`).
    Some(normalize_moniker(&framework.replace("%2B", "+").replace("%2b", "+")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::NupkgBuilder;
    use rstest::rstest;

    #[rstest]
    #[case("lib/net472/Demo.dll", Some("net472"))]
    #[case("lib/netstandard2.0/sub/Demo.xml", Some("netstandard2.0"))]
    #[case("ref/.NETStandard2.1/Demo.dll", Some("netstandard2.1"))]
    #[case("buildTransitive/net8.0/Demo.targets", Some("net8.0"))]
    #[case("lib/portable-net45%2Bwin8/Demo.dll", Some("portable-net45+win8"))]
    #[case("lib/Demo.dll", Some("any"))]
    #[case("lib/net472/", None)]
    #[case("content/net472/readme.txt", Some("any"))]
    #[case("content/scripts/site.js", Some("any"))]
    #[case("tools/install.ps1", None)]
    #[case("Demo.nuspec", None)]
    fn test_asset_framework(#[case] entry: &str, #[case] expected: Option<&str>) {
        assert_eq!(asset_framework(entry).as_deref(), expected);
    }

    #[test]
    fn test_open_and_describe() {
        let bytes = NupkgBuilder::new("Demo", "1.0.0")
            .readme(b"# Demo")
            .file("lib/net472/Demo.dll", b"MZ")
            .metadata(r#"<dependencies><group targetFramework=".NETStandard2.0"/></dependencies>"#)
            .build();
        let archive = PackageArchive::open(bytes).unwrap();
        let package = archive.descriptor();
        assert_eq!(package.id, "Demo");
        assert_eq!(package.normalized_version(), "1.0.0");
        assert!(package.has_readme);
        assert!(!package.has_embedded_icon);
        assert_eq!(package.target_frameworks, ["net472", "netstandard2.0"]);
    }

    #[test]
    fn test_framework_less_package_supports_any() {
        let archive = PackageArchive::open(NupkgBuilder::new("Demo", "1.0.0").build()).unwrap();
        assert_eq!(archive.descriptor().target_frameworks, ["any"]);
        let bytes = NupkgBuilder::new("Demo", "1.0.0").file("lib/Demo.dll", b"MZ").file("lib/net8.0/Demo.dll", b"MZ");
        let archive = PackageArchive::open(bytes.build()).unwrap();
        assert_eq!(archive.descriptor().target_frameworks, ["any", "net8.0"]);
    }

    #[test]
    fn test_extract_entries() {
        let builder = NupkgBuilder::new("Demo", "1.0.0").readme(b"# Demo").icon(b"\x89PNG");
        let archive = PackageArchive::open(builder.build()).unwrap();
        let mut manifest = Vec::new();
        archive.extract_manifest(&mut manifest).unwrap();
        assert_eq!(String::from_utf8(manifest).unwrap(), builder.nuspec());
        let mut readme = Vec::new();
        assert_eq!(archive.extract_readme(&mut readme).unwrap(), 6);
        assert_eq!(readme, b"# Demo");
        let mut icon = Vec::new();
        archive.clone().extract_icon(&mut icon).unwrap();
        assert_eq!(icon, b"\x89PNG");
    }

    #[test]
    fn test_declared_readme_missing_from_archive() {
        let bytes = NupkgBuilder::new("Demo", "1.0.0").metadata("<readme>README.md</readme>").build();
        let archive = PackageArchive::open(bytes).unwrap();
        let err = archive.extract_readme(&mut Vec::<u8>::new()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MissingEntry(_)));
    }

    #[test]
    fn test_undeclared_icon() {
        let archive = PackageArchive::open(NupkgBuilder::new("Demo", "1.0.0").build()).unwrap();
        assert!(archive.extract_icon(&mut Vec::<u8>::new()).is_err());
    }

    #[test]
    fn test_oversized_manifest() {
        let description = "a".repeat(MAX_MANIFEST_SIZE as usize);
        let bytes = NupkgBuilder::new("Demo", "1.0.0").description(description).build();
        let err = PackageArchive::open(bytes).unwrap_err();
        assert_eq!(*err, ErrorKind::EntryTooLarge { entry: "Demo.nuspec".to_string(), limit: MAX_MANIFEST_SIZE });
    }

    #[test]
    fn test_oversized_asset_stops_at_limit() {
        let readme = vec![0; MAX_ASSET_SIZE as usize + 1];
        let archive = PackageArchive::open(NupkgBuilder::new("Demo", "1.0.0").readme(readme).build()).unwrap();
        let mut sink = Vec::new();
        let err = archive.extract_readme(&mut sink).unwrap_err();
        assert!(matches!(&*err, ErrorKind::EntryTooLarge { limit: MAX_ASSET_SIZE, .. }));
        assert!(sink.len() as u64 <= MAX_ASSET_SIZE + 1);
    }

    #[test]
    fn test_not_a_zip() {
        let err = PackageArchive::open(b"definitely not a zip".to_vec()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidArchive(_)));
    }

    #[test]
    fn test_missing_manifest() {
        let bytes = NupkgBuilder::new("Demo", "1.0.0").without_manifest().build();
        let err = PackageArchive::open(bytes).unwrap_err();
        assert_eq!(*err, ErrorKind::MissingManifest);
    }
}
