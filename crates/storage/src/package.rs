//! Canonical blob layout for packages.
//!
//! Everything for one package version lives in a single directory:
//!
//! ```text
//! packages/{id}/{version}/{id}.{version}.nupkg
//! packages/{id}/{version}/{id}.nuspec
//! packages/{id}/{version}/readme
//! packages/{id}/{version}/icon
//! ```
//!
//! with `id` and `version` (the normalized version) lowercased.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use futures::TryStreamExt;
use tracing::{debug, error, instrument};

use crate::BackendHandle;
use crate::backend::BoxSyncRead;
use crate::error::{ErrorKind, Result};
use crate::models::{ContentType, PutResult};

const PACKAGES_ROOT: &str = "packages";

/// One of the blobs stored per package version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageAsset {
    Package,
    Manifest,
    Readme,
    Icon,
}
impl PackageAsset {
    pub const ALL: [PackageAsset; 4] = [Self::Package, Self::Manifest, Self::Readme, Self::Icon];

    pub fn content_type(&self) -> ContentType {
        match self {
            Self::Package => ContentType::OctetStream,
            Self::Manifest => ContentType::PlainText,
            Self::Readme => ContentType::Markdown,
            Self::Icon => ContentType::Image,
        }
    }

    /// Storage path of this asset for a package version.
    ///
    /// ```
    /// use std::path::Path;
    /// use burrow_storage::PackageAsset;
    /// assert_eq!(
    ///     PackageAsset::Package.path("Newtonsoft.Json", "13.0.3"),
    ///     Path::new("packages/newtonsoft.json/13.0.3/newtonsoft.json.13.0.3.nupkg"),
    /// );
    /// assert_eq!(
    ///     PackageAsset::Manifest.path("Demo", "1.0.0-Beta"),
    ///     Path::new("packages/demo/1.0.0-beta/demo.nuspec"),
    /// );
    /// ```
    pub fn path(&self, id: &str, version: &str) -> PathBuf {
        let id = id.to_lowercase();
        let version = version.to_lowercase();
        let file_name = match self {
            Self::Package => format!("{id}.{version}.nupkg"),
            Self::Manifest => format!("{id}.nuspec"),
            Self::Readme => "readme".to_string(),
            Self::Icon => "icon".to_string(),
        };
        [PACKAGES_ROOT, &id, &version, &file_name].iter().collect()
    }
}

/// Content sources for the blobs of one package version, ready to be
/// streamed into storage.
pub struct PackageBlobs {
    pub package: BoxSyncRead,
    pub manifest: BoxSyncRead,
    pub readme: Option<BoxSyncRead>,
    pub icon: Option<BoxSyncRead>,
}
impl PackageBlobs {
    fn into_assets(self) -> impl Iterator<Item = (PackageAsset, BoxSyncRead)> {
        [
            (PackageAsset::Package, Some(self.package)),
            (PackageAsset::Manifest, Some(self.manifest)),
            (PackageAsset::Readme, self.readme),
            (PackageAsset::Icon, self.icon),
        ]
        .into_iter()
        .filter_map(|(asset, data)| data.map(|data| (asset, data)))
    }
}

/// Package-shaped view over a [`StorageBackend`](crate::StorageBackend).
#[derive(Clone)]
pub struct PackageStorage {
    backend: BackendHandle,
}
impl PackageStorage {
    pub fn new(backend: BackendHandle) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &BackendHandle {
        &self.backend
    }

    /// Store every blob of a package version.
    ///
    /// Blobs already stored with identical content are left as they are.
    /// Different content at any canonical path is a
    /// [`Conflict`](ErrorKind::Conflict): stored blobs are immutable, so the
    /// caller has to delete the version first to replace it.
    #[instrument(skip(self, blobs), fields(backend = self.backend.name()))]
    pub async fn save(&self, id: &str, version: &str, blobs: PackageBlobs) -> Result<()> {
        for (asset, data) in blobs.into_assets() {
            let path = asset.path(id, version);
            match self.backend.put(&path, data, asset.content_type()).await? {
                PutResult::Success => debug!(path = %path.display(), "stored package blob"),
                PutResult::AlreadyExists => debug!(path = %path.display(), "package blob already stored"),
                PutResult::Conflict => {
                    error!(path = %path.display(), "stored package blob differs from upload");
                    exn::bail!(ErrorKind::Conflict(path));
                },
            }
        }
        Ok(())
    }

    pub async fn read(&self, id: &str, version: &str, asset: PackageAsset) -> Result<Vec<u8>> {
        self.backend.read(&asset.path(id, version)).await
    }

    pub async fn reader(&self, id: &str, version: &str, asset: PackageAsset) -> Result<BoxSyncRead> {
        self.backend.reader(&asset.path(id, version)).await
    }

    /// Remove every blob of a package version, whether or not it exists.
    #[instrument(skip(self), fields(backend = self.backend.name()))]
    pub async fn delete(&self, id: &str, version: &str) -> Result<()> {
        for asset in PackageAsset::ALL {
            self.backend.delete(&asset.path(id, version)).await?;
        }
        Ok(())
    }

    /// Every `(id, version)` directory holding at least one blob, both
    /// lowercased as they appear on disk.
    pub async fn stored_coordinates(&self) -> Result<BTreeSet<(String, String)>> {
        let root = Path::new(PACKAGES_ROOT);
        self.backend
            .list_stream(Some(root))
            .try_fold(BTreeSet::new(), |mut found, info| async move {
                if let Some(coordinates) = Self::coordinates_of(&info.path) {
                    found.insert(coordinates);
                }
                Ok(found)
            })
            .await
    }

    fn coordinates_of(path: &Path) -> Option<(String, String)> {
        let mut components = path.components().filter_map(|component| match component {
            Component::Normal(segment) => segment.to_str(),
            _ => None,
        });
        if components.next()? != PACKAGES_ROOT {
            return None;
        }
        let id = components.next()?.to_string();
        let version = components.next()?.to_string();
        // Require a file below the version directory.
        components.next()?;
        Some((id, version))
    }
}
