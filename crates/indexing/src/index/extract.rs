use crate::error::{ErrorKind, Result};
use burrow_package::PackageArchive;
use burrow_package::models::Package;
use burrow_storage::backend::BoxSyncRead;
use exn::ResultExt;
use std::io::Seek;
use std::sync::Arc;
use tempfile::SpooledTempFile;
use tracing::trace;

/// Entries larger than this spill from memory to an anonymous temporary file.
const SPOOL_THRESHOLD: usize = 1024 * 1024;

/// One archive entry extracted into a temporary buffer.
///
/// The buffer belongs to this value: dropping it (including when the
/// surrounding future is dropped) releases the memory or the temporary file.
pub(crate) struct Spool(SpooledTempFile);

impl Spool {
    fn fill(extract: impl FnOnce(&mut SpooledTempFile) -> burrow_package::error::Result<u64>) -> Result<Self> {
        let mut file = SpooledTempFile::new(SPOOL_THRESHOLD);
        let written = extract(&mut file).or_raise(|| ErrorKind::Extraction)?;
        trace!(written, spilled = file.is_rolled(), "buffered archive entry");
        Ok(Self(file))
    }

    /// Rewind the buffer and hand it over as a reader for storage. The
    /// buffer, and any file it spilled to, lives until the reader is dropped.
    pub(crate) fn into_reader(mut self) -> Result<BoxSyncRead> {
        self.0.rewind().or_raise(|| ErrorKind::Extraction)?;
        Ok(Box::new(self.0))
    }
}

/// The descriptor of an uploaded archive plus its buffered entries.
pub(crate) struct Extracted {
    pub(crate) package: Package,
    pub(crate) manifest: Spool,
    pub(crate) readme: Option<Spool>,
    pub(crate) icon: Option<Spool>,
}

/// Open the archive and buffer the manifest, plus the readme and icon when
/// the descriptor declares them. Each entry is extracted on its own blocking
/// task; the first failure wins and the remaining buffers are dropped.
pub(crate) async fn extract(bytes: Arc<[u8]>) -> Result<Extracted> {
    let archive = blocking(move || PackageArchive::open(bytes).or_raise(|| ErrorKind::Extraction)).await?;
    let package = archive.descriptor();

    let manifest = {
        let archive = archive.clone();
        blocking(move || Spool::fill(|buffer| archive.extract_manifest(buffer)))
    };
    let readme = optional(package.has_readme, {
        let archive = archive.clone();
        move || Spool::fill(|buffer| archive.extract_readme(buffer))
    });
    let icon = optional(package.has_embedded_icon, move || Spool::fill(|buffer| archive.extract_icon(buffer)));

    let (manifest, readme, icon) = futures::try_join!(manifest, readme, icon)?;
    Ok(Extracted { package, manifest, readme, icon })
}

async fn optional(wanted: bool, task: impl FnOnce() -> Result<Spool> + Send + 'static) -> Result<Option<Spool>> {
    if !wanted {
        return Ok(None);
    }
    blocking(task).await.map(Some)
}

/// Run `task` on the blocking thread pool.
pub(crate) async fn blocking<T>(task: impl FnOnce() -> Result<T> + Send + 'static) -> Result<T>
where
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task).await.or_raise(|| ErrorKind::Task)?
}
