//! In-memory storage backend for tests.

use super::{BoxSyncRead, FileInfoStream, blocking, compare_digests, copy_hashed, from_bytes};
use crate::StorageBackend;
use crate::error::{ErrorKind, Result};
use crate::file::FileInfo;
use crate::models::{ContentType, PutResult};
use crate::path::validate as validate_path;
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::Mutex;

struct Blob {
    data: Arc<[u8]>,
    digest: blake3::Hash,
    content_type: ContentType,
    stored: OffsetDateTime,
}
impl Blob {
    fn new(data: Arc<[u8]>, content_type: ContentType) -> Self {
        Self {
            digest: blake3::hash(&data),
            data,
            content_type,
            stored: OffsetDateTime::now_utc(),
        }
    }

    fn info(&self, path: &Path) -> FileInfo {
        FileInfo::new(path, self.data.len() as u64, self.stored, self.content_type)
    }
}

/// Blob store held in a sorted map, so listings come back in path order.
///
/// Content is buffered completely before it is inserted, which makes every
/// `put` atomic like the local backend's.
///
/// ```
/// use burrow_storage::backend::{MockBackend, StorageBackend};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files([("packages/demo/1.0.0/readme", b"# Demo")]);
/// assert!(backend.exists(Path::new("packages/demo/1.0.0/readme")).await?);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct MockBackend {
    blobs: Mutex<BTreeMap<PathBuf, Blob>>,
}

impl MockBackend {
    /// Pre-populate the store. Content types are inferred from file names.
    ///
    /// Panics on a path that fails validation.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let blobs = files
            .into_iter()
            .map(|(path, data)| {
                let path = path.into();
                let Ok(path) = validate_path(&path) else {
                    panic!("MockBackend::with_files: invalid path {}", path.display());
                };
                let content_type = ContentType::from_path(&path);
                let data: Vec<u8> = data.into();
                (path, Blob::new(data.into(), content_type))
            })
            .collect();
        Self { blobs: Mutex::new(blobs) }
    }

    /// Number of stored blobs.
    pub async fn len(&self) -> usize {
        self.blobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.lock().await.is_empty()
    }

    async fn blob<T>(&self, path: &Path, view: impl FnOnce(&Path, &Blob) -> T) -> Result<T> {
        let path = validate_path(path)?;
        let blobs = self.blobs.lock().await;
        match blobs.get(&path) {
            Some(blob) => Ok(view(&path, blob)),
            None => exn::bail!(ErrorKind::NotFound(path)),
        }
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a> {
        stream::once(async move {
            let prefix = prefix.map(validate_path).transpose()?;
            let blobs = self.blobs.lock().await;
            let listed = blobs
                .iter()
                .filter(|(path, _)| prefix.as_ref().is_none_or(|prefix| path.starts_with(prefix)))
                .map(|(path, blob)| Ok(blob.info(path)))
                .collect::<Vec<_>>();
            Ok::<_, crate::error::Error>(stream::iter(listed))
        })
        .try_flatten()
        .boxed()
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let path = validate_path(path)?;
        Ok(self.blobs.lock().await.contains_key(&path))
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.blob(path, |_, blob| blob.data.to_vec()).await
    }

    async fn reader(&self, path: &Path) -> Result<BoxSyncRead> {
        self.blob(path, |_, blob| from_bytes(blob.data.clone())).await
    }

    async fn put(&self, path: &Path, data: BoxSyncRead, content_type: ContentType) -> Result<PutResult> {
        let path = validate_path(path)?;
        let content = blocking("buffer", move || {
            let mut content = Vec::new();
            copy_hashed(data, &mut content).map_err(ErrorKind::Io)?;
            Ok(content)
        })
        .await?;
        let incoming = Blob::new(content.into(), content_type);
        let mut blobs = self.blobs.lock().await;
        if let Some(existing) = blobs.get(&path) {
            return Ok(compare_digests(&path, existing.digest, incoming.digest));
        }
        blobs.insert(path, incoming);
        Ok(PutResult::Success)
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let path = validate_path(path)?;
        self.blobs.lock().await.remove(&path);
        Ok(())
    }

    async fn stat(&self, path: &Path) -> Result<FileInfo> {
        self.blob(path, |path, blob| blob.info(path)).await
    }

    async fn digest(&self, path: &Path) -> Result<blake3::Hash> {
        self.blob(path, |_, blob| blob.digest).await
    }
}
