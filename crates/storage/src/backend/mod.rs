//! Storage backend trait and implementations.
//!
//! Blobs are immutable once written: [`put`](StorageBackend::put) never
//! overwrites, and replacing content means deleting it first.

mod local;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::local::LocalBackend;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockBackend;
use crate::error::{ErrorKind, Result};
use crate::file::FileInfo;
use crate::models::{ContentType, PutResult};
use async_trait::async_trait;
use exn::ResultExt;
use futures::{Stream, TryStreamExt};
use std::io::{Cursor, ErrorKind as IoErrorKind, Read, Write};
use std::path::Path;
use std::pin::Pin;

pub type FileInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<FileInfo>> + Send + 'a>>;
pub type BoxSyncRead = Box<dyn Read + Send + 'static>;

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Wrap content that is already in memory for [`StorageBackend::put`].
pub fn from_bytes<T>(data: T) -> BoxSyncRead
where
    T: AsRef<[u8]> + Send + 'static,
{
    Box::new(Cursor::new(data))
}

/// Unified interface for blob storage.
///
/// # Path Handling
/// All paths are relative to the storage root and must be validated using
/// [`validate_path`](crate::validate_path) before use. Implementations
/// enforce this.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use burrow_storage::{ContentType, PutResult, backend::{StorageBackend, from_bytes}, error::Result};
///
/// async fn store_once(backend: &dyn StorageBackend, data: Vec<u8>) -> Result<bool> {
///     let path = Path::new("packages/demo/1.0.0/demo.1.0.0.nupkg");
///     Ok(match backend.put(path, from_bytes(data), ContentType::OctetStream).await? {
///         PutResult::Success | PutResult::AlreadyExists => true,
///         PutResult::Conflict => false,
///     })
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend, used for logging only.
    fn name(&self) -> &str;

    /// List all files matching an optional prefix.
    ///
    /// Collects [`list_stream()`](Self::list_stream) into a [`Vec`].
    async fn list(&self, prefix: Option<&Path>) -> Result<Vec<FileInfo>> {
        self.list_stream(prefix).try_collect().await
    }

    /// Stream file metadata matching an optional prefix.
    ///
    /// Prefix matching is component based: `packages/demo` matches
    /// `packages/demo/1.0.0/readme` but not `packages/demonstration/...`. A
    /// prefix that does not exist yields an empty stream.
    ///
    /// ```
    /// use futures::TryStreamExt;
    /// use std::path::Path;
    /// # use burrow_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// let mut stream = backend.list_stream(Some(Path::new("packages")));
    /// while let Some(info) = stream.try_next().await? {
    ///     println!("{}: {} bytes ({})", info.path.display(), info.size, info.content_type);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a>;

    /// Check if a file exists.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Read file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Open a file for streaming reads.
    ///
    /// Returns a `'static` boxed [`Read`](std::io::Read) suitable for use
    /// inside [`spawn_blocking`](tokio::task::spawn_blocking). Returns
    /// [`NotFound`](crate::error::ErrorKind::NotFound) if the file does not
    /// exist.
    async fn reader(&self, path: &Path) -> Result<BoxSyncRead>;

    /// Exclusively create a file, streaming its content from `data` on a
    /// blocking task.
    ///
    /// The file only becomes visible at `path` once all of `data` is stored:
    /// readers never see partial content, and a failed or abandoned write
    /// leaves nothing behind. If something is already stored at `path`, the
    /// digests of the stored and incoming content decide the outcome:
    /// [`PutResult::AlreadyExists`] when equal, [`PutResult::Conflict`]
    /// otherwise. Parent directories are created as needed.
    async fn put(&self, path: &Path, data: BoxSyncRead, content_type: ContentType) -> Result<PutResult>;

    /// Delete a file. Deleting something that is not there succeeds.
    async fn delete(&self, path: &Path) -> Result<()>;

    /// Get file metadata without reading contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn stat(&self, path: &Path) -> Result<FileInfo>;

    /// BLAKE3 digest of a stored file, hashed as it streams from
    /// [`reader()`](Self::reader).
    async fn digest(&self, path: &Path) -> Result<blake3::Hash> {
        let reader = self.reader(path).await?;
        blocking("digest", move || {
            let mut hasher = blake3::Hasher::new();
            hasher.update_reader(reader).map_err(ErrorKind::Io)?;
            Ok(hasher.finalize())
        })
        .await
    }
}

/// Run blocking file work off the async runtime.
pub(crate) async fn blocking<T>(task: &'static str, work: impl FnOnce() -> Result<T> + Send + 'static) -> Result<T>
where
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .or_raise(|| ErrorKind::BackendError(format!("{task} task panicked")))?
}

/// Copy `source` into `sink`, returning the BLAKE3 digest of what passed through.
pub(crate) fn copy_hashed(mut source: impl Read, sink: &mut impl Write) -> std::io::Result<blake3::Hash> {
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0; COPY_BUFFER_SIZE];
    loop {
        let read = match source.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == IoErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        hasher.update(&buffer[..read]);
        sink.write_all(&buffer[..read])?;
    }
    Ok(hasher.finalize())
}

/// Shared collision handling for [`StorageBackend::put`] implementations.
pub(crate) fn compare_digests(path: &Path, existing: blake3::Hash, incoming: blake3::Hash) -> PutResult {
    if existing == incoming {
        tracing::debug!(path = %path.display(), "identical content already stored");
        PutResult::AlreadyExists
    } else {
        tracing::warn!(path = %path.display(), "different content already stored");
        PutResult::Conflict
    }
}
