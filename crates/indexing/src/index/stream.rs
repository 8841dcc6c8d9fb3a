use crate::MAX_PROCESS_CONCURRENCY;
use crate::error::{ErrorKind, Result};
use crate::index::{IndexResult, Indexer};
use async_stream::stream;
use exn::ResultExt;
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use std::path::PathBuf;

/// Progress events emitted by [`index_files`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started), exactly once, with the number of uploads.
/// 2. [`Indexed`](Self::Indexed), zero or more times, one per upload in
///    completion order.
/// 3. [`Complete`](Self::Complete), exactly once.
#[derive(Debug)]
pub enum IndexEvent {
    Started(u64),
    Indexed { path: PathBuf, result: IndexResult },
    Complete,
}

/// Streams [`IndexEvent`]s while indexing every file in `paths`, up to
/// `MAX_PROCESS_CONCURRENCY` at a time.
///
/// A failing upload is surfaced as an `Err` item without terminating the
/// stream.
pub fn index_files<'a>(indexer: &'a Indexer, paths: Vec<PathBuf>) -> impl Stream<Item = Result<IndexEvent>> + 'a {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        // Infallible: a usize (either 32- or 64-bit) will always fit in a u64.
        yield Ok(IndexEvent::Started(u64::try_from(paths.len()).unwrap_or(0)));

        let mut futures: Vec<_> = paths.into_iter().map(|path| index_file(indexer, path)).collect();
        let mut processing = FuturesUnordered::new();
        processing.extend(futures.drain(..MAX_PROCESS_CONCURRENCY.min(futures.len())));
        while let Some(result) = processing.next().await {
            yield result;
            // Pop-n-push, but FIFO instead of LIFO.
            if !futures.is_empty() {
                processing.push(futures.remove(0));
            }
        }

        yield Ok(IndexEvent::Complete);
    })
}

async fn index_file(indexer: &Indexer, path: PathBuf) -> Result<IndexEvent> {
    let bytes = tokio::fs::read(&path).await.or_raise(|| ErrorKind::Upload(path.clone()))?;
    let result = indexer.index(bytes).await?;
    Ok(IndexEvent::Indexed { path, result })
}
