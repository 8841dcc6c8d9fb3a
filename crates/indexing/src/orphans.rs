//! Orphaned blobs: stored package directories without a catalog record.
//!
//! They are left behind when an upload fails between writing content and
//! committing metadata, or loses the commit race to a concurrent upload of
//! the same version. Nothing removes them automatically; this report lists
//! them so an operator can.

use crate::error::{ErrorKind, Result};
use async_stream::stream;
use burrow_catalog::Repository;
use burrow_storage::PackageStorage;
use exn::ResultExt;
use futures::Stream;
use tracing::warn;

/// Events emitted by [`orphans`], in order: [`Started`](Self::Started) once,
/// [`Orphan`](Self::Orphan) per orphaned version (sorted by id, then
/// version), then [`Complete`](Self::Complete) with the number found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrphanEvent {
    Started,
    /// Lowercased id and normalized version, as laid out in storage.
    Orphan { id: String, version: String },
    Complete(u64),
}

pub fn orphans<'a>(
    storage: &'a PackageStorage,
    catalog: &'a Repository,
) -> impl Stream<Item = Result<OrphanEvent>> + 'a {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        yield Ok(OrphanEvent::Started);

        let stored = match storage.stored_coordinates().await.or_raise(|| ErrorKind::Storage) {
            Ok(stored) => stored,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        let known = match catalog.all_coordinates().await.or_raise(|| ErrorKind::Catalog) {
            Ok(known) => known,
            Err(e) => {
                yield Err(e);
                return;
            },
        };

        let mut found = 0;
        for (id, version) in stored.difference(&known) {
            warn!(%id, %version, "found orphaned package blobs");
            found += 1;
            yield Ok(OrphanEvent::Orphan { id: id.clone(), version: version.clone() });
        }

        yield Ok(OrphanEvent::Complete(found));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Indexer;
    use burrow_catalog::Database;
    use burrow_package::testing::NupkgBuilder;
    use burrow_storage::backend::MockBackend;
    use futures::TryStreamExt;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_reports_blobs_without_records() {
        let backend = MockBackend::with_files([
            ("packages/demo/2.0.0/demo.2.0.0.nupkg", b"zip".to_vec()),
            ("packages/other/1.0.0-beta/other.nuspec", b"<package/>".to_vec()),
        ]);
        let storage = PackageStorage::new(Arc::new(backend));
        let db = Database::connect_in_memory().await.unwrap();
        let catalog = Repository::from(&db);
        let indexer = Indexer::new(storage.clone(), catalog.clone(), false);
        indexer.index(NupkgBuilder::new("Demo", "1.0.0").build()).await.unwrap();

        let events = orphans(&storage, &catalog).try_collect::<Vec<_>>().await.unwrap();
        assert_eq!(
            events,
            [
                OrphanEvent::Started,
                OrphanEvent::Orphan { id: "demo".to_string(), version: "2.0.0".to_string() },
                OrphanEvent::Orphan { id: "other".to_string(), version: "1.0.0-beta".to_string() },
                OrphanEvent::Complete(2),
            ]
        );
    }
}
