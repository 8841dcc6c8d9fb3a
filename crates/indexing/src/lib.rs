//! Package ingestion and the services that read it back.
//!
//! [`Indexer`] turns uploads into stored blobs plus a catalog record. The
//! services project what was indexed into protocol documents and blob
//! streams:
//!
//! - [`ContentService`]: archives, manifests, readmes, icons, versions.
//! - [`MetadataService`]: registration index and leaf documents.
//! - [`SearchService`]: search, autocomplete and dependents.
//! - [`DeletionService`]: unlist, relist and hard delete.
//!
//! [`Registry`] wires all of them to one blob store and one catalog.

mod content;
mod deletion;
pub mod error;
mod index;
mod metadata;
mod orphans;
mod search;

pub use crate::content::ContentService;
pub use crate::deletion::{DeletionBehavior, DeletionService};
pub use crate::index::{IndexEvent, IndexResult, Indexer, index_files};
pub use crate::metadata::MetadataService;
pub use crate::orphans::{OrphanEvent, orphans};
pub use crate::search::SearchService;

use burrow_catalog::Repository;
use burrow_protocol::{RegistrationBuilder, SearchResponseBuilder, UrlGenerator};
use burrow_storage::PackageStorage;

/// Upper bound on uploads indexed at the same time by [`index_files`].
pub(crate) const MAX_PROCESS_CONCURRENCY: usize = 16;

/// Settings shared by the services of a [`Registry`].
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Absolute base URL every protocol document links from.
    pub base_url: String,
    pub allow_package_overwrites: bool,
    pub deletion: DeletionBehavior,
}

/// Every registry service over one blob store and one catalog.
#[derive(Clone)]
pub struct Registry {
    storage: PackageStorage,
    catalog: Repository,
    url: UrlGenerator,
    indexer: Indexer,
    content: ContentService,
    metadata: MetadataService,
    search: SearchService,
    deletion: DeletionService,
}
impl Registry {
    pub fn new(storage: PackageStorage, catalog: Repository, options: RegistryOptions) -> Self {
        let url = UrlGenerator::new(&options.base_url);
        Self {
            indexer: Indexer::new(storage.clone(), catalog.clone(), options.allow_package_overwrites),
            content: ContentService::new(storage.clone(), catalog.clone()),
            metadata: MetadataService::new(catalog.clone(), RegistrationBuilder::new(url.clone())),
            search: SearchService::new(catalog.clone(), SearchResponseBuilder::new(url.clone())),
            deletion: DeletionService::new(storage.clone(), catalog.clone(), options.deletion),
            storage,
            catalog,
            url,
        }
    }

    pub fn indexer(&self) -> &Indexer {
        &self.indexer
    }

    pub fn content(&self) -> &ContentService {
        &self.content
    }

    pub fn metadata(&self) -> &MetadataService {
        &self.metadata
    }

    pub fn search(&self) -> &SearchService {
        &self.search
    }

    pub fn deletion(&self) -> &DeletionService {
        &self.deletion
    }

    pub fn urls(&self) -> &UrlGenerator {
        &self.url
    }

    pub fn storage(&self) -> &PackageStorage {
        &self.storage
    }

    pub fn catalog(&self) -> &Repository {
        &self.catalog
    }
}
