//! SQLite metadata store for packages.
//!
//! The catalog is the authority on which package versions exist: a version
//! is published once its record is committed here, whatever the blob store
//! holds. Blobs without a record are orphans (see
//! [`Repository::all_coordinates`]).
//!
//! # Schema
//! - **packages**: one row per (id, normalized version), unique ignoring case.
//! - **package_dependencies**, **package_types**, **target_frameworks**: child
//!   rows of a package, removed with it.

mod db;
pub mod error;
mod filter;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::filter::{DEFAULT_TAKE, Predicate, SearchFilter, SearchQuery};
pub use crate::repo::{AddResult, MAX_DEPENDENTS, Repository};
