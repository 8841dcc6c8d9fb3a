//! Catalog database: connection pool and schema.

use std::path::Path;
use std::time::Duration;

use exn::ResultExt;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use tracing::{debug, instrument};

use crate::error::{ErrorKind, Result};

/// Schema migrations, embedded at build time and applied on every connect.
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");
/// Uploads, downloads and searches each borrow a connection; SQLite still
/// admits one writer at a time.
const MAX_CONNECTIONS: u32 = 8;
/// How long a writer waits for another upload's transaction to commit before
/// the upload fails with `SQLITE_BUSY`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection pool for the package catalog.
///
/// Hand it to [`Repository::from`](crate::Repository) to read and write
/// package records.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the catalog at `path`, creating the file if it is missing, and
    /// bring its schema up to date.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let options = Self::options().filename(path.as_ref()).create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Self::with_schema(pool).await
    }

    /// A private catalog that lives as long as the returned value.
    ///
    /// Not `#[cfg(test)]`: other crates build their test fixtures on it.
    pub async fn connect_in_memory() -> Result<Self> {
        // Every connection to `:memory:` opens a separate, empty database, so
        // the pool holds exactly one and never recycles it.
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(Self::options().in_memory(true))
            .await
            .or_raise(|| ErrorKind::Database)?;
        Self::with_schema(pool).await
    }

    fn options() -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .journal_mode(SqliteJournalMode::Wal)
            // Child rows go with their package through `ON DELETE CASCADE`.
            .foreign_keys(true)
            // Committing the record is what publishes an upload.
            .synchronous(SqliteSynchronous::Full)
            .busy_timeout(BUSY_TIMEOUT)
    }

    async fn with_schema(pool: SqlitePool) -> Result<Self> {
        MIGRATOR.run(&pool).await.or_raise(|| ErrorKind::Migration)?;
        debug!(migrations = MIGRATOR.iter().count(), "catalog schema is current");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Wait for checked-out connections to return, then close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn pragma(db: &Database, name: &str) -> i64 {
        sqlx::query_scalar(&format!("PRAGMA {name}")).fetch_one(db.pool()).await.unwrap()
    }

    #[tokio::test]
    async fn test_in_memory_catalog_enforces_schema() {
        let db = Database::connect_in_memory().await.unwrap();
        sqlx::query("INSERT INTO target_frameworks (package_key, moniker) VALUES (1, 'net8.0')")
            .execute(db.pool())
            .await
            .unwrap_err();
        // The foreign key rejected the orphan row; the schema is still there.
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM packages").fetch_one(db.pool()).await.unwrap();
        assert_eq!(count, 0);
        db.close().await;
        assert!(db.pool().is_closed());
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = Database::connect_in_memory().await.unwrap();
        MIGRATOR.run(db.pool()).await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_settings() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::connect(dir.path().join("catalog.db")).await.unwrap();
        assert_eq!(pragma(&db, "foreign_keys").await, 1);
        // FULL
        assert_eq!(pragma(&db, "synchronous").await, 2);
        assert_eq!(pragma(&db, "busy_timeout").await, 5000);
        db.close().await;
    }

    #[tokio::test]
    async fn test_connect_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        let db = Database::connect(&path).await.unwrap();
        let mut tables: Vec<String> = sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
            .fetch_all(db.pool())
            .await
            .unwrap();
        tables.retain(|name| !name.starts_with("_sqlx") && !name.starts_with("sqlite_"));
        tables.sort();
        assert_eq!(tables, ["package_dependencies", "package_types", "packages", "target_frameworks"]);
        db.close().await;
        assert!(path.exists());
    }
}
