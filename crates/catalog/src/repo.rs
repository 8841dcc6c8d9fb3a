//! Repository for package records.
//!
//! A package record is one row of `packages` plus its rows in the three child
//! tables (dependencies, package types, target frameworks). Records are
//! written together in one transaction and deleted together by cascade.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::filter::{SearchFilter, SearchQuery};
use crate::models::{Children, DependencyRow, FrameworkRow, PackageRow, PackageTypeRow};
use burrow_package::models::{NuGetVersion, Package, PackageRegistration};
use exn::ResultExt;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, instrument, warn};

/// Upper bound on packages returned by [`Repository::dependents`].
pub const MAX_DEPENDENTS: usize = 20;
const MAX_UPDATE_ATTEMPTS: usize = 3;

/// Outcome of [`Repository::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddResult {
    Success,
    /// A record with the same id (ignoring case) and normalized version
    /// already exists. Nothing was written.
    AlreadyExists,
}

enum Mutation {
    Listed(bool),
    Download,
}

/// Repository for managing package records in the catalog database.
///
/// Ids compare case-insensitively and versions by their normalized form, so
/// `Demo 1.0` and `demo 1.0.0` name the same record.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self::new(db.pool().clone())
    }
}
impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// Record a new package version.
    ///
    /// The unique index on (id, normalized version) decides between
    /// concurrent writers: the loser gets [`AddResult::AlreadyExists`] and
    /// its transaction is rolled back, so no partial record remains.
    #[instrument(skip(self, package), fields(id = %package.id, version = %package.version))]
    pub async fn add(&self, package: &Package) -> Result<AddResult> {
        let row = PackageRow::try_from(package)?;
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let inserted = sqlx::query(include_str!("../queries/insert_package.sql"))
            .bind(row.id)
            .bind(row.id_lower)
            .bind(row.normalized_version)
            .bind(row.original_version)
            .bind(row.authors)
            .bind(row.description)
            .bind(row.downloads)
            .bind(row.has_readme)
            .bind(row.has_embedded_icon)
            .bind(row.is_prerelease)
            .bind(row.release_notes)
            .bind(row.language)
            .bind(row.listed)
            .bind(row.min_client_version)
            .bind(row.published)
            .bind(row.require_license_acceptance)
            .bind(row.semver_level)
            .bind(row.summary)
            .bind(row.title)
            .bind(row.icon_url)
            .bind(row.license_url)
            .bind(row.project_url)
            .bind(row.repository_url)
            .bind(row.repository_type)
            .bind(row.tags)
            .execute(&mut *tx)
            .await;
        let pkey = match inserted {
            Ok(result) => result.last_insert_rowid(),
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                // Dropping the transaction rolls it back.
                warn!("package version is already recorded");
                return Ok(AddResult::AlreadyExists);
            },
            Err(err) => return Err(err).or_raise(|| ErrorKind::Database),
        };
        for dependency in &package.dependencies {
            sqlx::query(include_str!("../queries/insert_dependency.sql"))
                .bind(pkey)
                .bind(dependency.target_framework.as_deref())
                .bind(dependency.id.as_deref())
                .bind(dependency.id.as_deref().map(str::to_lowercase))
                .bind(dependency.version_range.as_deref())
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        for package_type in &package.package_types {
            sqlx::query(include_str!("../queries/insert_package_type.sql"))
                .bind(pkey)
                .bind(package_type.name.as_str())
                .bind(package_type.version.as_str())
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        for framework in &package.target_frameworks {
            sqlx::query(include_str!("../queries/insert_target_framework.sql"))
                .bind(pkey)
                .bind(framework.as_str())
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        debug!(pkey, "package version recorded");
        Ok(AddResult::Success)
    }

    // =========================================================================
    // Get/Fetch
    // =========================================================================

    /// Whether any version of `id` is recorded, listed or not.
    pub async fn exists_id(&self, id: &str) -> Result<bool> {
        let exists: i64 = sqlx::query_scalar(include_str!("../queries/exists_id.sql"))
            .bind(id.to_lowercase())
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(exists != 0)
    }

    pub async fn exists(&self, id: &str, version: &NuGetVersion) -> Result<bool> {
        let exists: i64 = sqlx::query_scalar(include_str!("../queries/exists.sql"))
            .bind(id.to_lowercase())
            .bind(version.to_lower_normalized())
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(exists != 0)
    }

    /// All versions of a package, ascending.
    pub async fn find(&self, id: &str, include_unlisted: bool) -> Result<Vec<Package>> {
        let rows: Vec<PackageRow> = sqlx::query_as(include_str!("../queries/find_by_id.sql"))
            .bind(id.to_lowercase())
            .bind(include_unlisted)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let mut packages = self.hydrate(rows).await?;
        packages.sort_by(|a, b| a.version.cmp(&b.version));
        Ok(packages)
    }

    pub async fn find_one(&self, id: &str, version: &NuGetVersion, include_unlisted: bool) -> Result<Option<Package>> {
        let row: Option<PackageRow> = sqlx::query_as(include_str!("../queries/find_one.sql"))
            .bind(id.to_lowercase())
            .bind(version.to_lower_normalized())
            .bind(include_unlisted)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Load the child rows of each package row.
    async fn hydrate(&self, rows: Vec<PackageRow>) -> Result<Vec<Package>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let keys = rows.iter().map(|row| row.pkey).collect::<Vec<_>>();
        let mut qb = children_query(
            "SELECT package_key, target_framework, id, version_range FROM package_dependencies",
            &keys,
        );
        let dependencies: Vec<DependencyRow> =
            qb.build_query_as().fetch_all(&self.pool).await.or_raise(|| ErrorKind::Database)?;
        let mut qb = children_query("SELECT package_key, name, version FROM package_types", &keys);
        let package_types: Vec<PackageTypeRow> =
            qb.build_query_as().fetch_all(&self.pool).await.or_raise(|| ErrorKind::Database)?;
        let mut qb = children_query("SELECT package_key, moniker FROM target_frameworks", &keys);
        let frameworks: Vec<FrameworkRow> =
            qb.build_query_as().fetch_all(&self.pool).await.or_raise(|| ErrorKind::Database)?;
        let mut children = Children::collect(dependencies, package_types, frameworks);
        rows.into_iter()
            .map(|row| {
                let own = children.remove(&row.pkey).unwrap_or_default();
                row.into_package(own)
            })
            .collect()
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// List or unlist a version. Returns `false` if it does not exist.
    #[instrument(skip(self, version), fields(version = %version))]
    pub async fn set_listed(&self, id: &str, version: &NuGetVersion, listed: bool) -> Result<bool> {
        self.mutate(id, version, Mutation::Listed(listed)).await
    }

    /// Count one download. Returns `false` if the version does not exist.
    pub async fn increment_download(&self, id: &str, version: &NuGetVersion) -> Result<bool> {
        self.mutate(id, version, Mutation::Download).await
    }

    /// Apply an update guarded by the row version, re-reading the row when
    /// another writer got there first.
    async fn mutate(&self, id: &str, version: &NuGetVersion, mutation: Mutation) -> Result<bool> {
        let id_lower = id.to_lowercase();
        let normalized = version.to_lower_normalized();
        for attempt in 1..=MAX_UPDATE_ATTEMPTS {
            let current: Option<(i64, i64)> = sqlx::query_as(include_str!("../queries/get_row_version.sql"))
                .bind(&id_lower)
                .bind(&normalized)
                .fetch_optional(&self.pool)
                .await
                .or_raise(|| ErrorKind::Database)?;
            let Some((pkey, row_version)) = current else {
                return Ok(false);
            };
            let query = match mutation {
                Mutation::Listed(listed) => sqlx::query(include_str!("../queries/update_listed.sql")).bind(listed),
                Mutation::Download => sqlx::query(include_str!("../queries/increment_downloads.sql")),
            };
            let result = query
                .bind(pkey)
                .bind(row_version)
                .execute(&self.pool)
                .await
                .or_raise(|| ErrorKind::Database)?;
            if result.rows_affected() > 0 {
                return Ok(true);
            }
            debug!(id, version = %normalized, attempt, "row version changed underneath update");
        }
        exn::bail!(ErrorKind::Contention(id.to_string(), normalized))
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Remove a version and its child rows. Returns `false` if it did not exist.
    #[instrument(skip(self, version), fields(version = %version))]
    pub async fn hard_delete(&self, id: &str, version: &NuGetVersion) -> Result<bool> {
        let result = sqlx::query(include_str!("../queries/delete_package.sql"))
            .bind(id.to_lowercase())
            .bind(version.to_lower_normalized())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Page through matching package ids in ascending order, returning every
    /// matching version of each id on the page.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<PackageRegistration>> {
        let filter = SearchFilter::new(query);
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT p.id_lower FROM packages AS p WHERE 1 = 1");
        filter.push_conditions(&mut qb);
        qb.push(" GROUP BY p.id_lower ORDER BY p.id_lower ASC");
        push_page(&mut qb, query);
        let ids = qb.build_query_scalar::<String>().fetch_all(&self.pool).await.or_raise(|| ErrorKind::Database)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT p.* FROM packages AS p WHERE p.id_lower IN (");
        let mut separated = qb.separated(", ");
        for id in &ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(")");
        filter.push_conditions(&mut qb);
        let rows: Vec<PackageRow> = qb.build_query_as().fetch_all(&self.pool).await.or_raise(|| ErrorKind::Database)?;

        let mut registrations = PackageRegistration::group(self.hydrate(rows).await?);
        for registration in &mut registrations {
            registration.packages.sort_by(|a, b| a.version.cmp(&b.version));
        }
        registrations.sort_by_key(|registration| {
            let id_lower = registration.id.to_lowercase();
            ids.iter().position(|id| *id == id_lower)
        });
        Ok(registrations)
    }

    /// Matching package ids, most downloaded first.
    #[instrument(skip(self))]
    pub async fn autocomplete(&self, query: &SearchQuery) -> Result<Vec<String>> {
        let filter = SearchFilter::new(query);
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT MIN(p.id) FROM packages AS p WHERE 1 = 1");
        filter.push_conditions(&mut qb);
        qb.push(" GROUP BY p.id_lower ORDER BY SUM(p.downloads) DESC, p.id_lower ASC");
        push_page(&mut qb, query);
        qb.build_query_scalar::<String>().fetch_all(&self.pool).await.or_raise(|| ErrorKind::Database)
    }

    /// Listed versions of a package, ascending.
    pub async fn list_versions(
        &self,
        id: &str,
        include_prerelease: bool,
        include_semver2: bool,
    ) -> Result<Vec<NuGetVersion>> {
        let rows: Vec<(Option<String>, String)> = sqlx::query_as(include_str!("../queries/list_versions.sql"))
            .bind(id.to_lowercase())
            .bind(include_prerelease)
            .bind(include_semver2)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let mut versions = rows
            .iter()
            .map(|(original, normalized)| {
                NuGetVersion::parse(original.as_deref().unwrap_or(normalized))
                    .or_raise(|| ErrorKind::InvalidData("version"))
            })
            .collect::<Result<Vec<_>>>()?;
        versions.sort();
        Ok(versions)
    }

    /// Listed packages that depend on `id`, most downloaded first, one entry
    /// per package id.
    #[instrument(skip(self))]
    pub async fn dependents(&self, id: &str) -> Result<Vec<Package>> {
        let rows: Vec<PackageRow> = sqlx::query_as(include_str!("../queries/find_dependents.sql"))
            .bind(id.to_lowercase())
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let mut seen = HashSet::new();
        let rows = rows
            .into_iter()
            .filter(|row| seen.insert(row.id.to_lowercase()))
            .take(MAX_DEPENDENTS)
            .collect();
        self.hydrate(rows).await
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// Lowercased (id, normalized version) of every record, listed or not.
    pub async fn all_coordinates(&self) -> Result<BTreeSet<(String, String)>> {
        let rows: Vec<(String, String)> = sqlx::query_as(include_str!("../queries/list_coordinates.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(rows.into_iter().map(|(id, version)| (id, version.to_lowercase())).collect())
    }
}

fn children_query<'a>(select: &str, keys: &'a [i64]) -> QueryBuilder<'a, Sqlite> {
    let mut qb = QueryBuilder::new(select);
    qb.push(" WHERE package_key IN (");
    let mut separated = qb.separated(", ");
    for key in keys {
        separated.push_bind(*key);
    }
    // Child rows come back in insertion order.
    separated.push_unseparated(") ORDER BY rowid");
    qb
}

fn push_page(qb: &mut QueryBuilder<'_, Sqlite>, query: &SearchQuery) {
    qb.push(" LIMIT ")
        .push_bind(i64::from(query.take))
        .push(" OFFSET ")
        .push_bind(i64::from(query.skip));
}

#[cfg(test)]
mod tests {
    use super::*;
    use burrow_package::models::{Dependency, PackageType};

    fn version(raw: &str) -> NuGetVersion {
        NuGetVersion::parse(raw).unwrap()
    }

    fn package(id: &str, raw: &str) -> Package {
        let mut package = Package::new(id, version(raw));
        package.authors = vec!["Tester".to_string()];
        package.description = format!("{id} package");
        package.package_types = vec![PackageType::new("Dependency", "0.0")];
        package.target_frameworks = vec!["netstandard2.0".to_string()];
        package.dependencies = vec![Dependency::empty_group(Some("netstandard2.0".to_string()))];
        package
    }

    fn depending_on(id: &str, raw: &str, dependency: &str, downloads: i64) -> Package {
        let mut package = package(id, raw);
        package.downloads = downloads;
        package.dependencies = vec![Dependency::new(Some("netstandard2.0".to_string()), dependency, "[1.0.0, )")];
        package
    }

    async fn repository() -> (Database, Repository) {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = Repository::from(&db);
        (db, repo)
    }

    async fn count(db: &Database, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_add_and_find() {
        let (_db, repo) = repository().await;
        let mut original = package("Demo", "1.0.0-Beta");
        original.tags = vec!["one".to_string(), "two".to_string()];
        original.dependencies.push(Dependency::new(None, "Other", "[2.0.0, )"));
        assert_eq!(repo.add(&original).await.unwrap(), AddResult::Success);

        assert!(repo.exists_id("demo").await.unwrap());
        assert!(repo.exists("DEMO", &version("1.0.0.0-beta")).await.unwrap());
        assert!(!repo.exists("Demo", &version("1.0.0")).await.unwrap());

        let found = repo.find_one("demo", &version("1.0.0-beta"), false).await.unwrap().unwrap();
        assert_eq!(found.id, "Demo");
        assert_eq!(found.version.original(), "1.0.0-Beta");
        assert_eq!(found.tags, original.tags);
        assert_eq!(found.dependencies, original.dependencies);
        assert_eq!(found.package_types, original.package_types);
        assert_eq!(found.target_frameworks, original.target_frameworks);
        assert_eq!(found.row_version, 0);
    }

    #[tokio::test]
    async fn test_add_duplicate_leaves_no_partial_record() {
        let (db, repo) = repository().await;
        repo.add(&package("Demo", "1.0")).await.unwrap();
        let duplicate = depending_on("DEMO", "1.0.0", "Other", 0);
        assert_eq!(repo.add(&duplicate).await.unwrap(), AddResult::AlreadyExists);
        assert_eq!(count(&db, "packages").await, 1);
        assert_eq!(count(&db, "package_dependencies").await, 1);
        assert!(repo.dependents("Other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_ascii_ids_fold_case() {
        let (db, repo) = repository().await;
        assert_eq!(repo.add(&package("Äpfel", "1.0.0")).await.unwrap(), AddResult::Success);
        assert!(repo.exists("äpfel", &version("1.0.0")).await.unwrap());
        assert!(repo.exists_id("ÄPFEL").await.unwrap());
        assert_eq!(repo.add(&package("äpfel", "1.0.0")).await.unwrap(), AddResult::AlreadyExists);
        assert_eq!(count(&db, "packages").await, 1);

        repo.add(&package("ÄPFEL", "2.0.0")).await.unwrap();
        assert_eq!(repo.find("äpfel", false).await.unwrap().len(), 2);
        let results = repo.search(&SearchQuery::text("äpf")).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].packages.len(), 2);
        let coordinates = repo.all_coordinates().await.unwrap();
        assert!(coordinates.contains(&("äpfel".to_string(), "1.0.0".to_string())));

        repo.add(&depending_on("Obst", "1.0.0", "ÄPFEL", 0)).await.unwrap();
        let dependents = repo.dependents("äpfel").await.unwrap();
        assert_eq!(dependents.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(), ["Obst"]);
    }

    #[tokio::test]
    async fn test_find_sorts_and_hides_unlisted() {
        let (_db, repo) = repository().await;
        for raw in ["2.0.0-beta", "1.5.0", "1.0.0"] {
            repo.add(&package("Demo", raw)).await.unwrap();
        }
        assert!(repo.set_listed("Demo", &version("1.5.0"), false).await.unwrap());
        let listed = repo.find("demo", false).await.unwrap();
        let versions = listed.iter().map(|p| p.normalized_version()).collect::<Vec<_>>();
        assert_eq!(versions, ["1.0.0", "2.0.0-beta"]);
        let all = repo.find("demo", true).await.unwrap();
        let versions = all.iter().map(|p| p.normalized_version()).collect::<Vec<_>>();
        assert_eq!(versions, ["1.0.0", "1.5.0", "2.0.0-beta"]);
        assert!(repo.find_one("Demo", &version("1.5.0"), false).await.unwrap().is_none());
        assert!(repo.find_one("Demo", &version("1.5.0"), true).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_updates_bump_row_version() {
        let (_db, repo) = repository().await;
        repo.add(&package("Demo", "1.0.0")).await.unwrap();
        assert!(repo.increment_download("demo", &version("1.0.0")).await.unwrap());
        assert!(repo.increment_download("Demo", &version("1.0")).await.unwrap());
        assert!(repo.set_listed("Demo", &version("1.0.0"), false).await.unwrap());
        let found = repo.find_one("Demo", &version("1.0.0"), true).await.unwrap().unwrap();
        assert_eq!(found.downloads, 2);
        assert!(!found.listed);
        assert_eq!(found.row_version, 3);
    }

    #[tokio::test]
    async fn test_updates_of_missing_version() {
        let (_db, repo) = repository().await;
        assert!(!repo.set_listed("Demo", &version("1.0.0"), false).await.unwrap());
        assert!(!repo.increment_download("Demo", &version("1.0.0")).await.unwrap());
        assert!(!repo.hard_delete("Demo", &version("1.0.0")).await.unwrap());
    }

    #[tokio::test]
    async fn test_hard_delete_cascades() {
        let (db, repo) = repository().await;
        repo.add(&package("Demo", "1.0.0")).await.unwrap();
        repo.add(&package("Demo", "2.0.0")).await.unwrap();
        assert!(repo.hard_delete("demo", &version("1.0.0")).await.unwrap());
        assert_eq!(count(&db, "packages").await, 1);
        assert_eq!(count(&db, "package_dependencies").await, 1);
        assert_eq!(count(&db, "package_types").await, 1);
        assert_eq!(count(&db, "target_frameworks").await, 1);
        assert!(repo.exists_id("Demo").await.unwrap());
    }

    #[tokio::test]
    async fn test_search_excludes_prerelease() {
        let (_db, repo) = repository().await;
        repo.add(&package("Demo", "1.0.0")).await.unwrap();
        repo.add(&package("Demo", "2.0.0-beta")).await.unwrap();
        repo.add(&package("Demo.Extras", "1.0.0-beta")).await.unwrap();
        repo.add(&package("Unrelated", "1.0.0")).await.unwrap();

        let results = repo.search(&SearchQuery::text("demo")).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "Demo");
        assert_eq!(results[0].packages.len(), 1);
        assert_eq!(results[0].packages[0].normalized_version(), "1.0.0");

        let query = SearchQuery {
            include_prerelease: true,
            ..SearchQuery::text("demo")
        };
        let results = repo.search(&query).await.unwrap();
        let ids = results.iter().map(|r| r.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, ["Demo", "Demo.Extras"]);
        assert_eq!(results[0].packages.len(), 2);
    }

    #[tokio::test]
    async fn test_search_pages_over_distinct_ids() {
        let (_db, repo) = repository().await;
        for id in ["Charlie", "alpha", "Bravo"] {
            repo.add(&package(id, "1.0.0")).await.unwrap();
            repo.add(&package(id, "2.0.0")).await.unwrap();
        }
        let query = SearchQuery {
            skip: 1,
            take: 1,
            ..SearchQuery::default()
        };
        let results = repo.search(&query).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "Bravo");
        assert_eq!(results[0].packages.len(), 2);
    }

    #[tokio::test]
    async fn test_search_by_framework_and_type() {
        let (_db, repo) = repository().await;
        let mut legacy = package("Legacy", "1.0.0");
        legacy.target_frameworks = vec!["net45".to_string()];
        repo.add(&legacy).await.unwrap();
        let mut tool = package("Tool", "1.0.0");
        tool.package_types = vec![PackageType::new("DotnetTool", "0.0")];
        repo.add(&tool).await.unwrap();

        let query = SearchQuery {
            framework: Some("net8.0".to_string()),
            ..SearchQuery::default()
        };
        let ids = repo.search(&query).await.unwrap().into_iter().map(|r| r.id).collect::<Vec<_>>();
        assert_eq!(ids, ["Tool"]);

        let query = SearchQuery {
            package_type: Some("DotnetTool".to_string()),
            ..SearchQuery::default()
        };
        let ids = repo.search(&query).await.unwrap().into_iter().map(|r| r.id).collect::<Vec<_>>();
        assert_eq!(ids, ["Tool"]);
    }

    #[tokio::test]
    async fn test_autocomplete_orders_by_downloads() {
        let (_db, repo) = repository().await;
        repo.add(&depending_on("Demo.Small", "1.0.0", "X", 1)).await.unwrap();
        repo.add(&depending_on("Demo.Big", "1.0.0", "X", 50)).await.unwrap();
        repo.add(&depending_on("Demo.Mid", "1.0.0", "X", 10)).await.unwrap();
        repo.add(&depending_on("Demo.Mid", "2.0.0", "X", 45)).await.unwrap();
        let ids = repo.autocomplete(&SearchQuery::text("demo")).await.unwrap();
        assert_eq!(ids, ["Demo.Mid", "Demo.Big", "Demo.Small"]);
    }

    #[tokio::test]
    async fn test_list_versions() {
        let (_db, repo) = repository().await;
        for raw in ["2.0.0", "1.0.0-beta", "1.0.0-beta.2", "1.5.0", "1.0.0"] {
            repo.add(&package("Demo", raw)).await.unwrap();
        }
        repo.set_listed("Demo", &version("1.5.0"), false).await.unwrap();
        let render =
            |versions: Vec<NuGetVersion>| versions.iter().map(|v| v.to_normalized_string()).collect::<Vec<_>>();
        assert_eq!(render(repo.list_versions("demo", false, false).await.unwrap()), ["1.0.0", "2.0.0"]);
        assert_eq!(
            render(repo.list_versions("demo", true, false).await.unwrap()),
            ["1.0.0-beta", "1.0.0", "2.0.0"]
        );
        assert_eq!(
            render(repo.list_versions("demo", true, true).await.unwrap()),
            ["1.0.0-beta", "1.0.0-beta.2", "1.0.0", "2.0.0"]
        );
    }

    #[tokio::test]
    async fn test_dependents() {
        let (_db, repo) = repository().await;
        repo.add(&package("Target", "1.0.0")).await.unwrap();
        repo.add(&depending_on("Popular", "1.0.0", "target", 100)).await.unwrap();
        repo.add(&depending_on("Popular", "2.0.0", "Target", 5)).await.unwrap();
        repo.add(&depending_on("Niche", "1.0.0", "Target", 10)).await.unwrap();
        repo.add(&depending_on("Hidden", "1.0.0", "Target", 1000)).await.unwrap();
        repo.set_listed("Hidden", &version("1.0.0"), false).await.unwrap();
        repo.add(&depending_on("Unrelated", "1.0.0", "Other", 1)).await.unwrap();

        let dependents = repo.dependents("TARGET").await.unwrap();
        let found = dependents.iter().map(|p| (p.id.as_str(), p.downloads)).collect::<Vec<_>>();
        assert_eq!(found, [("Popular", 100), ("Niche", 10)]);
    }

    #[tokio::test]
    async fn test_all_coordinates() {
        let (_db, repo) = repository().await;
        repo.add(&package("Demo", "1.0.0-Beta")).await.unwrap();
        repo.add(&package("Other", "2.0")).await.unwrap();
        repo.set_listed("Other", &version("2.0.0"), false).await.unwrap();
        let coordinates = repo.all_coordinates().await.unwrap();
        let expected = [("demo", "1.0.0-beta"), ("other", "2.0.0")]
            .map(|(id, version)| (id.to_string(), version.to_string()))
            .into_iter()
            .collect::<BTreeSet<_>>();
        assert_eq!(coordinates, expected);
    }

    #[tokio::test]
    async fn test_legacy_row_without_original_version() {
        let (_db, repo) = repository().await;
        sqlx::query("INSERT INTO packages (id, normalized_version, published) VALUES ('Legacy', '1.0.0-rc', 0)")
            .execute(&repo.pool)
            .await
            .unwrap();
        let found = repo.find_one("legacy", &version("1.0.0-RC"), false).await.unwrap().unwrap();
        assert_eq!(found.version.original(), "1.0.0-rc");
        assert!(found.authors.is_empty());
        assert!(found.dependencies.is_empty());
    }
}
