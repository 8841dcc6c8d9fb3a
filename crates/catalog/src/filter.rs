//! Search and autocomplete filtering.
//!
//! A [`SearchFilter`] is an ordered chain of [`Predicate`]s combined with AND.
//! The same chain is rendered into the `WHERE` clause of catalog queries and
//! can be evaluated against packages already in memory.

use std::collections::BTreeSet;
use std::sync::Arc;

use burrow_frameworks::compatible_frameworks;
use burrow_package::models::{Package, SemVerLevel};
use sqlx::{QueryBuilder, Sqlite};

pub const DEFAULT_TAKE: u32 = 20;

/// Parameters of a search or autocomplete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Case-insensitive substring of the package id.
    pub text: Option<String>,
    pub include_prerelease: bool,
    pub include_semver2: bool,
    pub package_type: Option<String>,
    /// Only packages usable from this framework.
    pub framework: Option<String>,
    pub skip: u32,
    pub take: u32,
}
impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            text: None,
            include_prerelease: false,
            include_semver2: false,
            package_type: None,
            framework: None,
            skip: 0,
            take: DEFAULT_TAKE,
        }
    }
}
impl SearchQuery {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    IdContains(String),
    NotPrerelease,
    NotSemVer2,
    HasPackageType(String),
    /// The package supports at least one of these frameworks.
    SupportsAny(Arc<BTreeSet<String>>),
    Listed,
}
impl Predicate {
    pub fn matches(&self, package: &Package) -> bool {
        match self {
            Self::IdContains(text) => package.id.to_lowercase().contains(&text.to_lowercase()),
            Self::NotPrerelease => !package.is_prerelease,
            Self::NotSemVer2 => package.semver_level == SemVerLevel::Legacy,
            Self::HasPackageType(name) => package.package_types.iter().any(|t| &t.name == name),
            Self::SupportsAny(frameworks) => package.target_frameworks.iter().any(|f| frameworks.contains(f)),
            Self::Listed => package.listed,
        }
    }

    /// Append this predicate as a SQL condition on `packages AS p`.
    fn push_sql(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        match self {
            Self::IdContains(text) => {
                let pattern = format!("%{}%", escape_like(&text.to_lowercase()));
                qb.push("p.id_lower LIKE ").push_bind(pattern).push(" ESCAPE '\\'");
            },
            Self::NotPrerelease => {
                qb.push("p.is_prerelease = 0");
            },
            Self::NotSemVer2 => {
                qb.push("p.semver_level = ").push_bind(SemVerLevel::Legacy.as_i64());
            },
            Self::HasPackageType(name) => {
                qb.push("EXISTS (SELECT 1 FROM package_types AS t WHERE t.package_key = p.pkey AND t.name = ")
                    .push_bind(name.clone())
                    .push(")");
            },
            Self::SupportsAny(frameworks) => {
                qb.push("EXISTS (SELECT 1 FROM target_frameworks AS f WHERE f.package_key = p.pkey AND f.moniker IN (");
                let mut separated = qb.separated(", ");
                for framework in frameworks.iter() {
                    separated.push_bind(framework.clone());
                }
                separated.push_unseparated("))");
            },
            Self::Listed => {
                qb.push("p.listed = 1");
            },
        }
    }
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    predicates: Vec<Predicate>,
}
impl SearchFilter {
    /// Build the chain for a query: text, prerelease, SemVer 2.0.0, package
    /// type, framework, listed. Options the query leaves open add nothing.
    pub fn new(query: &SearchQuery) -> Self {
        let mut predicates = Vec::new();
        if let Some(text) = query.text.as_deref().map(str::trim)
            && !text.is_empty()
        {
            predicates.push(Predicate::IdContains(text.to_string()));
        }
        if !query.include_prerelease {
            predicates.push(Predicate::NotPrerelease);
        }
        if !query.include_semver2 {
            predicates.push(Predicate::NotSemVer2);
        }
        if let Some(package_type) = query.package_type.as_deref().filter(|t| !t.is_empty()) {
            predicates.push(Predicate::HasPackageType(package_type.to_string()));
        }
        if let Some(framework) = query.framework.as_deref().filter(|f| !f.is_empty()) {
            predicates.push(Predicate::SupportsAny(compatible_frameworks(framework)));
        }
        predicates.push(Predicate::Listed);
        Self { predicates }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn matches(&self, package: &Package) -> bool {
        self.predicates.iter().all(|predicate| predicate.matches(package))
    }

    /// Append every predicate as ` AND <condition>`.
    pub(crate) fn push_conditions(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        for predicate in &self.predicates {
            qb.push(" AND ");
            predicate.push_sql(qb);
        }
    }
}
