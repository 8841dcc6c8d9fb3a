//! Configuration for burrow.
//!
//! Values are layered, later sources overriding earlier ones:
//!
//! 1. Built-in defaults.
//! 2. `burrow.toml`, `burrow.yaml` and `burrow.json` in the platform
//!    configuration directory, when present.
//! 3. An explicitly requested file (`--config`), which must exist.
//! 4. Environment variables prefixed with `BURROW_`. Nested keys are
//!    separated by a double underscore, e.g. `BURROW_STORAGE__PATH`.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ENV_PREFIX: &str = "BURROW_";
const FILE_STEM: &str = "burrow";
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Absolute URL clients reach the registry at. Every protocol document
    /// links relative to it.
    pub base_url: String,
    /// Uploading an existing version replaces it instead of being rejected.
    pub allow_package_overwrites: bool,
    pub deletion: DeletionMode,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}
impl Default for Config {
    fn default() -> Self {
        let data_dir = project_dirs().map_or_else(|| PathBuf::from("data"), |dirs| dirs.data_dir().to_path_buf());
        Self {
            base_url: "http://localhost:5000".to_string(),
            allow_package_overwrites: false,
            deletion: DeletionMode::default(),
            storage: StorageConfig { path: data_dir.join("packages") },
            database: DatabaseConfig { path: data_dir.join("burrow.db") },
            logging: LoggingConfig::default(),
        }
    }
}

/// What deleting a package version does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeletionMode {
    #[default]
    Unlist,
    HardDelete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory of the blob store.
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file, created if missing.
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is not set.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

impl Config {
    /// Load from every source, see the [crate documentation](crate).
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let config_dir = project_dirs().map(|dirs| dirs.config_dir().to_path_buf());
        Self::from_figment(figment(config_dir.as_deref(), file)?)
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let base_url = self.base_url.trim_end_matches('/');
        match base_url.split_once("://") {
            Some(("http" | "https", host)) if !host.is_empty() => (),
            _ => exn::bail!(ErrorKind::Invalid("base_url", "expected an absolute http(s) URL".to_string())),
        }
        if self.storage.path.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Invalid("storage.path", "must not be empty".to_string()));
        }
        if self.database.path.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Invalid("database.path", "must not be empty".to_string()));
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            exn::bail!(ErrorKind::Invalid("logging.level", format!("expected one of {}", LOG_LEVELS.join(", "))));
        }
        Ok(())
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", FILE_STEM)
}

/// Layer defaults, files found in `config_dir`, the explicit `file` and the
/// environment.
pub fn figment(config_dir: Option<&Path>, file: Option<&Path>) -> Result<Figment> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));
    if let Some(dir) = config_dir {
        debug!(dir = %dir.display(), "looking for configuration files");
        figment = figment
            .merge(Toml::file(dir.join(format!("{FILE_STEM}.toml"))))
            .merge(Yaml::file(dir.join(format!("{FILE_STEM}.yaml"))))
            .merge(Json::file(dir.join(format!("{FILE_STEM}.json"))));
    }
    if let Some(file) = file {
        if !file.is_file() {
            exn::bail!(ErrorKind::NotFound(file.to_path_buf()));
        }
        let extension = file.extension().and_then(|ext| ext.to_str()).map(str::to_lowercase);
        figment = match extension.as_deref() {
            Some("toml") => figment.merge(Toml::file(file)),
            Some("yaml" | "yml") => figment.merge(Yaml::file(file)),
            Some("json") => figment.merge(Json::file(file)),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(file.to_path_buf())),
        };
    }
    Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
}
