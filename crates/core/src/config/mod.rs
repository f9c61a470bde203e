//! Worker configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (OFFCACHE_*)
//! 2. TOML config file (if OFFCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{AssetManifest, DEFAULT_ASSETS, Error, RequestKey, VersionTag};

mod validation;

pub use validation::ConfigError;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Worker configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (OFFCACHE_*)
/// 2. TOML config file (if OFFCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Version tag of this build; bump it whenever the manifest or
    /// strategy logic changes.
    ///
    /// Set via OFFCACHE_VERSION environment variable.
    #[serde(default = "default_version")]
    pub version: String,

    /// Prefix shared by every store this application owns.
    ///
    /// Set via OFFCACHE_STORE_PREFIX environment variable.
    #[serde(default = "default_store_prefix")]
    pub store_prefix: String,

    /// Path to SQLite storage database.
    ///
    /// Set via OFFCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin the manifest and index document paths are resolved against.
    ///
    /// Set via OFFCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Paths seeded into the store at install time.
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,

    /// Canonical root document served when a navigation goes offline.
    ///
    /// Set via OFFCACHE_INDEX_DOCUMENT environment variable.
    #[serde(default = "default_index_document")]
    pub index_document: String,

    /// Body of the synthetic offline page.
    ///
    /// Set via OFFCACHE_OFFLINE_HTML environment variable.
    #[serde(default = "default_offline_html")]
    pub offline_html: String,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Transport timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum response body size in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Byte quota across all stores; unlimited if unset.
    #[serde(default)]
    pub quota_bytes: Option<u64>,

    /// Log output format (`text` or `json`).
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_version() -> String {
    "v1.0.0".into()
}

fn default_store_prefix() -> String {
    "brickshot-cache-".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./offcache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_manifest() -> Vec<String> {
    DEFAULT_ASSETS.iter().map(|s| s.to_string()).collect()
}

fn default_index_document() -> String {
    "/index.html".into()
}

fn default_offline_html() -> String {
    "<h1>Offline</h1>".into()
}

fn default_user_agent() -> String {
    "offcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            store_prefix: default_store_prefix(),
            db_path: default_db_path(),
            origin: default_origin(),
            manifest: default_manifest(),
            index_document: default_index_document(),
            offline_html: default_offline_html(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            quota_bytes: None,
            log_format: LogFormat::default(),
        }
    }
}

impl WorkerConfig {
    /// Timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn version_tag(&self) -> VersionTag {
        VersionTag::new(self.version.clone())
    }

    /// Name of the store owned by the configured version.
    pub fn store_name(&self) -> String {
        self.version_tag().store_name(&self.store_prefix)
    }

    pub fn origin_url(&self) -> Result<Url, Error> {
        Url::parse(&self.origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", self.origin)))
    }

    /// The manifest resolved against the origin.
    pub fn asset_manifest(&self) -> Result<AssetManifest, Error> {
        AssetManifest::resolve(&self.origin_url()?, &self.manifest)
    }

    /// Key of the canonical index document.
    pub fn index_key(&self) -> Result<RequestKey, Error> {
        let url = self
            .origin_url()?
            .join(&self.index_document)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", self.index_document)))?;
        Ok(RequestKey::get(&url))
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `OFFCACHE_`
    /// 2. TOML file from `OFFCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("OFFCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("OFFCACHE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
