//! Configuration validation rules.
//!
//! This module provides validation logic for `WorkerConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::WorkerConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl WorkerConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `version` is empty, and
    /// `ConfigError::Invalid` if:
    /// - `origin` is not an http(s) URL
    /// - `manifest` or `index_document` paths do not start with `/`
    /// - `offline_html` is empty
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `quota_bytes` is set to 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "version".into(),
                hint: "Set OFFCACHE_VERSION to the build's version tag".into(),
            });
        }

        match url::Url::parse(&self.origin) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => return Err(invalid("origin", format!("unsupported scheme: {}", url.scheme()))),
            Err(e) => return Err(invalid("origin", e.to_string())),
        }

        if let Some(entry) = self.manifest.iter().find(|p| !p.starts_with('/')) {
            return Err(invalid("manifest", format!("entry {entry:?} must start with '/'")));
        }

        if !self.index_document.starts_with('/') {
            return Err(invalid("index_document", "must start with '/'"));
        }

        if self.offline_html.is_empty() {
            return Err(invalid("offline_html", "must not be empty"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.quota_bytes == Some(0) {
            return Err(invalid("quota_bytes", "must be greater than 0 when set"));
        }

        if self.store_prefix.is_empty() {
            tracing::warn!("store_prefix is empty; activation will reap every other store in the database");
        }

        Ok(())
    }
}
