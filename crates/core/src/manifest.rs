//! Version tags and the asset manifest.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, RequestKey};

/// Opaque identifier of one deployed generation of the cache.
///
/// Never parsed; only compared and used to derive the store name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionTag(String);

impl VersionTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the store owned by this version.
    pub fn store_name(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.0)
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Assets that must always be available offline.
pub const DEFAULT_ASSETS: &[&str] = &["/", "/index.html", "/manifest.json", "/service-worker.js", "/icon.png"];

/// Fixed, ordered list of request keys seeded into the store at install time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetManifest {
    entries: Vec<RequestKey>,
}

impl AssetManifest {
    /// Resolve each path against `origin`.
    pub fn resolve<S: AsRef<str>>(origin: &Url, paths: &[S]) -> Result<Self, Error> {
        let entries = paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                if path.trim().is_empty() {
                    return Err(Error::InvalidInput("empty manifest entry".to_string()));
                }
                origin
                    .join(path)
                    .map(|url| RequestKey::get(&url))
                    .map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[RequestKey] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
