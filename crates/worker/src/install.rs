//! Installation: seed the version's store from the asset manifest.
//!
//! All manifest fetches must succeed with a 2xx status before anything is
//! written; the entries then land in one transaction that also marks the
//! store installed. A single failure writes nothing, not even the store.

use std::sync::Arc;

use futures::future::try_join_all;
use offcache_client::Transport;
use offcache_core::{AssetManifest, CacheStorage, CacheStore, Error, Request, RequestKey, Snapshot};

use crate::WorkerError;

/// Opens the version's store and bulk-populates it from the manifest.
#[derive(Clone)]
pub struct InstallController {
    storage: CacheStorage,
    transport: Arc<dyn Transport>,
}

impl InstallController {
    pub fn new(storage: CacheStorage, transport: Arc<dyn Transport>) -> Self {
        Self { storage, transport }
    }

    /// Whether `store_name` already completed an install.
    pub async fn is_installed(&self, store_name: &str) -> Result<bool, WorkerError> {
        Ok(self.storage.is_installed(store_name).await?)
    }

    /// Populate `store_name` with every manifest entry.
    ///
    /// # Errors
    ///
    /// `WorkerError::InstallFailed` naming the first entry whose fetch failed
    /// or returned a non-success status; a storage error if the bulk insert
    /// fails (e.g. quota).
    pub async fn install(&self, store_name: &str, manifest: &AssetManifest) -> Result<CacheStore, WorkerError> {
        let entries = try_join_all(manifest.entries().iter().map(|key| self.fetch_entry(key))).await?;

        let store = self.storage.install_store(store_name, entries).await?;

        tracing::debug!(store = store_name, entries = manifest.len(), "seeded store from manifest");
        Ok(store)
    }

    async fn fetch_entry(&self, key: &RequestKey) -> Result<(RequestKey, Snapshot), WorkerError> {
        let request = Request::get(key.url().clone()).with_method(key.method());
        let failed = |source: Error| WorkerError::InstallFailed { url: key.url().to_string(), source };

        let snapshot = self.transport.fetch(&request).await.map_err(failed)?;
        if !snapshot.is_success() {
            return Err(failed(Error::HttpError(format!("status {}", snapshot.status))));
        }
        Ok((key.clone(), snapshot))
    }
}
