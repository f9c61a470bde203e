//! Generation reaper: delete every store left behind by older versions.

use futures::future::join_all;
use offcache_core::CacheStorage;

/// Outcome of one reaper pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReapReport {
    pub deleted: Vec<String>,
    /// Stale stores whose deletion failed; the next activation retries them.
    pub failed: Vec<String>,
}

/// Deletes stale stores on activation.
///
/// A store is stale when its name starts with the application's prefix and
/// differs from the current store name. Failures never block activation.
#[derive(Clone)]
pub struct GenerationReaper {
    storage: CacheStorage,
    prefix: String,
}

impl GenerationReaper {
    pub fn new(storage: CacheStorage, prefix: impl Into<String>) -> Self {
        Self { storage, prefix: prefix.into() }
    }

    pub async fn reap(&self, current: &str) -> ReapReport {
        let names = match self.storage.list_store_names().await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(error = %e, "could not list stores; skipping reap");
                return ReapReport::default();
            }
        };

        let stale: Vec<String> = names
            .into_iter()
            .filter(|name| name != current && name.starts_with(&self.prefix))
            .collect();

        let results = join_all(stale.iter().map(|name| self.storage.delete_store(name))).await;

        let mut report = ReapReport::default();
        for (name, result) in stale.into_iter().zip(results) {
            match result {
                Ok(_) => {
                    tracing::info!(store = %name, "deleted stale store");
                    report.deleted.push(name);
                }
                Err(e) => {
                    tracing::warn!(store = %name, error = %e, "failed to delete stale store");
                    report.failed.push(name);
                }
            }
        }
        report
    }
}
