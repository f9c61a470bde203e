//! Per-request handling strategies.
//!
//! Only `GET` requests answered with a 2xx status are ever written to the
//! store. Store write failures are logged and swallowed: the caller still
//! receives its response.

pub mod cache_first;
pub mod network_first;

pub use cache_first::CacheFirst;
pub use network_first::NetworkFirst;

use offcache_core::{CacheStore, Request, RequestKey, Snapshot};

pub(crate) fn is_cacheable(request: &Request, snapshot: &Snapshot) -> bool {
    request.is_get() && snapshot.is_success()
}

/// Upsert `snapshot` under `key`, logging instead of failing.
pub(crate) async fn store_quietly(store: &CacheStore, key: &RequestKey, snapshot: &Snapshot) -> bool {
    match store.put(key, snapshot).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(store = store.name(), key = %key, error = %e, "store write failed; continuing uncached");
            false
        }
    }
}
