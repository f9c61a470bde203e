//! Cache-first with background revalidation for sub-resources.
//!
//! The network fetch is spawned before the store lookup and runs to
//! completion on its own task, refreshing the store for the next request.
//! A hit is returned immediately; a miss waits on the fetch; a miss with a
//! failed fetch yields the generic unavailable response.

use std::sync::Arc;

use offcache_client::Transport;
use offcache_core::{CacheStore, Request, Response, ResponseSource, Snapshot};

use super::{is_cacheable, store_quietly};

#[derive(Clone)]
pub struct CacheFirst {
    store: CacheStore,
    transport: Arc<dyn Transport>,
}

impl CacheFirst {
    pub fn new(store: CacheStore, transport: Arc<dyn Transport>) -> Self {
        Self { store, transport }
    }

    /// Always yields a response.
    pub async fn respond(&self, request: &Request) -> Response {
        let key = request.key();
        let revalidation = tokio::spawn(revalidate(self.store.clone(), self.transport.clone(), request.clone()));

        match self.store.get(&key).await {
            Ok(Some(snapshot)) => {
                tracing::debug!(key = %key, "cache hit; revalidating in background");
                return snapshot.into_response(ResponseSource::Cache);
            }
            Ok(None) => tracing::debug!(key = %key, "cache miss; waiting on network"),
            Err(e) => tracing::warn!(key = %key, error = %e, "cache lookup failed; waiting on network"),
        }

        match revalidation.await {
            Ok(Some(snapshot)) => snapshot.into_response(ResponseSource::Network),
            Ok(None) => Response::unavailable(),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "revalidation task aborted");
                Response::unavailable()
            }
        }
    }
}

/// Fetch `request` and store a copy if cacheable. `None` on network failure.
async fn revalidate(store: CacheStore, transport: Arc<dyn Transport>, request: Request) -> Option<Snapshot> {
    match transport.fetch(&request).await {
        Ok(snapshot) => {
            if is_cacheable(&request, &snapshot) {
                store_quietly(&store, &request.key(), &snapshot).await;
            }
            Some(snapshot)
        }
        Err(e) => {
            tracing::debug!(url = %request.url, error = %e, "revalidation fetch failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StubTransport, url};
    use offcache_core::{CacheStorage, RequestKey, UNAVAILABLE_STATUS};
    use std::time::Duration;

    async fn setup() -> (CacheFirst, CacheStore, Arc<StubTransport>) {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let store = storage.open_store("v1").await.unwrap();
        let transport = Arc::new(StubTransport::default());
        (CacheFirst::new(store.clone(), transport.clone()), store, transport)
    }

    /// Poll until the background write for `path` lands or a second passes.
    async fn wait_for_body(store: &CacheStore, path: &str, body: &[u8]) -> bool {
        for _ in 0..100 {
            if let Some(snapshot) = store.get(&RequestKey::get(&url(path))).await.unwrap()
                && &snapshot.body[..] == body
            {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_miss_waits_on_network_and_stores() {
        let (strategy, store, transport) = setup().await;
        transport.respond("/icon.png", 200, "png-bytes");

        let response = strategy.respond(&Request::get(url("/icon.png"))).await;

        assert_eq!(response.source, ResponseSource::Network);
        assert_eq!(&response.body[..], b"png-bytes");
        let stored = store.get(&RequestKey::get(&url("/icon.png"))).await.unwrap().unwrap();
        assert_eq!(stored.body, response.body);
    }

    #[tokio::test]
    async fn test_hit_returns_cached_and_refreshes() {
        let (strategy, store, transport) = setup().await;
        store
            .put(&RequestKey::get(&url("/app.js")), &Snapshot::new(200, vec![], "old"))
            .await
            .unwrap();
        transport.respond("/app.js", 200, "new");

        let response = strategy.respond(&Request::get(url("/app.js"))).await;

        assert_eq!(response.source, ResponseSource::Cache);
        assert_eq!(&response.body[..], b"old");
        assert!(wait_for_body(&store, "/app.js", b"new").await);
    }

    #[tokio::test]
    async fn test_hit_does_not_wait_for_hanging_fetch() {
        let (strategy, store, transport) = setup().await;
        store
            .put(&RequestKey::get(&url("/style.css")), &Snapshot::new(200, vec![], "body{}"))
            .await
            .unwrap();
        transport.hang("/style.css");

        let response = tokio::time::timeout(Duration::from_secs(1), strategy.respond(&Request::get(url("/style.css"))))
            .await
            .expect("cache hit must not wait on the network");

        assert_eq!(response.source, ResponseSource::Cache);
        assert_eq!(&response.body[..], b"body{}");
    }

    #[tokio::test]
    async fn test_hit_masks_network_failure() {
        let (strategy, store, transport) = setup().await;
        store
            .put(&RequestKey::get(&url("/icon.png")), &Snapshot::new(200, vec![], "png"))
            .await
            .unwrap();
        transport.set_offline(true);

        let response = strategy.respond(&Request::get(url("/icon.png"))).await;

        assert_eq!(response.source, ResponseSource::Cache);
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn test_miss_and_offline_is_unavailable() {
        let (strategy, _store, transport) = setup().await;
        transport.set_offline(true);

        let response = strategy.respond(&Request::get(url("/api/messages"))).await;

        assert_eq!(response.status, UNAVAILABLE_STATUS);
        assert_eq!(response.source, ResponseSource::Unavailable);
    }

    #[tokio::test]
    async fn test_error_status_is_returned_not_stored() {
        let (strategy, store, transport) = setup().await;
        transport.respond("/api/scores", 500, "boom");

        let response = strategy.respond(&Request::get(url("/api/scores"))).await;

        assert_eq!(response.status, 500);
        assert_eq!(response.source, ResponseSource::Network);
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_non_get_is_not_stored() {
        let (strategy, store, transport) = setup().await;
        transport.respond("/api/scores", 200, "{\"ok\":true}");

        let response = strategy
            .respond(&Request::get(url("/api/scores")).with_method("POST"))
            .await;

        assert_eq!(response.status, 200);
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_store_failure_still_returns_network() {
        let storage = CacheStorage::open_in_memory().await.unwrap().with_quota(Some(1));
        let store = storage.open_store("v1").await.unwrap();
        let transport = Arc::new(StubTransport::default());
        transport.respond("/icon.png", 200, "png-bytes");
        let strategy = CacheFirst::new(store.clone(), transport);

        let response = strategy.respond(&Request::get(url("/icon.png"))).await;

        assert_eq!(response.source, ResponseSource::Network);
        assert_eq!(&response.body[..], b"png-bytes");
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_abandoned_miss_then_served_normally() {
        let (strategy, store, transport) = setup().await;
        transport.hang("/app.js");

        let abandoned =
            tokio::time::timeout(Duration::from_millis(50), strategy.respond(&Request::get(url("/app.js")))).await;
        assert!(abandoned.is_err());
        assert!(store.is_empty().await.unwrap());

        transport.respond("/app.js", 200, "console.log(1)");
        let response = strategy.respond(&Request::get(url("/app.js"))).await;

        assert_eq!(response.source, ResponseSource::Network);
        assert_eq!(&response.body[..], b"console.log(1)");
        let stored = store.get(&RequestKey::get(&url("/app.js"))).await.unwrap().unwrap();
        assert_eq!(stored.body, response.body);
    }

    #[tokio::test]
    async fn test_abandoned_hit_still_refreshes() {
        let (strategy, store, transport) = setup().await;
        store
            .put(&RequestKey::get(&url("/app.js")), &Snapshot::new(200, vec![], "old"))
            .await
            .unwrap();
        transport.respond("/app.js", 200, "new");

        // Either dropped mid-lookup or already answered from the store.
        let outcome = tokio::time::timeout(Duration::ZERO, strategy.respond(&Request::get(url("/app.js")))).await;
        if let Ok(response) = outcome {
            assert_eq!(response.source, ResponseSource::Cache);
        }

        assert!(wait_for_body(&store, "/app.js", b"new").await);
    }
}
