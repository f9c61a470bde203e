//! Request routing: navigations go network-first, everything else cache-first.

use std::sync::Arc;

use offcache_client::Transport;
use offcache_core::{CacheStore, Request, RequestKey, Response};

use crate::strategy::{CacheFirst, NetworkFirst};

/// Handling strategy chosen for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    NetworkFirst,
    CacheFirst,
}

impl Route {
    /// The only discriminant is whether the request is a top-level navigation.
    pub fn classify(request: &Request) -> Self {
        if request.is_navigation() { Route::NetworkFirst } else { Route::CacheFirst }
    }
}

#[derive(Clone)]
pub struct Router {
    network_first: NetworkFirst,
    cache_first: CacheFirst,
}

impl Router {
    pub fn new(
        store: CacheStore, transport: Arc<dyn Transport>, index_key: RequestKey, offline_html: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            network_first: NetworkFirst::new(store.clone(), transport.clone(), index_key, offline_html),
            cache_first: CacheFirst::new(store, transport),
        }
    }

    pub async fn dispatch(&self, request: &Request) -> Response {
        let route = Route::classify(request);
        tracing::trace!(method = %request.method, url = %request.url, ?route, "routing request");
        match route {
            Route::NetworkFirst => self.network_first.respond(request).await,
            Route::CacheFirst => self.cache_first.respond(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StubTransport, url};
    use offcache_core::{CacheStorage, ResponseSource, Snapshot};

    #[test]
    fn test_classify() {
        assert_eq!(Route::classify(&Request::navigate(url("/"))), Route::NetworkFirst);
        assert_eq!(Route::classify(&Request::get(url("/"))), Route::CacheFirst);
        assert_eq!(Route::classify(&Request::get(url("/api/scores")).with_method("POST")), Route::CacheFirst);
    }

    #[tokio::test]
    async fn test_dispatch_uses_matching_strategy() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let store = storage.open_store("v1").await.unwrap();
        store
            .put(&RequestKey::get(&url("/")), &Snapshot::new(200, vec![], "cached root"))
            .await
            .unwrap();
        let transport = Arc::new(StubTransport::default());
        transport.respond("/", 200, "network root");
        let router = Router::new(store, transport, RequestKey::get(&url("/index.html")), "<h1>Offline</h1>");

        let sub = router.dispatch(&Request::get(url("/"))).await;
        assert_eq!(sub.source, ResponseSource::Cache);

        let nav = router.dispatch(&Request::navigate(url("/"))).await;
        assert_eq!(nav.source, ResponseSource::Network);
        assert_eq!(&nav.body[..], b"network root");
    }
}
