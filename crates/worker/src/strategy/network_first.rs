//! Network-first handling for top-level navigations.
//!
//! One network attempt, no retries. A successful cacheable response is
//! written under the request's own key and the canonical index key, so the
//! offline fallback always has a root document. On network failure the
//! stored index document is served, else the synthetic offline page.

use std::sync::Arc;

use offcache_client::Transport;
use offcache_core::{CacheStore, Request, RequestKey, Response, ResponseSource};

use super::{is_cacheable, store_quietly};

#[derive(Clone)]
pub struct NetworkFirst {
    store: CacheStore,
    transport: Arc<dyn Transport>,
    index_key: RequestKey,
    offline_html: Arc<str>,
}

impl NetworkFirst {
    pub fn new(
        store: CacheStore, transport: Arc<dyn Transport>, index_key: RequestKey, offline_html: impl Into<Arc<str>>,
    ) -> Self {
        Self { store, transport, index_key, offline_html: offline_html.into() }
    }

    /// Always yields a response.
    pub async fn respond(&self, request: &Request) -> Response {
        let snapshot = match self.transport.fetch(request).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "navigation offline; falling back");
                return self.fallback().await;
            }
        };

        if is_cacheable(request, &snapshot) {
            let own_key = request.key();
            if own_key == self.index_key {
                store_quietly(&self.store, &own_key, &snapshot).await;
            } else {
                tokio::join!(
                    store_quietly(&self.store, &own_key, &snapshot),
                    store_quietly(&self.store, &self.index_key, &snapshot),
                );
            }
        }

        snapshot.into_response(ResponseSource::Network)
    }

    async fn fallback(&self) -> Response {
        match self.store.get(&self.index_key).await {
            Ok(Some(snapshot)) => snapshot.into_response(ResponseSource::Cache),
            Ok(None) => Response::offline(&self.offline_html),
            Err(e) => {
                tracing::warn!(key = %self.index_key, error = %e, "index lookup failed; serving offline page");
                Response::offline(&self.offline_html)
            }
        }
    }
}
