//! Scripted in-process transport for strategy and lifecycle tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use offcache_client::Transport;
use offcache_core::{Error, Request, Snapshot};
use url::Url;

pub(crate) const ORIGIN: &str = "http://localhost:3000";

pub(crate) fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

#[derive(Clone)]
enum Reply {
    Respond(Snapshot),
    Fail,
    Hang,
}

/// Unscripted URLs fail like an unreachable network.
#[derive(Default)]
pub(crate) struct StubTransport {
    replies: Mutex<HashMap<String, Reply>>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl StubTransport {
    pub(crate) fn respond(&self, path: &str, status: u16, body: &'static str) {
        let snapshot = Snapshot::new(status, vec![("content-type".into(), "text/plain".into())], body);
        self.replies.lock().unwrap().insert(url(path).to_string(), Reply::Respond(snapshot));
    }

    pub(crate) fn fail(&self, path: &str) {
        self.replies.lock().unwrap().insert(url(path).to_string(), Reply::Fail);
    }

    /// The fetch for `path` never settles.
    pub(crate) fn hang(&self, path: &str) {
        self.replies.lock().unwrap().insert(url(path).to_string(), Reply::Hang);
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn fetch(&self, request: &Request) -> Result<Snapshot, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::HttpError("network error: offline".into()));
        }
        let reply = self.replies.lock().unwrap().get(request.url.as_str()).cloned();
        match reply {
            Some(Reply::Respond(snapshot)) => Ok(snapshot),
            Some(Reply::Hang) => std::future::pending().await,
            Some(Reply::Fail) | None => Err(Error::HttpError(format!("network error: {}", request.url))),
        }
    }
}
