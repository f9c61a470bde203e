//! Response snapshots and the responses handed back to the page.
//!
//! A network body can only be read once, so the transport reads it a single
//! time into an immutable [`Bytes`] buffer. Storing a snapshot and returning
//! it to the caller both read from that buffer; cloning shares it.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Immutable capture of a response (status, headers, body).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    /// RFC 3339 timestamp of when the response was captured.
    pub fetched_at: String,
}

impl Snapshot {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        Self { status, headers, body: body.into(), fetched_at: chrono::Utc::now().to_rfc3339() }
    }

    /// 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        header_value(&self.headers, name)
    }

    pub fn into_response(self, source: ResponseSource) -> Response {
        Response { status: self.status, headers: self.headers, body: self.body, source }
    }
}

/// Where a response handed to the page came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    Cache,
    /// Synthetic placeholder for a navigation with neither network nor cache.
    OfflineFallback,
    /// Generic failure for a sub-resource with neither network nor cache.
    Unavailable,
}

/// Header marking the synthetic offline page.
pub const OFFLINE_FALLBACK_HEADER: &str = "x-offline-fallback";

/// Status of the generic "unavailable" response (Gateway Timeout).
pub const UNAVAILABLE_STATUS: u16 = 504;

/// A response handed back to the controlled page. Never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub source: ResponseSource,
}

impl Response {
    /// Minimal offline document, explicitly marked as degraded.
    pub fn offline(html: &str) -> Self {
        Self {
            status: 200,
            headers: vec![
                ("content-type".to_string(), "text/html; charset=utf-8".to_string()),
                (OFFLINE_FALLBACK_HEADER.to_string(), "1".to_string()),
            ],
            body: Bytes::copy_from_slice(html.as_bytes()),
            source: ResponseSource::OfflineFallback,
        }
    }

    /// Empty response with [`UNAVAILABLE_STATUS`].
    pub fn unavailable() -> Self {
        Self { status: UNAVAILABLE_STATUS, headers: Vec::new(), body: Bytes::new(), source: ResponseSource::Unavailable }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.source, ResponseSource::OfflineFallback | ResponseSource::Unavailable)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        header_value(&self.headers, name)
    }
}

fn header_value<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
