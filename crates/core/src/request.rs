//! Intercepted requests and their normalized cache keys.
//!
//! ### Key normalization
//! - Method is upper-cased
//! - Host is lower-cased, fragment removed
//! - Query string kept as-is (not reordered)

use std::fmt;

use url::Url;

use crate::Error;

/// What the page intends to do with the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Loading a new top-level document.
    Navigate,
    /// Any sub-resource fetch (scripts, styles, images, data).
    #[default]
    Subresource,
}

/// A request intercepted from the controlled page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub mode: RequestMode,
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// A `GET` sub-resource request for `url`.
    pub fn get(url: Url) -> Self {
        Self { method: "GET".to_string(), url, mode: RequestMode::Subresource, headers: Vec::new() }
    }

    /// A `GET` top-level navigation to `url`.
    pub fn navigate(url: Url) -> Self {
        Self { mode: RequestMode::Navigate, ..Self::get(url) }
    }

    /// Parse `url` and build a `GET` sub-resource request.
    pub fn parse(url: &str) -> Result<Self, Error> {
        let url = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
        Ok(Self::get(url))
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    /// The normalized key this request is stored under.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(&self.method, &self.url)
    }
}

/// Normalized identifier (method + URL) indexing a store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey {
    method: String,
    url: Url,
}

impl RequestKey {
    pub fn new(method: &str, url: &Url) -> Self {
        Self { method: method.trim().to_ascii_uppercase(), url: normalize_url(url) }
    }

    /// A `GET` key for `url`.
    pub fn get(url: &Url) -> Self {
        Self::new("GET", url)
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Hosts of http(s) URLs are already lower-cased by the parser.
fn normalize_url(url: &Url) -> Url {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_key_uppercases_method() {
        let key = RequestKey::new("get", &url("https://example.com/app.js"));
        assert_eq!(key.method(), "GET");
    }

    #[test]
    fn test_key_drops_fragment() {
        let a = RequestKey::get(&url("https://example.com/index.html#scores"));
        let b = RequestKey::get(&url("https://example.com/index.html"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_host_is_case_insensitive() {
        let a = RequestKey::get(&url("https://Example.COM/icon.png"));
        let b = RequestKey::get(&url("https://example.com/icon.png"));
        assert_eq!(a, b);
        assert_eq!(a.url().host_str(), Some("example.com"));
    }

    #[test]
    fn test_key_preserves_query() {
        let key = RequestKey::get(&url("https://example.com/api/scores?limit=10&b=2"));
        assert_eq!(key.url().query(), Some("limit=10&b=2"));
    }

    #[test]
    fn test_key_distinguishes_method() {
        let get = RequestKey::new("GET", &url("https://example.com/api/scores"));
        let post = RequestKey::new("POST", &url("https://example.com/api/scores"));
        assert_ne!(get, post);
    }

    #[test]
    fn test_key_display() {
        let key = Request::parse("https://example.com/icon.png").unwrap().key();
        assert_eq!(key.to_string(), "GET https://example.com/icon.png");
    }

    #[test]
    fn test_navigate_mode() {
        let request = Request::navigate(url("https://example.com/"));
        assert!(request.is_navigation());
        assert!(request.is_get());
        assert!(!Request::get(url("https://example.com/")).is_navigation());
    }

    #[test]
    fn test_parse_invalid() {
        let result = Request::parse("not a url");
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_is_get_case_insensitive() {
        let request = Request::parse("https://example.com/").unwrap().with_method("get");
        assert!(request.is_get());
        assert!(!request.with_method("POST").is_get());
    }
}
