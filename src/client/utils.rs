//! Utility functions for the Settee client.
//!
//! This module provides helper functions for:
//! - Status code classification (rate limiting, retryable failures)
//! - Exponential backoff delays
//! - Header conversion
//! - Address composition shared by the request builder and the long-poll loop

use crate::error::{Result, SetteeError};
use http::HeaderMap;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Check if status code indicates the server is rate limiting us.
pub fn is_rate_limited(status: u16) -> bool {
    status == 429
}

/// Check if status code indicates a transient failure.
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 425 | 429 | 502 | 503 | 504)
}

/// Exponential backoff delay calculation.
///
/// Returns `base * 2^attempt`, with the exponent clamped to 10.
pub fn exponential_backoff(attempt: u32, base: Duration) -> Duration {
    base.saturating_mul(2_u32.pow(attempt.min(10)))
}

/// Convert transport headers into a lowercase-keyed map.
///
/// Values that are not visible ASCII are dropped; for repeated headers the
/// last value wins.
pub fn headers_to_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            map.insert(name.as_str().to_ascii_lowercase(), value.to_string());
        }
    }
    map
}

/// Combine a root address with a path and extra query parameters.
///
/// The root's path is replaced by `path`. Query parameters already present on
/// the root come first, followed by `query` in order; duplicates are kept.
///
/// # Examples
///
/// ```
/// use settee::client::compose_url;
///
/// let url = compose_url(
///     "https://host/db?a=1",
///     "/db/_changes",
///     &[("feed".to_string(), "longpoll".to_string())],
/// )
/// .unwrap();
/// assert_eq!(url.as_str(), "https://host/db/_changes?a=1&feed=longpoll");
/// ```
pub fn compose_url(root: &str, path: &str, query: &[(String, String)]) -> Result<Url> {
    let mut url = Url::parse(root)
        .map_err(|e| SetteeError::UrlGeneration(format!("{root:?}: {e}")))?;

    if url.cannot_be_a_base() {
        return Err(SetteeError::UrlGeneration(format!(
            "{root:?} cannot carry a path"
        )));
    }
    if !path.is_empty() && !path.starts_with('/') {
        return Err(SetteeError::UrlGeneration(format!(
            "path {path:?} must be absolute"
        )));
    }

    let mut items: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    items.extend(query.iter().cloned());

    url.set_path(path);
    if items.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(items.iter());
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_is_rate_limited() {
        assert!(is_rate_limited(429));
        assert!(!is_rate_limited(503));
    }

    #[test]
    fn test_is_retryable_status() {
        assert!(is_retryable_status(503));
        assert!(is_retryable_status(429));
        assert!(!is_retryable_status(404));
    }

    #[test]
    fn test_exponential_backoff() {
        let base = Duration::from_millis(250);
        assert_eq!(exponential_backoff(0, base), Duration::from_millis(250));
        assert_eq!(exponential_backoff(1, base), Duration::from_millis(500));
        assert_eq!(exponential_backoff(3, base), Duration::from_millis(2000));
        assert_eq!(exponential_backoff(40, base), exponential_backoff(10, base));
    }

    #[test]
    fn test_headers_to_map() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Couch-Request-ID", HeaderValue::from_static("abc"));
        let map = headers_to_map(&headers);
        assert_eq!(map.get("x-couch-request-id").map(String::as_str), Some("abc"));
    }

    #[test]
    fn test_compose_url_replaces_path() {
        let url = compose_url("https://host/db", "/db/_bulk_docs", &[]).unwrap();
        assert_eq!(url.as_str(), "https://host/db/_bulk_docs");
    }

    #[test]
    fn test_compose_url_keeps_query_order() {
        let url = compose_url(
            "https://host/?a=1&b=2",
            "/db/_all_docs",
            &pairs(&[("c", "3"), ("a", "4")]),
        )
        .unwrap();
        let got: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(got, pairs(&[("a", "1"), ("b", "2"), ("c", "3"), ("a", "4")]));
    }

    #[test]
    fn test_compose_url_rejects_garbage() {
        assert!(matches!(
            compose_url("not a url", "/db", &[]),
            Err(SetteeError::UrlGeneration(_))
        ));
        assert!(matches!(
            compose_url("mailto:someone@example.com", "/db", &[]),
            Err(SetteeError::UrlGeneration(_))
        ));
        assert!(matches!(
            compose_url("https://host", "db/doc", &[]),
            Err(SetteeError::UrlGeneration(_))
        ));
    }
}
