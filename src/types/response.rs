//! Response metadata.

use http::{HeaderMap, StatusCode};
use std::collections::BTreeMap;

/// Status code and headers of a completed HTTP response.
///
/// Built once per request, after the whole body has arrived. Header names are
/// lowercase, as normalised by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseInfo {
    /// HTTP status code.
    pub status_code: u16,
    /// Response headers keyed by lowercase name.
    pub headers: BTreeMap<String, String>,
}

impl ResponseInfo {
    /// Assemble response info from transport metadata.
    ///
    /// Header values that are not valid UTF-8 are skipped. For repeated
    /// headers the last value wins.
    pub fn from_parts(status: StatusCode, headers: &HeaderMap) -> Self {
        ResponseInfo {
            status_code: status.as_u16(),
            headers: crate::client::headers_to_map(headers),
        }
    }

    /// Look up a header by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Whether the status code is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}
