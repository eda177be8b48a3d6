//! Request-side value types.

use bytes::Bytes;
use http::{header::CONTENT_TYPE, HeaderMap, Method};
use std::time::Duration;
use url::Url;

/// A request payload together with the content type that describes it.
///
/// Pairing the two makes "content type present iff body present" a property of
/// the type rather than a convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBody {
    /// Raw payload bytes.
    pub data: Bytes,
    /// Value of the `Content-Type` header sent with `data`.
    pub content_type: String,
}

impl RequestBody {
    /// Create a body from bytes and a content type.
    pub fn new(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        RequestBody {
            data: data.into(),
            content_type: content_type.into(),
        }
    }

    /// Create an `application/json` body.
    pub fn json(data: impl Into<Bytes>) -> Self {
        Self::new(data, "application/json")
    }
}

/// A concrete HTTP request produced by
/// [`OperationRequestBuilder`](crate::http::OperationRequestBuilder).
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Final address, including merged query parameters.
    pub url: Url,
    /// HTTP method.
    pub method: Method,
    /// Time allowed for the whole exchange.
    pub timeout: Duration,
    /// Request headers.
    pub headers: HeaderMap,
    /// Optional payload.
    pub body: Option<Bytes>,
}

impl HttpRequest {
    /// A body-less `GET` request.
    pub fn get(url: Url, timeout: Duration) -> Self {
        HttpRequest {
            url,
            method: Method::GET,
            timeout,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// The `Content-Type` header, if set.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }
}
