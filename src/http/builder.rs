//! Request construction.
//!
//! [`OperationRequestBuilder`] is a pure function from an
//! [`HttpRequestOperation`] to an [`HttpRequest`]: it merges the query, fixes
//! the timeout and attaches the body. It performs no I/O.

use crate::client::compose_url;
use crate::error::{Result, SetteeError};
use crate::http::{Transport, REQUEST_TIMEOUT};
use crate::types::{HttpRequest, RequestBody, ResponseInfo};
use bytes::Bytes;
use http::{header::CONTENT_TYPE, HeaderMap, HeaderValue, Method};
use std::sync::Arc;

/// Everything the pipeline needs to know about one network operation.
///
/// The executor and builder depend only on this contract, never on concrete
/// operation kinds.
///
/// # Invariant
///
/// [`complete_operation`](Self::complete_operation) is called exactly once per
/// operation, after [`process_response`](Self::process_response) when a result
/// is delivered at all. Both hooks may be called from any thread.
pub trait HttpRequestOperation: Send + Sync {
    /// Root address of the server, e.g. `https://example.cloudant.com`.
    fn root_url(&self) -> &str;

    /// Absolute path of the request, e.g. `/exampledb/document1`.
    fn path(&self) -> &str;

    /// HTTP method.
    fn method(&self) -> &Method;

    /// Query parameters appended after any already on the root address.
    fn query_items(&self) -> &[(String, String)];

    /// Payload and its content type, if the request carries one.
    fn body(&self) -> Option<&RequestBody>;

    /// The transport used to perform the request.
    fn session(&self) -> &Arc<dyn Transport>;

    /// Whether the operation has been cancelled.
    fn is_cancelled(&self) -> bool;

    /// Deliver the outcome of the request.
    ///
    /// `data` is `None` only when no request was made.
    fn process_response(
        &self,
        data: Option<Bytes>,
        info: Option<ResponseInfo>,
        error: Option<SetteeError>,
    );

    /// Signal that the operation is finished.
    fn complete_operation(&self);
}

/// Builds [`HttpRequest`]s from [`HttpRequestOperation`]s.
pub struct OperationRequestBuilder<'a> {
    operation: &'a dyn HttpRequestOperation,
}

impl<'a> OperationRequestBuilder<'a> {
    /// Create a builder for `operation`.
    pub fn new(operation: &'a dyn HttpRequestOperation) -> Self {
        OperationRequestBuilder { operation }
    }

    /// Build the request.
    ///
    /// # Errors
    ///
    /// - [`SetteeError::UrlGeneration`] if the root, path and query do not form
    ///   a valid address
    /// - [`SetteeError::InvalidContentType`] if the body's content type is not
    ///   a valid header value
    pub fn make_request(&self) -> Result<HttpRequest> {
        let op = self.operation;
        let url = compose_url(op.root_url(), op.path(), op.query_items())?;

        let mut headers = HeaderMap::new();
        let body = match op.body() {
            Some(body) => {
                let value = HeaderValue::from_str(&body.content_type)
                    .map_err(|_| SetteeError::InvalidContentType(body.content_type.clone()))?;
                headers.insert(CONTENT_TYPE, value);
                Some(body.data.clone())
            }
            None => None,
        };

        Ok(HttpRequest {
            url,
            method: op.method().clone(),
            timeout: REQUEST_TIMEOUT,
            headers,
            body,
        })
    }
}
