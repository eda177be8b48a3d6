//! Operations that can be run against a CouchDB server.
//!
//! An operation describes a request (endpoint, method, query, payload) and
//! interprets the response. It never touches the network: the
//! [`SetteeClient`](crate::SetteeClient) wraps it in an
//! [`OperationTask`](crate::client::OperationTask) that supplies the root
//! address and session, builds the request and delivers the outcome.
//!
//! | Operation | Endpoint |
//! |-----------|----------|
//! | [`PutBulkDocsOperation`] | `POST /{db}/_bulk_docs` |
//!
//! Custom operations implement [`CouchOperation`] directly.

mod bulk_docs;

pub use bulk_docs::{BulkDocResult, BulkDocsHandler, BulkDocsResponse, PutBulkDocsOperation};

use crate::error::{Result, SetteeError};
use crate::types::{RequestBody, ResponseInfo};
use bytes::Bytes;
use http::Method;

/// A request against the server plus the handling of its response.
///
/// Hooks are called from arbitrary threads. `process_response` is called at
/// most once, `complete_operation` exactly once, always after
/// `process_response`.
pub trait CouchOperation: Send + Sync + 'static {
    /// Absolute request path, e.g. `/exampledb/_bulk_docs`.
    fn endpoint(&self) -> String;

    /// HTTP method. Defaults to `GET`.
    fn method(&self) -> Method {
        Method::GET
    }

    /// Query parameters for the request.
    fn query_items(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Check the operation's inputs. Returning `false` fails the operation
    /// with [`SetteeError::Validation`] before any request is built.
    fn validate(&self) -> bool {
        true
    }

    /// Encode the request payload, if any.
    fn serialise(&self) -> Result<Option<RequestBody>> {
        Ok(None)
    }

    /// Interpret the outcome of the request.
    fn process_response(
        &self,
        data: Option<Bytes>,
        info: Option<ResponseInfo>,
        error: Option<SetteeError>,
    );

    /// Called once the operation is finished, whatever the outcome.
    fn complete_operation(&self) {}
}
