//! Transport capability contract.
//!
//! The pipeline never performs I/O itself. It hands a built [`HttpRequest`] to
//! a [`Transport`] together with a [`SessionDelegate`], and the transport
//! reports back through the delegate in this order:
//!
//! 1. at most one [`received_response`](SessionDelegate::received_response)
//! 2. zero or more [`received_data`](SessionDelegate::received_data)
//! 3. exactly one [`completed`](SessionDelegate::completed)
//!
//! Any retry policy (such as backing off on 429) lives entirely inside the
//! transport; the delegate only sees the final exchange.

use crate::error::SetteeError;
use crate::types::HttpRequest;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Receives the streamed outcome of one transport task.
///
/// Callbacks may arrive on any thread.
pub trait SessionDelegate: Send + Sync {
    /// Response status and headers arrived.
    fn received_response(&self, status: StatusCode, headers: HeaderMap);

    /// A chunk of the response body arrived.
    fn received_data(&self, data: Bytes);

    /// The task finished. `error` is `None` on success.
    fn completed(&self, error: Option<SetteeError>);
}

/// Performs HTTP requests on behalf of the pipeline.
pub trait Transport: Send + Sync {
    /// Start `request`, streaming its outcome to `delegate`.
    ///
    /// Returns immediately with a handle that can cancel the task. A cancelled
    /// task still reports `completed`, carrying [`SetteeError::Cancelled`].
    fn data_task(&self, request: HttpRequest, delegate: Arc<dyn SessionDelegate>) -> SessionTask;
}

/// Handle to an in-flight transport task.
#[derive(Debug, Clone, Default)]
pub struct SessionTask {
    token: CancellationToken,
}

impl SessionTask {
    /// Create a handle with a fresh cancellation token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The token transports select on to observe cancellation.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}
