//! Main Settee client implementation.
//!
//! # Examples
//!
//! ## Writing documents
//!
//! ```ignore
//! use serde_json::json;
//! use settee::{ClientConfig, SetteeClient};
//! use settee::operations::PutBulkDocsOperation;
//!
//! #[tokio::main]
//! async fn main() -> settee::Result<()> {
//!     let client = SetteeClient::new("http://localhost:5984", ClientConfig::default())?;
//!     let op = PutBulkDocsOperation::new("exampledb", vec![json!({"hello": "world"})])
//!         .with_handler(|result| println!("{:?}", result));
//!     client.add(op).wait().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Following a change feed
//!
//! ```ignore
//! use futures::StreamExt;
//!
//! let mut changes = client.long_poll_stream("/exampledb/_changes", &[("feed", "longpoll")])?;
//! while let Some(result) = changes.next().await {
//!     println!("{:?}", result);
//! }
//! ```

use crate::client::{compose_url, ClientConfig, OperationQueue, OperationTask};
use crate::error::{Result, SetteeError};
use crate::http::{HttpSession, LongPollStream, LongPollingDelegate, LongPollingRequest, Transport};
use crate::operations::CouchOperation;
use std::sync::{Arc, Weak};
use url::Url;

/// Client for running operations against a CouchDB server.
#[derive(Clone)]
pub struct SetteeClient {
    queue: OperationQueue,
    config: Arc<ClientConfig>,
}

impl SetteeClient {
    /// Version of this crate.
    pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    /// Create a client for the server at `url`, using a reqwest session.
    ///
    /// # Errors
    ///
    /// Same as [`with_session`](Self::with_session).
    pub fn new(url: &str, config: ClientConfig) -> Result<Self> {
        let session: Arc<dyn Transport> = Arc::new(HttpSession::new(config.clone()));
        Self::with_session(url, session, config)
    }

    /// Create a client that performs requests through `session`.
    ///
    /// # Errors
    ///
    /// - [`SetteeError::MalformedUrl`] if `url` is not an absolute address
    /// - [`SetteeError::Config`] if `max_concurrent_operations` is `Some(0)`
    pub fn with_session(url: &str, session: Arc<dyn Transport>, config: ClientConfig) -> Result<Self> {
        if config.max_concurrent_operations == Some(0) {
            return Err(SetteeError::Config(
                "max_concurrent_operations must be at least 1".into(),
            ));
        }

        let parsed = Url::parse(url).map_err(|e| SetteeError::MalformedUrl(format!("{url:?}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(SetteeError::MalformedUrl(format!("{url:?} cannot carry a path")));
        }

        tracing::debug!(root = %parsed, ?config, "creating client");
        let queue = OperationQueue::new(url.to_string(), session, config.max_concurrent_operations);
        Ok(SetteeClient {
            queue,
            config: Arc::new(config),
        })
    }

    /// Queue `operation` for execution and return its task.
    ///
    /// Must be called within a Tokio runtime.
    pub fn add(&self, operation: impl CouchOperation) -> Arc<OperationTask> {
        let task = OperationTask::new(operation);
        self.add_task(task.clone());
        task
    }

    /// Queue an existing task.
    pub fn add_task(&self, task: Arc<OperationTask>) {
        self.queue.add(task);
    }

    /// Long-poll `path` (relative to the server root), delivering each result
    /// to `delegate`.
    ///
    /// Polling continues until the returned request is stopped or dropped.
    pub fn long_poll(
        &self,
        path: &str,
        query: &[(&str, &str)],
        delegate: Weak<dyn LongPollingDelegate>,
    ) -> Result<LongPollingRequest> {
        let url = self.endpoint_url(path, query)?;
        let mut request = LongPollingRequest::new(delegate, self.queue.session().clone());
        request.poll_url(url);
        Ok(request)
    }

    /// Long-poll the change feed of `database`.
    pub fn long_poll_changes(
        &self,
        database: &str,
        delegate: Weak<dyn LongPollingDelegate>,
    ) -> Result<LongPollingRequest> {
        self.long_poll(&format!("/{database}/_changes"), &[("feed", "longpoll")], delegate)
    }

    /// Long-poll `path`, yielding results as a stream.
    pub fn long_poll_stream(&self, path: &str, query: &[(&str, &str)]) -> Result<LongPollStream> {
        let url = self.endpoint_url(path, query)?;
        Ok(LongPollStream::start(url, self.queue.session().clone()))
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The server root address.
    pub fn root_url(&self) -> &str {
        self.queue.root_url()
    }

    fn endpoint_url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let query: Vec<(String, String)> = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        compose_url(self.queue.root_url(), path, &query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::mock::MockTransport;

    #[test]
    fn test_client_creation() {
        let client = SetteeClient::new("http://localhost:5984", ClientConfig::default()).unwrap();
        assert_eq!(client.root_url(), "http://localhost:5984");
        assert_eq!(client.config().back_off_attempts, 3);
    }

    #[test]
    fn test_malformed_root() {
        let result = SetteeClient::new("localhost:5984 nope", ClientConfig::default());
        assert!(matches!(result, Err(SetteeError::MalformedUrl(_))));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = ClientConfig::default().with_max_concurrent_operations(0);
        let result = SetteeClient::with_session("http://localhost:5984", MockTransport::new(), config);
        assert!(matches!(result, Err(SetteeError::Config(_))));

        let config = ClientConfig::default().with_max_concurrent_operations(1);
        assert!(SetteeClient::with_session("http://localhost:5984", MockTransport::new(), config).is_ok());
    }

    #[test]
    fn test_endpoint_url() {
        let client = SetteeClient::with_session(
            "http://localhost:5984/?tenant=t",
            MockTransport::new(),
            ClientConfig::default(),
        )
        .unwrap();
        let url = client
            .endpoint_url("/db/_changes", &[("feed", "longpoll")])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:5984/db/_changes?tenant=t&feed=longpoll");
    }
}
