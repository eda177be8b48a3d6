//! reqwest-backed [`Transport`].
//!
//! [`HttpSession`] performs each request on a spawned Tokio task, streams the
//! body to the delegate chunk by chunk, and transparently retries 429
//! responses with a doubling delay when the client is configured to back off.
//!
//! # Examples
//!
//! ```ignore
//! use settee::client::ClientConfig;
//! use settee::http::HttpSession;
//!
//! let session = HttpSession::new(ClientConfig::default().with_back_off(3, 250));
//! ```

use crate::client::{is_rate_limited, ClientConfig};
use crate::error::SetteeError;
use crate::http::{BackoffState, SessionDelegate, SessionTask, Transport};
use crate::types::HttpRequest;
use futures::StreamExt;
use std::sync::Arc;
use tokio::time::sleep;

/// The shared network session of a client.
///
/// Cheap to clone; clones share the connection pool and configuration.
#[derive(Clone)]
pub struct HttpSession {
    client: reqwest::Client,
    config: Arc<ClientConfig>,
}

impl HttpSession {
    /// Create a session for `config`.
    pub fn new(config: ClientConfig) -> Self {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .pool_max_idle_per_host(config.max_idle_connections)
            .build()
            .unwrap_or_default();

        HttpSession {
            client,
            config: Arc::new(config),
        }
    }

    /// The configuration this session was created with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn prepare(&self, request: &HttpRequest) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .timeout(request.timeout)
            .headers(request.headers.clone());

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        if let Some(username) = &self.config.username {
            builder = builder.basic_auth(username, self.config.password.as_deref());
        }
        builder
    }

    /// Run one request to completion, reporting to `delegate`.
    async fn perform(&self, request: HttpRequest, delegate: &dyn SessionDelegate) {
        let mut backoff = BackoffState::from_config(&self.config);

        let response = loop {
            match self.prepare(&request).send().await {
                Ok(response) if is_rate_limited(response.status().as_u16()) => {
                    match backoff.next_delay() {
                        Some(delay) => {
                            if self.config.enable_logging {
                                tracing::warn!(
                                    "Rate limited (attempt {}), retrying {} after {:?}",
                                    backoff.attempts(),
                                    request.url,
                                    delay
                                );
                            }
                            sleep(delay).await;
                        }
                        None => break response,
                    }
                }
                Ok(response) => break response,
                Err(e) => {
                    delegate.completed(Some(e.into()));
                    return;
                }
            }
        };

        delegate.received_response(response.status(), response.headers().clone());

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(chunk) => delegate.received_data(chunk),
                Err(e) => {
                    delegate.completed(Some(e.into()));
                    return;
                }
            }
        }

        delegate.completed(None);
    }
}

impl Transport for HttpSession {
    fn data_task(&self, request: HttpRequest, delegate: Arc<dyn SessionDelegate>) -> SessionTask {
        let task = SessionTask::new();
        let token = task.token().clone();
        let session = self.clone();

        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {
                    tracing::debug!(url = %request.url, "transport task cancelled");
                    delegate.completed(Some(SetteeError::Cancelled));
                }
                () = session.perform(request.clone(), delegate.as_ref()) => {}
            }
        });

        task
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_keeps_config() {
        let session = HttpSession::new(ClientConfig::default().with_back_off(4, 10));
        assert!(session.config().should_back_off);
        assert_eq!(session.config().back_off_attempts, 4);
    }
}
