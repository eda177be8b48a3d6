//! Single-flight long polling.
//!
//! A [`LongPollingRequest`] repeatedly issues the same request. Every outcome,
//! success or failure, is handed to its delegate and immediately followed by
//! the next request, with no delay in between. At most one request is in
//! flight at any time.
//!
//! The loop only holds a [`Weak`] reference to its delegate. When the delegate
//! is dropped, delivery becomes a no-op. Polling itself is halted with
//! [`LongPollingRequest::stop`] or by dropping the request.
//!
//! # Examples
//!
//! ```ignore
//! use bytes::Bytes;
//! use settee::http::{LongPollingDelegate, LongPollingRequest};
//! use std::sync::{Arc, Weak};
//!
//! struct Printer;
//!
//! impl LongPollingDelegate for Printer {
//!     fn received(&self, result: settee::Result<Bytes>) {
//!         println!("{:?}", result);
//!     }
//! }
//!
//! let printer: Arc<dyn LongPollingDelegate> = Arc::new(Printer);
//! let mut poller = LongPollingRequest::new(Arc::downgrade(&printer), session);
//! poller.poll("http://localhost:5984/db/_changes?feed=longpoll")?;
//! ```

use crate::error::{Result, SetteeError};
use crate::http::{SessionDelegate, Transport, LONG_POLL_TIMEOUT};
use crate::types::HttpRequest;
use bytes::{Bytes, BytesMut};
use http::{HeaderMap, StatusCode};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Receives the outcome of every poll.
pub trait LongPollingDelegate: Send + Sync {
    /// One poll finished with a body (`Ok`) or a failure (`Err`).
    fn received(&self, result: Result<Bytes>);
}

/// A self-resubmitting poll loop over one address.
pub struct LongPollingRequest {
    delegate: Weak<dyn LongPollingDelegate>,
    session: Arc<dyn Transport>,
    stop: Option<CancellationToken>,
}

impl LongPollingRequest {
    /// Create an idle loop that will deliver to `delegate` via `session`.
    pub fn new(delegate: Weak<dyn LongPollingDelegate>, session: Arc<dyn Transport>) -> Self {
        LongPollingRequest {
            delegate,
            session,
            stop: None,
        }
    }

    /// Start polling `endpoint_url` on a background task.
    ///
    /// Any previous loop run by this request is stopped first, so there is
    /// never more than one outstanding poll. Must be called within a Tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// [`SetteeError::MalformedUrl`] if `endpoint_url` cannot be parsed; no
    /// request is issued in that case.
    pub fn poll(&mut self, endpoint_url: &str) -> Result<()> {
        let url = Url::parse(endpoint_url)
            .map_err(|e| SetteeError::MalformedUrl(format!("{endpoint_url:?}: {e}")))?;
        self.poll_url(url);
        Ok(())
    }

    /// Start polling an already parsed address.
    pub fn poll_url(&mut self, url: Url) {
        self.stop();

        let token = CancellationToken::new();
        self.stop = Some(token.clone());

        tracing::debug!(%url, "starting long poll");
        let request = HttpRequest::get(url, LONG_POLL_TIMEOUT);
        tokio::spawn(poll_loop(
            request,
            self.session.clone(),
            self.delegate.clone(),
            token,
        ));
    }

    /// Stop polling and cancel the outstanding request. Idempotent.
    pub fn stop(&mut self) {
        if let Some(token) = self.stop.take() {
            token.cancel();
        }
    }

    /// Whether a poll loop is running.
    pub fn is_polling(&self) -> bool {
        self.stop.as_ref().is_some_and(|token| !token.is_cancelled())
    }
}

impl Drop for LongPollingRequest {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Outcome of one poll as seen by the transport.
enum PollOutcome {
    Data(Bytes),
    Failure(SetteeError),
}

/// Collects one transport task into a [`PollOutcome`].
struct PollCollector {
    buffer: Mutex<BytesMut>,
    outcome: Mutex<Option<oneshot::Sender<PollOutcome>>>,
}

impl PollCollector {
    fn new(outcome: oneshot::Sender<PollOutcome>) -> Self {
        PollCollector {
            buffer: Mutex::new(BytesMut::new()),
            outcome: Mutex::new(Some(outcome)),
        }
    }
}

impl SessionDelegate for PollCollector {
    fn received_response(&self, status: StatusCode, _headers: HeaderMap) {
        tracing::trace!(%status, "long poll response");
    }

    fn received_data(&self, data: Bytes) {
        self.buffer.lock().extend_from_slice(&data);
    }

    fn completed(&self, error: Option<SetteeError>) {
        let outcome = match error {
            Some(err) => PollOutcome::Failure(err),
            None => PollOutcome::Data(std::mem::take(&mut *self.buffer.lock()).freeze()),
        };
        if let Some(sender) = self.outcome.lock().take() {
            let _ = sender.send(outcome);
        }
    }
}

async fn poll_loop(
    request: HttpRequest,
    session: Arc<dyn Transport>,
    delegate: Weak<dyn LongPollingDelegate>,
    stop: CancellationToken,
) {
    loop {
        // stop() may have landed while the delegate handled the last result.
        if stop.is_cancelled() {
            tracing::debug!(url = %request.url, "long poll stopped");
            break;
        }

        let (tx, rx) = oneshot::channel();
        let collector: Arc<dyn SessionDelegate> = Arc::new(PollCollector::new(tx));
        let task = session.data_task(request.clone(), collector);

        let outcome = tokio::select! {
            biased;
            () = stop.cancelled() => {
                task.cancel();
                tracing::debug!(url = %request.url, "long poll stopped");
                break;
            }
            outcome = rx => outcome,
        };

        let result = match outcome {
            Ok(PollOutcome::Data(data)) => Ok(data),
            Ok(PollOutcome::Failure(err)) => Err(err),
            Err(_) => {
                tracing::warn!(
                    url = %request.url,
                    "transport dropped a long poll without completing, halting"
                );
                break;
            }
        };

        match delegate.upgrade() {
            Some(delegate) => delegate.received(result),
            None => tracing::trace!("long poll delegate gone, dropping result"),
        }
    }
}
