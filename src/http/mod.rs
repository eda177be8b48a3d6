//! The request execution pipeline.
//!
//! This module turns an abstract operation into network traffic and back:
//!
//! ```text
//! HttpRequestOperation ──► OperationRequestBuilder ──► HttpRequest
//!                                                        │
//!           RequestExecutor ◄── SessionDelegate ◄── Transport::data_task
//!                 │
//!                 └──► process_response(data, info, error) ──► complete_operation()
//! ```
//!
//! # Module Organization
//!
//! ```text
//! http/
//! ├── builder         - HttpRequestOperation contract and request construction
//! ├── executor        - per-request state machine with exactly-once completion
//! ├── session         - transport capability contract
//! ├── reqwest_session - reqwest-backed transport with 429 backoff
//! ├── backoff         - per-request backoff bookkeeping
//! ├── long_poll       - self-resubmitting single-flight poll loop
//! └── poll_stream     - Stream adapter over the poll loop
//! ```

mod backoff;
mod builder;
mod executor;
mod long_poll;
mod poll_stream;
mod reqwest_session;
mod session;

#[cfg(test)]
pub(crate) mod mock;

use std::time::Duration;

pub use backoff::{BackoffState, MAX_BACK_OFF_ATTEMPTS};
pub use builder::{HttpRequestOperation, OperationRequestBuilder};
pub use executor::{ExecutorPhase, RequestExecutor};
pub use long_poll::{LongPollingDelegate, LongPollingRequest};
pub use poll_stream::LongPollStream;
pub use reqwest_session::HttpSession;
pub use session::{SessionDelegate, SessionTask, Transport};

/// Timeout applied to every request built from an operation.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout applied to each long-poll request.
///
/// Kept well above CouchDB's default `changes_timeout` of 60 s, so an idle
/// feed is closed by the server with an empty result rather than failing
/// client-side with [`SetteeError::Timeout`](crate::SetteeError::Timeout).
pub const LONG_POLL_TIMEOUT: Duration = Duration::from_secs(90);
