//! Settee client implementation.
//!
//! The client owns an [`OperationQueue`] and the shared network session. Each
//! operation added to it is wrapped in an [`OperationTask`], scheduled on the
//! queue, and executed through the [`http`](crate::http) pipeline.
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── settee - SetteeClient: construction, add, long polling
//! ├── queue  - OperationQueue: session injection and concurrency bound
//! ├── task   - OperationTask: lifecycle and cancellation
//! ├── config - Client configuration
//! └── utils  - Utility functions
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SetteeClient`] | Entry point for running operations |
//! | [`OperationTask`] | Handle to a queued operation |
//! | [`OperationQueue`] | Concurrent task runner |
//! | [`ClientConfig`] | Client configuration options |
//!
//! # Utility Functions
//!
//! ```
//! use settee::client::{exponential_backoff, is_rate_limited};
//! use std::time::Duration;
//!
//! assert!(is_rate_limited(429));
//! assert!(!is_rate_limited(503));
//!
//! let delay = exponential_backoff(2, Duration::from_millis(100));
//! assert_eq!(delay, Duration::from_millis(400));
//! ```

mod config;
mod queue;
mod settee;
mod task;
mod utils;

pub use config::ClientConfig;
pub use queue::OperationQueue;
pub use settee::SetteeClient;
pub use task::{OperationTask, TaskState};
pub use utils::*;
