#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! # Settee: a CouchDB request pipeline
//!
//! Settee runs CouchDB operations through a managed pipeline. Each operation
//! describes a request. The client queues it, builds the HTTP request against
//! the configured server root, executes it on a shared session and hands the
//! buffered response back to the operation.
//!
//! ## Overview
//!
//! 1. **Operations** - [`CouchOperation`](operations::CouchOperation) values
//!    describe endpoint, method, query and payload
//! 2. **Tasks** - [`OperationTask`](client::OperationTask) wraps an operation
//!    for the queue and can be cancelled or awaited
//! 3. **Execution** - [`RequestExecutor`](crate::http::RequestExecutor) buffers the
//!    response and reports the outcome exactly once
//! 4. **Long polling** - [`LongPollingRequest`](crate::http::LongPollingRequest)
//!    follows change feeds with one request in flight at a time
//!
//! Responses with status 429 are retried with a doubling delay when the
//! client is configured to back off, never more than
//! [`MAX_BACK_OFF_ATTEMPTS`](crate::http::MAX_BACK_OFF_ATTEMPTS) times.
//!
//! ## Module Structure
//!
//! - **[client]** - Client, queue, tasks and configuration
//! - **[http](crate::http)** - Request building, execution, transport and long polling
//! - **[operations]** - Operation contract and the built-in operations
//! - **[types]** - Requests, responses and documents
//! - **[error]** - Error types and result handling

pub mod client;
pub mod error;
pub mod http;
pub mod operations;
pub mod types;

pub use client::{ClientConfig, OperationTask, SetteeClient, TaskState};
pub use error::{Result, SetteeError};
pub use crate::http::{LongPollStream, LongPollingDelegate, LongPollingRequest};
pub use operations::{CouchOperation, PutBulkDocsOperation};
pub use types::{Document, RequestBody, ResponseInfo};
