//! Per-request execution.
//!
//! A [`RequestExecutor`] drives one [`HttpRequestOperation`] through the
//! transport. It buffers the streamed body, keeps the latest response
//! metadata and, when the transport reports completion, delivers a single
//! result followed by a single completion signal.
//!
//! # State Machine
//!
//! ```text
//! Idle ──execute()──► Running ──completed()──► Completed
//!   └────────── build failure ────────────────────┘
//! ```
//!
//! Cancellation is cooperative: [`RequestExecutor::cancel`] only asks the
//! transport to stop. The transport's eventual `completed` callback still
//! drives completion, and a cancelled operation receives no result.

use crate::error::SetteeError;
use crate::http::{HttpRequestOperation, OperationRequestBuilder, SessionDelegate, SessionTask};
use crate::types::ResponseInfo;
use bytes::{Bytes, BytesMut};
use http::{HeaderMap, StatusCode};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Lifecycle phase of a [`RequestExecutor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutorPhase {
    /// Created, not yet executed.
    #[default]
    Idle,
    /// Request submitted to the transport.
    Running,
    /// Result (if any) and completion delivered.
    Completed,
}

#[derive(Default)]
struct ExecutorState {
    phase: ExecutorPhase,
    task: Option<SessionTask>,
    buffer: BytesMut,
    response: Option<(StatusCode, HeaderMap)>,
}

/// Executes the HTTP request of one operation.
pub struct RequestExecutor {
    operation: Arc<dyn HttpRequestOperation>,
    state: Mutex<ExecutorState>,
    finished: AtomicBool,
}

impl RequestExecutor {
    /// Create an executor for `operation`.
    pub fn new(operation: Arc<dyn HttpRequestOperation>) -> Arc<Self> {
        Arc::new(RequestExecutor {
            operation,
            state: Mutex::new(ExecutorState::default()),
            finished: AtomicBool::new(false),
        })
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> ExecutorPhase {
        self.state.lock().phase
    }

    /// Build the request and hand it to the operation's transport.
    ///
    /// If the request cannot be built the operation receives the error with no
    /// data, then completes, and the transport is never touched. Calling this
    /// more than once has no effect.
    pub fn execute(self: &Arc<Self>) {
        {
            let mut state = self.state.lock();
            if state.phase != ExecutorPhase::Idle {
                tracing::warn!(phase = ?state.phase, "executor already started, ignoring execute");
                return;
            }
            state.phase = ExecutorPhase::Running;
        }

        let request = match OperationRequestBuilder::new(self.operation.as_ref()).make_request() {
            Ok(request) => request,
            Err(err) => {
                tracing::debug!(error = %err, "request build failed");
                self.state.lock().phase = ExecutorPhase::Completed;
                if !self.finished.swap(true, Ordering::AcqRel) {
                    self.operation.process_response(None, None, Some(err));
                    self.operation.complete_operation();
                }
                return;
            }
        };

        tracing::debug!(method = %request.method, url = %request.url, "submitting request");
        let delegate: Arc<dyn SessionDelegate> = self.clone();
        let task = self.operation.session().data_task(request, delegate);

        let mut state = self.state.lock();
        if state.phase == ExecutorPhase::Running {
            if self.operation.is_cancelled() {
                task.cancel();
            }
            state.task = Some(task);
        }
    }

    /// Ask the transport to cancel the outstanding task, if any.
    ///
    /// Completion still arrives through the transport's `completed` callback.
    pub fn cancel(&self) {
        let task = self.state.lock().task.clone();
        if let Some(task) = task {
            tracing::debug!("cancelling transport task");
            task.cancel();
        }
    }
}

impl SessionDelegate for RequestExecutor {
    fn received_response(&self, status: StatusCode, headers: HeaderMap) {
        self.state.lock().response = Some((status, headers));
    }

    fn received_data(&self, data: Bytes) {
        tracing::trace!(len = data.len(), "received chunk");
        self.state.lock().buffer.extend_from_slice(&data);
    }

    fn completed(&self, error: Option<SetteeError>) {
        let (buffer, response) = {
            let mut state = self.state.lock();
            state.task = None;
            state.phase = ExecutorPhase::Completed;
            (
                std::mem::take(&mut state.buffer).freeze(),
                state.response.take(),
            )
        };

        if self.finished.swap(true, Ordering::AcqRel) {
            tracing::warn!("transport reported completion twice, ignoring");
            return;
        }

        if self.operation.is_cancelled() {
            tracing::debug!("operation cancelled, suppressing result");
            self.operation.complete_operation();
            return;
        }

        let info = response.map(|(status, headers)| ResponseInfo::from_parts(status, &headers));
        self.operation.process_response(Some(buffer), info, error);
        self.operation.complete_operation();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::mock::{MockTransport, RecordingOperation};
    use http::{HeaderValue, Method};

    fn executor_for(op: &Arc<RecordingOperation>) -> Arc<RequestExecutor> {
        let operation: Arc<dyn HttpRequestOperation> = op.clone();
        RequestExecutor::new(operation)
    }

    #[test]
    fn test_streamed_chunks_are_concatenated() {
        let transport = MockTransport::new();
        let op = Arc::new(RecordingOperation::new("https://host", "/db", transport.clone()));
        let executor = executor_for(&op);

        executor.execute();
        assert_eq!(executor.phase(), ExecutorPhase::Running);
        assert_eq!(transport.submissions(), 1);

        let delegate = transport.held_delegate(0);
        let mut headers = HeaderMap::new();
        headers.insert("ETag", HeaderValue::from_static("\"1-a\""));
        delegate.received_response(StatusCode::OK, headers);
        delegate.received_data(Bytes::from_static(b"a"));
        delegate.received_data(Bytes::from_static(b"b"));
        delegate.received_data(Bytes::from_static(b"c"));
        delegate.completed(None);

        let results = op.results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].data.as_deref(), Some(&b"abc"[..]));
        let info = results[0].info.as_ref().unwrap();
        assert_eq!(info.status_code, 200);
        assert_eq!(info.header("etag"), Some("\"1-a\""));
        assert!(results[0].error.is_none());
        assert_eq!(op.completions(), 1);
        assert_eq!(executor.phase(), ExecutorPhase::Completed);
    }

    #[test]
    fn test_result_precedes_completion() {
        let transport = MockTransport::new();
        let op = Arc::new(RecordingOperation::new("https://host", "/db", transport.clone()));
        let executor = executor_for(&op);

        executor.execute();
        transport.held_delegate(0).completed(None);

        assert_eq!(op.events(), vec!["result", "complete"]);
    }

    #[test]
    fn test_last_response_metadata_wins() {
        let transport = MockTransport::new();
        let op = Arc::new(RecordingOperation::new("https://host", "/db", transport.clone()));
        let executor = executor_for(&op);

        executor.execute();
        let delegate = transport.held_delegate(0);
        delegate.received_response(StatusCode::CONTINUE, HeaderMap::new());
        delegate.received_response(StatusCode::CREATED, HeaderMap::new());
        delegate.completed(None);

        let results = op.results();
        assert_eq!(results[0].info.as_ref().unwrap().status_code, 201);
    }

    #[test]
    fn test_network_failure_without_response() {
        let transport = MockTransport::new();
        let op = Arc::new(RecordingOperation::new("https://host", "/db", transport.clone()));
        let executor = executor_for(&op);

        executor.execute();
        transport
            .held_delegate(0)
            .completed(Some(SetteeError::Transport("connection reset".into())));

        let results = op.results();
        assert_eq!(results.len(), 1);
        assert!(results[0].info.is_none());
        assert_eq!(results[0].data.as_deref(), Some(&b""[..]));
        assert!(results[0].error.as_ref().unwrap().contains("connection reset"));
        assert_eq!(op.completions(), 1);
    }

    #[test]
    fn test_build_failure_skips_transport() {
        let transport = MockTransport::new();
        let op = Arc::new(
            RecordingOperation::new("not a url", "/db", transport.clone())
                .with_method(Method::POST),
        );
        let executor = executor_for(&op);

        executor.execute();

        assert_eq!(transport.submissions(), 0);
        let results = op.results();
        assert_eq!(results.len(), 1);
        assert!(results[0].data.is_none());
        assert!(results[0].info.is_none());
        assert!(results[0].error.as_ref().unwrap().contains("URL generation"));
        assert_eq!(op.completions(), 1);
        assert_eq!(executor.phase(), ExecutorPhase::Completed);
    }

    #[test]
    fn test_cancel_mid_flight_suppresses_result() {
        let transport = MockTransport::new();
        let op = Arc::new(RecordingOperation::new("https://host", "/db", transport.clone()));
        let executor = executor_for(&op);

        executor.execute();
        let delegate = transport.held_delegate(0);
        delegate.received_response(StatusCode::OK, HeaderMap::new());
        delegate.received_data(Bytes::from_static(b"partial"));

        op.cancel();
        executor.cancel();
        assert!(transport.held_task(0).is_cancelled());
        assert_eq!(op.completions(), 0);

        delegate.completed(Some(SetteeError::Cancelled));

        assert!(op.results().is_empty());
        assert_eq!(op.completions(), 1);
    }

    #[test]
    fn test_cancelled_before_submit_cancels_task() {
        let transport = MockTransport::new();
        let op = Arc::new(RecordingOperation::new("https://host", "/db", transport.clone()));
        op.cancel();
        let executor = executor_for(&op);

        executor.execute();

        assert!(transport.held_task(0).is_cancelled());
    }

    #[test]
    fn test_duplicate_completion_ignored() {
        let transport = MockTransport::new();
        let op = Arc::new(RecordingOperation::new("https://host", "/db", transport.clone()));
        let executor = executor_for(&op);

        executor.execute();
        let delegate = transport.held_delegate(0);
        delegate.completed(None);
        delegate.completed(Some(SetteeError::Timeout));

        assert_eq!(op.results().len(), 1);
        assert_eq!(op.completions(), 1);
    }

    #[test]
    fn test_execute_twice_submits_once() {
        let transport = MockTransport::new();
        let op = Arc::new(RecordingOperation::new("https://host", "/db", transport.clone()));
        let executor = executor_for(&op);

        executor.execute();
        executor.execute();

        assert_eq!(transport.submissions(), 1);
    }

    #[test]
    fn test_cancel_before_execute_is_noop() {
        let transport = MockTransport::new();
        let op = Arc::new(RecordingOperation::new("https://host", "/db", transport.clone()));
        let executor = executor_for(&op);

        executor.cancel();
        assert_eq!(executor.phase(), ExecutorPhase::Idle);
        assert_eq!(op.completions(), 0);
    }
}
