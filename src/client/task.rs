//! Queue-schedulable wrapper around a [`CouchOperation`].
//!
//! # Lifecycle
//!
//! ```text
//! Created ──► Scheduled ──► Executing ──► Completed
//!    │            │              └──────► Cancelled
//!    └────────────┴─────────────────────► Cancelled
//! ```
//!
//! Terminal states are final. The wrapped operation's `complete_operation`
//! hook runs exactly once and always before the terminal state is published,
//! including when the task is cancelled before it starts. A task ends
//! `Completed` exactly when the operation received a result.

use crate::error::SetteeError;
use crate::http::{ExecutorPhase, HttpRequestOperation, RequestExecutor, Transport};
use crate::operations::CouchOperation;
use crate::types::{RequestBody, ResponseInfo};
use bytes::Bytes;
use http::Method;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{oneshot, watch};
use uuid::Uuid;

/// Lifecycle state of an [`OperationTask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Wrapped, not yet added to a queue.
    Created,
    /// Waiting in the queue for capacity.
    Scheduled,
    /// Request being built or in flight.
    Executing,
    /// Finished; the operation received its outcome.
    Completed,
    /// Cancelled; the operation received no outcome.
    Cancelled,
}

impl TaskState {
    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Cancelled)
    }

    fn can_become(self, next: TaskState) -> bool {
        use TaskState::*;
        matches!(
            (self, next),
            (Created, Scheduled)
                | (Scheduled, Executing)
                | (Created | Scheduled, Cancelled)
                | (Executing, Completed | Cancelled)
        )
    }
}

#[derive(Clone)]
struct Assignment {
    root_url: String,
    session: Arc<dyn Transport>,
}

/// An operation prepared for the queue.
///
/// Returned by [`SetteeClient::add`](crate::SetteeClient::add); use it to
/// cancel the operation or wait for it to finish.
pub struct OperationTask {
    id: Uuid,
    operation: Arc<dyn CouchOperation>,
    assignment: Mutex<Option<Assignment>>,
    cancelled: AtomicBool,
    claimed: AtomicBool,
    delivered: AtomicBool,
    executor: Mutex<Weak<RequestExecutor>>,
    state: watch::Sender<TaskState>,
}

impl OperationTask {
    /// Wrap `operation` in a new task.
    pub fn new(operation: impl CouchOperation) -> Arc<Self> {
        Self::from_arc(Arc::new(operation))
    }

    /// Wrap a shared operation in a new task.
    pub fn from_arc(operation: Arc<dyn CouchOperation>) -> Arc<Self> {
        Arc::new(OperationTask {
            id: Uuid::new_v4(),
            operation,
            assignment: Mutex::new(None),
            cancelled: AtomicBool::new(false),
            claimed: AtomicBool::new(false),
            delivered: AtomicBool::new(false),
            executor: Mutex::new(Weak::new()),
            state: watch::channel(TaskState::Created).0,
        })
    }

    /// Unique id, used in log output.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TaskState {
        *self.state.borrow()
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Cancel the task.
    ///
    /// A task that has not started is completed on the spot: its
    /// `complete_operation` hook runs before this returns and it never
    /// reaches the network. A running task asks its transport to stop; the
    /// operation then receives no result. Has no effect once the response
    /// has been delivered.
    pub fn cancel(&self) {
        if self.state().is_terminal() {
            return;
        }

        let executor = self.executor.lock().upgrade();
        if let Some(executor) = &executor {
            if executor.phase() == ExecutorPhase::Completed {
                tracing::debug!(task = %self.id, "cancel after completion, ignoring");
                return;
            }
        }

        self.cancelled.store(true, Ordering::Release);
        tracing::debug!(task = %self.id, "cancel requested");

        match executor {
            Some(executor) => executor.cancel(),
            // Not started yet: whoever claims the task first finishes it.
            None if !self.claimed.swap(true, Ordering::AcqRel) => {
                tracing::debug!(task = %self.id, "cancelled before start");
                self.operation.complete_operation();
                self.transition(TaskState::Cancelled);
            }
            // run() claimed it and will see the flag before submitting, or
            // cancel the transport task right after.
            None => {}
        }
    }

    /// Wait until the task reaches a terminal state and return it.
    pub async fn wait(&self) -> TaskState {
        let mut receiver = self.state.subscribe();
        let state = match receiver.wait_for(|state| state.is_terminal()).await {
            Ok(state) => *state,
            Err(_) => self.state(),
        };
        state
    }

    /// Supply the root address and session. Called by the queue right
    /// before scheduling.
    pub(crate) fn assign(&self, root_url: String, session: Arc<dyn Transport>) {
        *self.assignment.lock() = Some(Assignment { root_url, session });
    }

    pub(crate) fn transition(&self, next: TaskState) -> bool {
        let id = self.id;
        self.state.send_if_modified(|state| {
            if state.can_become(next) {
                tracing::debug!(task = %id, from = ?*state, to = ?next, "task state");
                *state = next;
                true
            } else {
                false
            }
        })
    }

    /// Run the operation to completion. Called once by the queue.
    pub(crate) async fn run(self: Arc<Self>) {
        if self.claimed.swap(true, Ordering::AcqRel) {
            tracing::debug!(task = %self.id, state = ?self.state(), "task already finished, skipping");
            return;
        }
        if !self.transition(TaskState::Executing) || self.is_cancelled() {
            tracing::debug!(task = %self.id, "skipping cancelled task");
            self.operation.complete_operation();
            self.transition(TaskState::Cancelled);
            return;
        }

        let Some(assignment) = self.assignment.lock().clone() else {
            self.fail(SetteeError::Config(
                "operation was not added to a client".into(),
            ));
            return;
        };

        if !self.operation.validate() {
            self.fail(SetteeError::Validation(format!(
                "{} rejected its inputs",
                self.operation.endpoint()
            )));
            return;
        }

        let body = match self.operation.serialise() {
            Ok(body) => body,
            Err(err) => {
                self.fail(err);
                return;
            }
        };

        let (done_tx, done_rx) = oneshot::channel();
        let request = Arc::new(ScheduledRequest {
            task: self.clone(),
            root_url: assignment.root_url,
            session: assignment.session,
            path: self.operation.endpoint(),
            method: self.operation.method(),
            query: self.operation.query_items(),
            body,
            done: Mutex::new(Some(done_tx)),
        });

        let executor = RequestExecutor::new(request);
        *self.executor.lock() = Arc::downgrade(&executor);
        executor.execute();
        drop(executor);

        if done_rx.await.is_err() {
            tracing::warn!(task = %self.id, "executor dropped without completing");
        }

        let outcome = if self.delivered.load(Ordering::Acquire) {
            TaskState::Completed
        } else {
            TaskState::Cancelled
        };
        self.transition(outcome);
    }

    fn fail(&self, err: SetteeError) {
        tracing::debug!(task = %self.id, error = %err, "operation failed before request");
        self.operation.process_response(None, None, Some(err));
        self.operation.complete_operation();
        self.transition(TaskState::Completed);
    }
}

/// The request view of a running task, handed to the executor.
struct ScheduledRequest {
    task: Arc<OperationTask>,
    root_url: String,
    session: Arc<dyn Transport>,
    path: String,
    method: Method,
    query: Vec<(String, String)>,
    body: Option<RequestBody>,
    done: Mutex<Option<oneshot::Sender<()>>>,
}

impl HttpRequestOperation for ScheduledRequest {
    fn root_url(&self) -> &str {
        &self.root_url
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn method(&self) -> &Method {
        &self.method
    }

    fn query_items(&self) -> &[(String, String)] {
        &self.query
    }

    fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    fn session(&self) -> &Arc<dyn Transport> {
        &self.session
    }

    fn is_cancelled(&self) -> bool {
        self.task.is_cancelled()
    }

    fn process_response(
        &self,
        data: Option<Bytes>,
        info: Option<ResponseInfo>,
        error: Option<SetteeError>,
    ) {
        self.task.delivered.store(true, Ordering::Release);
        self.task.operation.process_response(data, info, error);
    }

    fn complete_operation(&self) {
        self.task.operation.complete_operation();
        if let Some(done) = self.done.lock().take() {
            let _ = done.send(());
        }
    }
}
