//! Concurrent execution queue for operation tasks.

use crate::client::{OperationTask, TaskState};
use crate::http::Transport;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Runs [`OperationTask`]s on the Tokio runtime.
///
/// The queue owns the client's shared session and root address and hands them
/// to each task just before scheduling it. Concurrency is bounded by a
/// semaphore when a limit is configured.
#[derive(Clone)]
pub struct OperationQueue {
    root_url: String,
    session: Arc<dyn Transport>,
    permits: Option<Arc<Semaphore>>,
}

impl OperationQueue {
    /// Create a queue. `max_concurrent` of `None` means unbounded; a bound
    /// of zero is raised to one, since no task could ever run otherwise.
    pub fn new(root_url: String, session: Arc<dyn Transport>, max_concurrent: Option<usize>) -> Self {
        OperationQueue {
            root_url,
            session,
            permits: max_concurrent.map(|max| Arc::new(Semaphore::new(max.max(1)))),
        }
    }

    /// The shared session.
    pub fn session(&self) -> &Arc<dyn Transport> {
        &self.session
    }

    /// The root address injected into tasks.
    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    /// Schedule `task`.
    ///
    /// A task runs at most once: adding a task that was already scheduled,
    /// or that was cancelled, has no effect. Must be called within a Tokio
    /// runtime.
    pub fn add(&self, task: Arc<OperationTask>) {
        task.assign(self.root_url.clone(), self.session.clone());
        if !task.transition(TaskState::Scheduled) {
            tracing::warn!(task = %task.id(), state = ?task.state(), "task not schedulable, ignoring");
            return;
        }

        let permits = self.permits.clone();
        tokio::spawn(async move {
            let _permit = match permits {
                Some(semaphore) => tokio::select! {
                    permit = semaphore.acquire_owned() => permit.ok(),
                    // Cancelled while waiting; cancel() already completed it.
                    _ = task.wait() => return,
                },
                None => None,
            };
            task.run().await;
        });
    }
}
