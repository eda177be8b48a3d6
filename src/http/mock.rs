//! In-memory transport and operation doubles for unit tests.

use crate::error::SetteeError;
use crate::http::{HttpRequestOperation, SessionDelegate, SessionTask, Transport};
use crate::types::{HttpRequest, RequestBody, ResponseInfo};
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A scripted transport reply.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Respond {
        status: u16,
        headers: Vec<(&'static str, &'static str)>,
        chunks: Vec<Bytes>,
    },
    Fail(String),
}

impl Reply {
    pub(crate) fn ok(body: &'static str) -> Self {
        Reply::Respond {
            status: 200,
            headers: vec![("content-type", "application/json")],
            chunks: vec![Bytes::from_static(body.as_bytes())],
        }
    }

    pub(crate) fn status(status: u16, body: &'static str) -> Self {
        Reply::Respond {
            status,
            headers: Vec::new(),
            chunks: vec![Bytes::from_static(body.as_bytes())],
        }
    }

    fn deliver(self, delegate: &dyn SessionDelegate) {
        match self {
            Reply::Respond {
                status,
                headers,
                chunks,
            } => {
                let mut map = HeaderMap::new();
                for (name, value) in headers {
                    map.insert(
                        HeaderName::from_static(name),
                        HeaderValue::from_static(value),
                    );
                }
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::OK);
                delegate.received_response(status, map);
                for chunk in chunks {
                    delegate.received_data(chunk);
                }
                delegate.completed(None);
            }
            Reply::Fail(message) => delegate.completed(Some(SetteeError::Transport(message))),
        }
    }
}

/// Transport that answers from a script and holds requests once the script
/// runs out.
///
/// Scripted replies are delivered from a spawned task after `delay`, so those
/// tests need a Tokio runtime. Held requests are never answered; tests drive
/// them through [`MockTransport::held_delegate`].
pub(crate) struct MockTransport {
    replies: Mutex<VecDeque<Reply>>,
    delay: Duration,
    requests: Mutex<Vec<HttpRequest>>,
    held: Mutex<Vec<(Arc<dyn SessionDelegate>, SessionTask)>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockTransport {
    pub(crate) fn new() -> Arc<Self> {
        Self::scripted(Vec::new(), Duration::ZERO)
    }

    pub(crate) fn scripted(replies: Vec<Reply>, delay: Duration) -> Arc<Self> {
        Arc::new(MockTransport {
            replies: Mutex::new(replies.into()),
            delay,
            requests: Mutex::new(Vec::new()),
            held: Mutex::new(Vec::new()),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub(crate) fn submissions(&self) -> usize {
        self.requests.lock().len()
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn held_count(&self) -> usize {
        self.held.lock().len()
    }

    pub(crate) fn held_delegate(&self, index: usize) -> Arc<dyn SessionDelegate> {
        self.held.lock()[index].0.clone()
    }

    pub(crate) fn held_task(&self, index: usize) -> SessionTask {
        self.held.lock()[index].1.clone()
    }
}

impl Transport for MockTransport {
    fn data_task(&self, request: HttpRequest, delegate: Arc<dyn SessionDelegate>) -> SessionTask {
        self.requests.lock().push(request);
        let task = SessionTask::new();

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let reply = self.replies.lock().pop_front();
        match reply {
            None => self.held.lock().push((delegate, task.clone())),
            Some(reply) => {
                let token = task.token().clone();
                let in_flight = self.in_flight.clone();
                let delay = self.delay;
                tokio::spawn(async move {
                    tokio::select! {
                        biased;
                        () = token.cancelled() => {
                            in_flight.fetch_sub(1, Ordering::SeqCst);
                            delegate.completed(Some(SetteeError::Cancelled));
                        }
                        () = tokio::time::sleep(delay) => {
                            in_flight.fetch_sub(1, Ordering::SeqCst);
                            reply.deliver(delegate.as_ref());
                        }
                    }
                });
            }
        }

        task
    }
}

/// What a [`RecordingOperation`] saw in `process_response`.
#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    pub(crate) data: Option<Bytes>,
    pub(crate) info: Option<ResponseInfo>,
    pub(crate) error: Option<String>,
}

/// An [`HttpRequestOperation`] that records every hook invocation.
pub(crate) struct RecordingOperation {
    root: String,
    path: String,
    method: Method,
    query: Vec<(String, String)>,
    body: Option<RequestBody>,
    session: Arc<dyn Transport>,
    cancelled: AtomicBool,
    results: Mutex<Vec<Recorded>>,
    events: Mutex<Vec<&'static str>>,
    completions: AtomicUsize,
}

impl RecordingOperation {
    pub(crate) fn new(root: &str, path: &str, transport: Arc<MockTransport>) -> Self {
        RecordingOperation {
            root: root.to_string(),
            path: path.to_string(),
            method: Method::GET,
            query: Vec::new(),
            body: None,
            session: transport,
            cancelled: AtomicBool::new(false),
            results: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
            completions: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub(crate) fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    pub(crate) fn with_query(mut self, query: &[(&str, &str)]) -> Self {
        self.query = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self
    }

    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub(crate) fn results(&self) -> Vec<Recorded> {
        self.results.lock().clone()
    }

    pub(crate) fn events(&self) -> Vec<&'static str> {
        self.events.lock().clone()
    }

    pub(crate) fn completions(&self) -> usize {
        self.completions.load(Ordering::SeqCst)
    }
}

impl HttpRequestOperation for RecordingOperation {
    fn root_url(&self) -> &str {
        &self.root
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
        self.cancelled.load(Ordering::SeqCst)
    }

    fn process_response(
        &self,
        data: Option<Bytes>,
        info: Option<ResponseInfo>,
        error: Option<SetteeError>,
    ) {
        self.events.lock().push("result");
        self.results.lock().push(Recorded {
            data,
            info,
            error: error.map(|e| e.to_string()),
        });
    }

    fn complete_operation(&self) {
        self.events.lock().push("complete");
        self.completions.fetch_add(1, Ordering::SeqCst);
    }
}
