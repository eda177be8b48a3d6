//! Bulk document creation and update.

use crate::error::{Result, SetteeError};
use crate::operations::CouchOperation;
use crate::types::{Document, RequestBody, ResponseInfo};
use bytes::Bytes;
use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Callback receiving the outcome of a [`PutBulkDocsOperation`].
pub type BulkDocsHandler = Box<dyn Fn(Result<BulkDocsResponse>) + Send + Sync>;

/// Per-document outcome reported by `_bulk_docs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkDocResult {
    /// Document id.
    pub id: String,
    /// New revision, when the write succeeded.
    #[serde(default)]
    pub rev: Option<String>,
    /// `true` when the write succeeded.
    #[serde(default)]
    pub ok: Option<bool>,
    /// Error kind, e.g. `conflict`.
    #[serde(default)]
    pub error: Option<String>,
    /// Human readable error reason.
    #[serde(default)]
    pub reason: Option<String>,
}

impl BulkDocResult {
    /// Whether this document was written.
    pub fn is_ok(&self) -> bool {
        self.error.is_none() && self.ok.unwrap_or(self.rev.is_some())
    }
}

/// A successful `_bulk_docs` reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkDocsResponse {
    /// One entry per submitted document, in submission order.
    pub results: Vec<BulkDocResult>,
    /// Status and headers of the reply.
    pub info: ResponseInfo,
}

#[derive(Serialize)]
struct BulkDocsRequest<'a> {
    docs: &'a [Value],
    #[serde(skip_serializing_if = "Option::is_none")]
    new_edits: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    all_or_nothing: Option<bool>,
}

/// Creates and updates documents in bulk.
///
/// # Examples
///
/// ```ignore
/// use serde_json::json;
/// use settee::operations::PutBulkDocsOperation;
///
/// let op = PutBulkDocsOperation::new("exampledb", vec![json!({"hello": "world"})])
///     .with_handler(|result| match result {
///         Ok(response) => println!("wrote {} docs", response.results.len()),
///         Err(e) => eprintln!("bulk write failed: {}", e),
///     });
/// client.add(op);
/// ```
pub struct PutBulkDocsOperation {
    database_name: String,
    documents: Vec<Value>,
    new_edits: Option<bool>,
    all_or_nothing: Option<bool>,
    handler: Option<BulkDocsHandler>,
}

impl PutBulkDocsOperation {
    /// Write raw JSON documents to `database_name`.
    pub fn new(database_name: impl Into<String>, documents: Vec<Value>) -> Self {
        PutBulkDocsOperation {
            database_name: database_name.into(),
            documents,
            new_edits: None,
            all_or_nothing: None,
            handler: None,
        }
    }

    /// Write typed documents to `database_name`.
    pub fn from_documents<D: Document>(
        database_name: impl Into<String>,
        documents: &[D],
    ) -> Result<Self> {
        let documents = documents
            .iter()
            .map(Document::to_value)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(database_name, documents))
    }

    /// When `false`, the server keeps the supplied revisions instead of
    /// assigning new ones (replication mode).
    pub fn with_new_edits(mut self, new_edits: bool) -> Self {
        self.new_edits = Some(new_edits);
        self
    }

    /// When `true`, either every document is committed or none is.
    pub fn with_all_or_nothing(mut self, all_or_nothing: bool) -> Self {
        self.all_or_nothing = Some(all_or_nothing);
        self
    }

    /// Set the callback that receives the outcome.
    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(Result<BulkDocsResponse>) + Send + Sync + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Target database.
    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    /// Documents in this request.
    pub fn documents(&self) -> &[Value] {
        &self.documents
    }

    fn interpret(
        data: Option<Bytes>,
        info: Option<ResponseInfo>,
        error: Option<SetteeError>,
    ) -> Result<BulkDocsResponse> {
        if let Some(err) = error {
            return Err(err);
        }
        let info = info.ok_or_else(|| SetteeError::Transport("no response received".into()))?;
        let data = data.unwrap_or_default();

        if !info.is_success() {
            let reason = serde_json::from_slice::<Value>(&data)
                .ok()
                .and_then(|body| body.get("reason").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| String::from_utf8_lossy(&data).into_owned());
            return Err(SetteeError::UnexpectedStatus {
                status: info.status_code,
                reason,
            });
        }

        let results: Vec<BulkDocResult> = serde_json::from_slice(&data)?;
        Ok(BulkDocsResponse { results, info })
    }
}

impl CouchOperation for PutBulkDocsOperation {
    fn endpoint(&self) -> String {
        format!("/{}/_bulk_docs", self.database_name)
    }

    fn method(&self) -> Method {
        Method::POST
    }

    fn validate(&self) -> bool {
        !self.database_name.is_empty() && self.documents.iter().all(Value::is_object)
    }

    fn serialise(&self) -> Result<Option<RequestBody>> {
        let request = BulkDocsRequest {
            docs: &self.documents,
            new_edits: self.new_edits,
            all_or_nothing: self.all_or_nothing,
        };
        let data = serde_json::to_vec(&request)?;
        Ok(Some(RequestBody::json(data)))
    }

    fn process_response(
        &self,
        data: Option<Bytes>,
        info: Option<ResponseInfo>,
        error: Option<SetteeError>,
    ) {
        let outcome = Self::interpret(data, info, error);
        if let Err(e) = &outcome {
            tracing::debug!(database = %self.database_name, error = %e, "bulk docs failed");
        }
        if let Some(handler) = &self.handler {
            handler(outcome);
        }
    }
}
