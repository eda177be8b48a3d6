//! Document model.

use crate::error::Result;
use serde::Serialize;
use serde_json::Value;

/// A CouchDB document.
///
/// Any serializable type with an id and revision can be written through
/// [`PutBulkDocsOperation`](crate::operations::PutBulkDocsOperation).
///
/// # Examples
///
/// ```
/// use serde::Serialize;
/// use settee::Document;
///
/// #[derive(Serialize)]
/// struct Note {
///     #[serde(rename = "_id")]
///     id: String,
///     #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
///     rev: Option<String>,
///     text: String,
/// }
///
/// impl Document for Note {
///     fn id(&self) -> &str {
///         &self.id
///     }
///
///     fn revision(&self) -> Option<&str> {
///         self.rev.as_deref()
///     }
/// }
///
/// let note = Note { id: "n1".into(), rev: None, text: "hi".into() };
/// let value = note.to_value().unwrap();
/// assert_eq!(value["_id"], "n1");
/// ```
pub trait Document: Serialize {
    /// The document id (`_id`).
    fn id(&self) -> &str;

    /// The current revision (`_rev`), or `None` for a new document.
    fn revision(&self) -> Option<&str>;

    /// Serialize the document to a JSON value.
    fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
