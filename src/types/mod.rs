//! Value types shared by the request pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`RequestBody`] | Payload bytes paired with their content type |
//! | [`HttpRequest`] | A fully built request, ready for a transport |
//! | [`ResponseInfo`] | Status code and headers of a completed response |
//! | [`Document`] | A CouchDB document with an id and revision |

mod document;
mod request;
mod response;

pub use document::Document;
pub use request::{HttpRequest, RequestBody};
pub use response::ResponseInfo;
