//! Stream adapter over a long-poll loop.
//!
//! [`LongPollStream`] owns both the delegate and the loop, so a consumer can
//! use `StreamExt` combinators instead of implementing
//! [`LongPollingDelegate`]. Dropping the stream stops polling.
//!
//! # Examples
//!
//! ```ignore
//! use futures::StreamExt;
//!
//! let mut changes = client.long_poll_stream("/db/_changes", &[("feed", "longpoll")])?;
//! while let Some(result) = changes.next().await {
//!     match result {
//!         Ok(body) => println!("{}", String::from_utf8_lossy(&body)),
//!         Err(e) => eprintln!("poll failed: {}", e),
//!     }
//! }
//! ```

use crate::error::Result;
use crate::http::{LongPollingDelegate, LongPollingRequest, Transport};
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use url::Url;

struct ChannelDelegate {
    sender: mpsc::UnboundedSender<Result<Bytes>>,
}

impl LongPollingDelegate for ChannelDelegate {
    fn received(&self, result: Result<Bytes>) {
        if self.sender.send(result).is_err() {
            tracing::trace!("long poll stream receiver dropped");
        }
    }
}

/// Poll results as a [`Stream`].
pub struct LongPollStream {
    receiver: UnboundedReceiverStream<Result<Bytes>>,
    // Field order matters: the loop is stopped before the delegate goes away.
    _request: LongPollingRequest,
    _delegate: Arc<dyn LongPollingDelegate>,
}

impl LongPollStream {
    /// Start polling `url` through `session`. Must be called within a Tokio
    /// runtime.
    pub fn start(url: Url, session: Arc<dyn Transport>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let delegate: Arc<dyn LongPollingDelegate> = Arc::new(ChannelDelegate { sender });
        let mut request = LongPollingRequest::new(Arc::downgrade(&delegate), session);
        request.poll_url(url);

        LongPollStream {
            receiver: UnboundedReceiverStream::new(receiver),
            _request: request,
            _delegate: delegate,
        }
    }
}

impl Stream for LongPollStream {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_next(cx)
    }
}
