//! Send side of a session.

use super::state::SessionStatus;
use futures_util::{Sink, SinkExt};
use std::time::Duration;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, warn};

/// Owns the write half of the connection. Only the main flow writes.
pub(crate) struct FrameWriter<W> {
    sink: W,
    status: SessionStatus,
    closed: bool,
}

impl<W> FrameWriter<W>
where
    W: Sink<Message, Error = WsError> + Unpin,
{
    pub(crate) fn new(sink: W, status: SessionStatus) -> Self {
        Self {
            sink,
            status,
            closed: false,
        }
    }

    pub(crate) async fn send_text(&mut self, payload: &str) -> Result<(), WsError> {
        self.sink.send(Message::text(payload)).await
    }

    /// Closes the connection and marks the session closed.
    ///
    /// Safe to call after the receive loop already closed the session, and
    /// safe to call twice. Errors from an already-closed socket are ignored.
    /// Gives up after `limit` if the peer stops reading.
    pub(crate) async fn close(&mut self, limit: Duration) {
        self.status.close();
        if self.closed {
            return;
        }
        self.closed = true;
        match tokio::time::timeout(limit, self.sink.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("close: {}", e),
            Err(_) => warn!("close: peer did not take the close frame within {:?}", limit),
        }
    }
}
