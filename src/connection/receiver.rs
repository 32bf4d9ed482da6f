//! Receive side of a session.

use super::state::SessionStatus;
use bytes::Bytes;
use futures_channel::mpsc;
use futures_util::{Stream, StreamExt};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, info, warn};

/// A frame read from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedFrame {
    /// At most `receive_buffer_size` bytes of the frame.
    pub payload: Bytes,
    /// Set when the frame was longer than the buffer and the tail was dropped.
    pub truncated: bool,
}

impl ReceivedFrame {
    pub(crate) fn bounded(mut payload: Bytes, capacity: usize) -> Self {
        let truncated = payload.len() > capacity;
        if truncated {
            payload.truncate(capacity);
        }
        Self { payload, truncated }
    }

    pub fn as_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

/// Reads frames until the connection fails or the peer closes it.
///
/// Every text or binary frame is logged and forwarded to `observer`. When the
/// loop ends the session is marked closed and `done` fires. A clean close and
/// a read error are treated the same way.
pub(crate) async fn receive_loop<R>(
    mut stream: R,
    status: SessionStatus,
    capacity: usize,
    observer: Option<mpsc::UnboundedSender<ReceivedFrame>>,
    done: oneshot::Sender<()>,
) where
    R: Stream<Item = Result<Message, WsError>> + Unpin,
{
    loop {
        match stream.next().await {
            Some(Ok(message @ (Message::Text(_) | Message::Binary(_)))) => {
                let frame = ReceivedFrame::bounded(message.into_data(), capacity);
                if frame.truncated {
                    warn!(
                        "Frame exceeded the {} byte receive buffer, tail dropped",
                        capacity
                    );
                }
                info!("Received: {}", frame.as_text());
                if let Some(observer) = &observer {
                    // Наблюдатель мог уже уйти, это не ошибка сессии
                    let _ = observer.unbounded_send(frame);
                }
            }
            Some(Ok(Message::Close(close_frame))) => {
                info!("read: connection closed by peer ({:?})", close_frame);
                break;
            }
            Some(Ok(_)) => {
                // Ping/Pong отвечает сам tungstenite
                continue;
            }
            Some(Err(e)) => {
                info!("read: {}", e);
                break;
            }
            None => {
                info!("read: stream ended");
                break;
            }
        }
    }

    if status.close() {
        debug!("Session closed by receive loop");
    }
    let _ = done.send(());
}
