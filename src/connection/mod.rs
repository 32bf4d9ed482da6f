//! SignalR WebSocket session.
//!
//! This module handles the persistent connection lifecycle:
//! - Upgrading to the `connect` URL,
//! - Reading frames on a background task,
//! - Sending keep-alive frames from the main flow,
//! - The close-intent handshake on interruption.

mod receiver;
mod state;
mod writer;

pub use receiver::ReceivedFrame;
pub use state::{SessionState, SessionStatus};

use crate::{
    config::{
        ClientConfig, DEFAULT_CLOSE_PAYLOAD, DEFAULT_CLOSE_TIMEOUT, DEFAULT_KEEP_ALIVE_INTERVAL,
        DEFAULT_KEEP_ALIVE_PAYLOAD, DEFAULT_RECEIVE_BUFFER_SIZE,
    },
    endpoint::{Endpoint, TRANSPORT_WEB_SOCKETS},
    error::SignalRError,
    negotiate::NegotiationParameters,
};
use futures_channel::mpsc;
use futures_util::StreamExt;
use http::{HeaderValue, header::ORIGIN};
use receiver::receive_loop;
use std::time::Duration;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
    sync::oneshot,
    time::{Instant, MissedTickBehavior},
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{client::IntoClientRequest, handshake::client::Request},
};
use tracing::{debug, error, info, warn};
use writer::FrameWriter;

/// Timing and payload settings of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    /// Constant cadence of keep-alive frames. Not derived from the
    /// negotiated keep-alive timeout.
    pub keep_alive_interval: Duration,
    pub keep_alive_payload: String,
    pub close_payload: String,
    /// How long to wait for the peer after the close-intent frame.
    pub close_timeout: Duration,
    pub receive_buffer_size: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            keep_alive_interval: DEFAULT_KEEP_ALIVE_INTERVAL,
            keep_alive_payload: DEFAULT_KEEP_ALIVE_PAYLOAD.to_string(),
            close_payload: DEFAULT_CLOSE_PAYLOAD.to_string(),
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            receive_buffer_size: DEFAULT_RECEIVE_BUFFER_SIZE,
        }
    }
}

impl From<&ClientConfig> for SessionOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            keep_alive_interval: config.keep_alive_interval,
            keep_alive_payload: config.keep_alive_payload.clone(),
            close_payload: config.close_payload.clone(),
            close_timeout: config.close_timeout,
            receive_buffer_size: config.receive_buffer_size,
        }
    }
}

impl SessionOptions {
    /// Returns `true` (and logs a warning) if keep-alive frames would be sent
    /// less often than the server's keep-alive timeout.
    pub fn exceeds_keep_alive_timeout(&self, params: &NegotiationParameters) -> bool {
        match params.keep_alive_timeout() {
            Some(timeout) if self.keep_alive_interval > timeout => {
                warn!(
                    "Keep-alive interval {:?} exceeds the server keep-alive timeout {:?}",
                    self.keep_alive_interval, timeout
                );
                true
            }
            _ => false,
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The interruption signal fired and the close-intent frame was sent.
    /// `acknowledged` is `true` if the peer closed within the close timeout.
    Interrupted { acknowledged: bool },
    /// The receive loop ended: the peer closed or a read failed.
    RemoteClosed,
    /// A keep-alive or close-intent write failed.
    WriteFailed,
}

/// Builds the WebSocket upgrade request for the `connect` URL, carrying the
/// `Origin` header the server expects.
pub(crate) fn connect_request(
    endpoint: &Endpoint,
    params: &NegotiationParameters,
    connection_data: &str,
    origin: &str,
) -> Result<Request, SignalRError> {
    let connect_url = endpoint.connect_url(
        &params.protocol_version,
        TRANSPORT_WEB_SOCKETS,
        connection_data,
        &params.connection_token,
    );
    debug!("Connect URL: {}", connect_url);

    let mut request = connect_url.as_str().into_client_request()?;
    request
        .headers_mut()
        .insert(ORIGIN, HeaderValue::from_str(origin)?);
    Ok(request)
}

/// An open SignalR WebSocket connection.
///
/// Created by [`Session::connect`] (or [`Session::from_stream`] for an already
/// upgraded stream) and consumed by [`Session::run`].
pub struct Session<S = MaybeTlsStream<TcpStream>> {
    ws_stream: WebSocketStream<S>,
    options: SessionOptions,
    status: SessionStatus,
    observer: Option<mpsc::UnboundedSender<ReceivedFrame>>,
}

impl Session {
    /// Upgrades to the `connect` URL for the negotiated session.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - URL builder for the server.
    /// * `params` - Parameters returned by negotiate.
    /// * `connection_data` - Encoded hub subscription.
    /// * `origin` - `Origin` header value, `<scheme>://<host>`.
    /// * `options` - Session timing and payloads.
    ///
    /// A failed upgrade is returned as an error; there is no retry.
    pub async fn connect(
        endpoint: &Endpoint,
        params: &NegotiationParameters,
        connection_data: &str,
        origin: &str,
        options: SessionOptions,
    ) -> Result<Self, SignalRError> {
        options.exceeds_keep_alive_timeout(params);

        let request = connect_request(endpoint, params, connection_data, origin)?;
        let (ws_stream, response) = connect_async(request).await?;
        info!("WebSocket connected ({})", response.status());

        Ok(Self::from_stream(ws_stream, options))
    }
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Wraps an already upgraded WebSocket stream.
    pub fn from_stream(ws_stream: WebSocketStream<S>, options: SessionOptions) -> Self {
        let status = SessionStatus::new();
        status.open();
        Self {
            ws_stream,
            options,
            status,
            observer: None,
        }
    }

    /// Forwards every received frame to `observer`.
    pub fn with_observer(mut self, observer: mpsc::UnboundedSender<ReceivedFrame>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn status(&self) -> SessionStatus {
        self.status.clone()
    }

    /// Runs the session until `interrupt` resolves, the peer closes, or a
    /// write fails.
    ///
    /// Reading happens on a spawned task; this future sends keep-alive frames
    /// and owns every write. On interruption it sends the close-intent frame,
    /// waits up to `close_timeout` for the receive loop to finish, and closes
    /// the connection either way.
    pub async fn run<F>(self, interrupt: F) -> SessionEnd
    where
        F: Future<Output = ()>,
    {
        let Self {
            ws_stream,
            options,
            status,
            observer,
        } = self;

        let (sink, stream) = ws_stream.split();
        let (done_tx, mut done_rx) = oneshot::channel();
        let reader = tokio::spawn(receive_loop(
            stream,
            status.clone(),
            options.receive_buffer_size,
            observer,
            done_tx,
        ));
        let mut writer = FrameWriter::new(sink, status.clone());

        // Первый тик через интервал, а не сразу
        let mut ticker = tokio::time::interval_at(
            Instant::now() + options.keep_alive_interval,
            options.keep_alive_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tokio::pin!(interrupt);

        let end = loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = writer.send_text(&options.keep_alive_payload).await {
                        error!("write: {}", e);
                        break SessionEnd::WriteFailed;
                    }
                    debug!("Keep-alive sent");
                }
                _ = &mut done_rx => {
                    break SessionEnd::RemoteClosed;
                }
                _ = &mut interrupt => {
                    info!("interrupt");
                    status.begin_closing();
                    if let Err(e) = writer.send_text(&options.close_payload).await {
                        error!("write close: {}", e);
                        break SessionEnd::WriteFailed;
                    }
                    let acknowledged = tokio::time::timeout(options.close_timeout, &mut done_rx)
                        .await
                        .is_ok();
                    if !acknowledged {
                        debug!("Peer did not close within {:?}", options.close_timeout);
                    }
                    break SessionEnd::Interrupted { acknowledged };
                }
            }
        };

        writer.close(options.close_timeout).await;
        reader.abort();
        let _ = reader.await;

        info!("Session ended: {:?}", end);
        end
    }
}
