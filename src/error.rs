use thiserror::Error;

/// Errors that can occur in the SignalR client.
///
/// Only setup steps (negotiate, start, WebSocket upgrade) produce these.
/// Failures inside a running session end the session instead, see
/// [`SessionEnd`](crate::connection::SessionEnd).
#[derive(Error, Debug)]
pub enum SignalRError {
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),

    #[error("HTTP request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Negotiate response carried no connection token")]
    MissingConnectionToken,

    #[error("Server does not support the WebSockets transport")]
    WebSocketsUnsupported,
}
