//! Client configuration.
//!
//! Everything the client needs to reach a server lives in [`ClientConfig`]:
//! the handshake scheme, the `host[:port]` of the server, the hubs to
//! subscribe to and the session tuning knobs. The value is passed explicitly
//! to every step; nothing is kept in process-wide state.

use crate::{
    endpoint::{Endpoint, HubSubscription},
    error::SignalRError,
};
use std::{fmt, str::FromStr, time::Duration};

/// Default cadence of keep-alive frames.
pub const DEFAULT_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(1);
/// Default keep-alive frame payload.
pub const DEFAULT_KEEP_ALIVE_PAYLOAD: &str = "data=";
/// Default close-intent frame payload.
pub const DEFAULT_CLOSE_PAYLOAD: &str = "close";
/// Default wait for the peer after the close-intent frame.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(1);
/// Default capacity of the receive buffer, in bytes.
pub const DEFAULT_RECEIVE_BUFFER_SIZE: usize = 512;

/// Scheme used for the HTTP handshake requests (negotiate and start).
///
/// The persistent connection always uses `wss`, whatever this is set to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    Http,
    #[default]
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = SignalRError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(SignalRError::InvalidConfig(format!(
                "unsupported scheme `{other}`, expected http or https"
            ))),
        }
    }
}

/// Connection target and session settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub scheme: Scheme,
    /// Server address as `host[:port]`.
    pub host: String,
    /// Hubs to subscribe to, in order.
    pub hubs: Vec<String>,
    pub keep_alive_interval: Duration,
    pub keep_alive_payload: String,
    /// Payload of the close-intent frame. This is a client convention; servers
    /// are not documented to recognise it.
    pub close_payload: String,
    pub close_timeout: Duration,
    pub receive_buffer_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            scheme: Scheme::default(),
            host: String::new(),
            hubs: Vec::new(),
            keep_alive_interval: DEFAULT_KEEP_ALIVE_INTERVAL,
            keep_alive_payload: DEFAULT_KEEP_ALIVE_PAYLOAD.to_string(),
            close_payload: DEFAULT_CLOSE_PAYLOAD.to_string(),
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            receive_buffer_size: DEFAULT_RECEIVE_BUFFER_SIZE,
        }
    }
}

impl ClientConfig {
    /// Creates a configuration for a single hub with default session settings.
    pub fn new(scheme: Scheme, host: impl Into<String>, hub: impl Into<String>) -> Self {
        Self {
            scheme,
            host: host.into(),
            hubs: vec![hub.into()],
            ..Self::default()
        }
    }

    pub fn with_hub(mut self, hub: impl Into<String>) -> Self {
        self.hubs.push(hub.into());
        self
    }

    pub fn with_keep_alive_interval(mut self, interval: Duration) -> Self {
        self.keep_alive_interval = interval;
        self
    }

    pub fn with_keep_alive_payload(mut self, payload: impl Into<String>) -> Self {
        self.keep_alive_payload = payload.into();
        self
    }

    pub fn with_close_payload(mut self, payload: impl Into<String>) -> Self {
        self.close_payload = payload.into();
        self
    }

    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    pub fn with_receive_buffer_size(mut self, size: usize) -> Self {
        self.receive_buffer_size = size;
        self
    }

    /// Checks the settings that would otherwise fail later in a confusing way.
    pub fn validate(&self) -> Result<(), SignalRError> {
        if self.host.trim().is_empty() {
            return Err(SignalRError::InvalidConfig("host must not be empty".into()));
        }
        if self.hubs.is_empty() || self.hubs.iter().any(|hub| hub.is_empty()) {
            return Err(SignalRError::InvalidConfig(
                "at least one non-empty hub name is required".into(),
            ));
        }
        if self.keep_alive_interval.is_zero() {
            return Err(SignalRError::InvalidConfig(
                "keep-alive interval must be positive".into(),
            ));
        }
        if self.receive_buffer_size == 0 {
            return Err(SignalRError::InvalidConfig(
                "receive buffer size must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Value of the `Origin` header sent with the WebSocket upgrade.
    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }

    /// Validates the configuration and builds the URL builder for it.
    pub fn endpoint(&self) -> Result<Endpoint, SignalRError> {
        self.validate()?;
        Endpoint::new(self.scheme, &self.host)
    }

    pub fn subscription(&self) -> HubSubscription {
        HubSubscription::new(self.hubs.iter().cloned())
    }
}
