//! Negotiation with the SignalR server.
//!
//! Before opening the WebSocket, the client makes an HTTP GET request to
//! `/signalr/negotiate` to obtain a connection token and the server's timeout
//! settings, then a GET to `/signalr/start` to announce the transport.
//!
//! This module handles both requests and parses the negotiate response.

use crate::{
    endpoint::{Endpoint, TRANSPORT_WEB_SOCKETS},
    error::SignalRError,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Response from the `/signalr/negotiate` endpoint.
///
/// Unknown fields are ignored. Missing or `null` fields take their zero value.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct NegotiationParameters {
    /// Base path advertised by the server.
    #[serde(rename = "Url", deserialize_with = "null_as_default")]
    pub base_url: String,

    /// Must be sent on every later handshake URL.
    #[serde(rename = "ConnectionToken", deserialize_with = "null_as_default")]
    pub connection_token: String,

    #[serde(rename = "ConnectionId", deserialize_with = "null_as_default")]
    pub connection_id: String,

    #[serde(rename = "KeepAliveTimeout", deserialize_with = "null_as_default")]
    pub keep_alive_timeout_secs: f64,

    #[serde(rename = "DisconnectTimeout", deserialize_with = "null_as_default")]
    pub disconnect_timeout_secs: f64,

    #[serde(rename = "ConnectionTimeout", deserialize_with = "null_as_default")]
    pub connection_timeout_secs: f64,

    /// `None` when the server did not say; only an explicit `false` rules
    /// the WebSockets transport out.
    #[serde(rename = "TryWebSockets", skip_serializing_if = "Option::is_none")]
    pub supports_websockets: Option<bool>,

    /// Echoed as `clientProtocol` on every later handshake URL.
    #[serde(rename = "ProtocolVersion", deserialize_with = "null_as_default")]
    pub protocol_version: String,

    #[serde(
        rename = "TransportConnectTimeout",
        deserialize_with = "null_as_default"
    )]
    pub transport_connect_timeout_secs: f64,

    /// Only meaningful for long polling.
    #[serde(
        rename = "LogPollDelay",
        alias = "LongPollDelay",
        deserialize_with = "null_as_default"
    )]
    pub poll_delay_secs: f64,
}

impl NegotiationParameters {
    /// Server-advertised keep-alive timeout, if it is a positive duration.
    pub fn keep_alive_timeout(&self) -> Option<Duration> {
        positive_secs(self.keep_alive_timeout_secs)
    }

    pub fn disconnect_timeout(&self) -> Option<Duration> {
        positive_secs(self.disconnect_timeout_secs)
    }

    pub fn transport_connect_timeout(&self) -> Option<Duration> {
        positive_secs(self.transport_connect_timeout_secs)
    }

    /// Checks that the parameters can be used to open a WebSocket session.
    pub fn validate(&self) -> Result<(), SignalRError> {
        if self.connection_token.is_empty() {
            return Err(SignalRError::MissingConnectionToken);
        }
        if self.supports_websockets == Some(false) {
            return Err(SignalRError::WebSocketsUnsupported);
        }
        Ok(())
    }
}

fn positive_secs(secs: f64) -> Option<Duration> {
    if secs > 0.0 {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decodes a negotiate response body.
///
/// A body that is not valid JSON for [`NegotiationParameters`] is logged and
/// decoded as the zero value. Callers must run
/// [`NegotiationParameters::validate`] before using the result.
pub fn decode_negotiation(body: &[u8]) -> NegotiationParameters {
    match serde_json::from_slice(body) {
        Ok(params) => params,
        Err(e) => {
            warn!("Failed to decode negotiate response: {}", e);
            NegotiationParameters::default()
        }
    }
}

/// Performs the negotiate request.
///
/// # Returns
///
/// * `Ok(params)` - The decoded parameters (zero-valued if the body was unreadable).
/// * `Err(SignalRError)` - If the request itself failed. There is no retry.
///
/// # Example
///
/// ```no_run
/// use signalr_classic::{config::Scheme, endpoint::Endpoint, negotiate::negotiate};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let endpoint = Endpoint::new(Scheme::Https, "example.com")?;
/// let params = negotiate(&reqwest::Client::new(), &endpoint).await?;
/// println!("Connection token: {}", params.connection_token);
/// # Ok(())
/// # }
/// ```
pub async fn negotiate(
    client: &reqwest::Client,
    endpoint: &Endpoint,
) -> Result<NegotiationParameters, SignalRError> {
    let negotiate_url = endpoint.negotiate_url();
    debug!("Negotiate URL: {}", negotiate_url);

    let response = client.get(negotiate_url).send().await?;
    let status = response.status();
    if !status.is_success() {
        warn!("Negotiate returned {}", status);
    }

    match response.bytes().await {
        Ok(body) => Ok(decode_negotiation(&body)),
        Err(e) => {
            warn!("Failed to read negotiate response: {}", e);
            Ok(NegotiationParameters::default())
        }
    }
}

/// Announces the WebSockets transport to the server.
///
/// The response body (normally `{"Response":"started"}`) is logged and returned
/// without validation. A failed request is returned to the caller; a body
/// that cannot be read is only logged.
pub async fn start_transport(
    client: &reqwest::Client,
    endpoint: &Endpoint,
    params: &NegotiationParameters,
    connection_data: &str,
) -> Result<String, SignalRError> {
    let start_url = endpoint.start_url(
        &params.protocol_version,
        TRANSPORT_WEB_SOCKETS,
        connection_data,
        &params.connection_token,
    );
    debug!("Start URL: {}", start_url);

    let response = client.get(start_url).send().await?;
    let body = response.text().await.unwrap_or_else(|e| {
        warn!("Failed to read start response: {}", e);
        String::new()
    });
    debug!("Start response: {}", body);
    Ok(body)
}
