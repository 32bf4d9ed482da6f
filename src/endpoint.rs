//! Handshake URL construction.
//!
//! SignalR uses four endpoints below `/signalr`:
//!
//! | Path        | Scheme            | Query                                                        |
//! |-------------|-------------------|--------------------------------------------------------------|
//! | `negotiate` | handshake scheme  | none                                                         |
//! | `start`     | handshake scheme  | `clientProtocol`, `transport`, `connectionToken`, `connectionData` |
//! | `connect`   | `wss`             | same as `start`                                              |
//! | `send`      | `wss`             | same as `start`                                              |
//!
//! `connectionData` is already percent-encoded (see [`HubSubscription`]), so it
//! is appended verbatim after the other parameters have been form-encoded.

use crate::{config::Scheme, error::SignalRError};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::{collections::BTreeMap, fmt};
use url::{Url, form_urlencoded};

/// Identifier of the WebSockets transport on the wire.
pub const TRANSPORT_WEB_SOCKETS: &str = "webSockets";

const NEGOTIATE_PATH: &str = "/signalr/negotiate";
const START_PATH: &str = "/signalr/start";
const CONNECT_PATH: &str = "/signalr/connect";
const SEND_PATH: &str = "/signalr/send";

/// Characters left as-is in the `connectionData` value.
const CONNECTION_DATA: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'[')
    .remove(b']')
    .remove(b':')
    .remove(b',')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Ordered list of hubs, serialized into the `connectionData` query value.
///
/// The encoded form is a JSON array of `{"Name": ...}` objects, e.g.
/// `[%7B%22Name%22:%22chat%22%7D]` for a single `chat` hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubSubscription {
    hubs: Vec<String>,
}

impl HubSubscription {
    pub fn new<I, S>(hubs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hubs: hubs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn hubs(&self) -> &[String] {
        &self.hubs
    }

    /// Returns the percent-encoded descriptor.
    pub fn encode(&self) -> String {
        let entries = self
            .hubs
            .iter()
            .map(|name| serde_json::json!({ "Name": name }))
            .collect();
        let json = serde_json::Value::Array(entries).to_string();
        utf8_percent_encode(&json, CONNECTION_DATA).to_string()
    }
}

impl fmt::Display for HubSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Builds the handshake URLs for one server.
///
/// Both base URLs are parsed once in [`Endpoint::new`], so the builders
/// themselves cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    handshake_base: Url,
    duplex_base: Url,
}

impl Endpoint {
    /// Creates the builder for `host` (`host[:port]`).
    pub fn new(scheme: Scheme, host: &str) -> Result<Self, SignalRError> {
        if host.is_empty() {
            return Err(SignalRError::InvalidConfig("host must not be empty".into()));
        }
        let handshake_base = Url::parse(&format!("{scheme}://{host}"))?;
        let duplex_base = Url::parse(&format!("wss://{host}"))?;
        if handshake_base.host_str().is_none() {
            return Err(SignalRError::InvalidConfig(format!("`{host}` has no host")));
        }
        Ok(Self {
            handshake_base,
            duplex_base,
        })
    }

    /// `<scheme>://<host>/signalr/negotiate`, without a query.
    pub fn negotiate_url(&self) -> Url {
        let mut url = self.handshake_base.clone();
        url.set_path(NEGOTIATE_PATH);
        url.set_query(None);
        url
    }

    pub fn start_url(
        &self,
        protocol_version: &str,
        transport: &str,
        connection_data: &str,
        connection_token: &str,
    ) -> Url {
        with_common_query(
            self.handshake_base.clone(),
            START_PATH,
            protocol_version,
            transport,
            connection_data,
            connection_token,
        )
    }

    /// The persistent connection URL. Always `wss`.
    pub fn connect_url(
        &self,
        protocol_version: &str,
        transport: &str,
        connection_data: &str,
        connection_token: &str,
    ) -> Url {
        with_common_query(
            self.duplex_base.clone(),
            CONNECT_PATH,
            protocol_version,
            transport,
            connection_data,
            connection_token,
        )
    }

    /// Not used by the keep-alive session, kept for callers that post to the
    /// send endpoint themselves.
    pub fn send_url(
        &self,
        protocol_version: &str,
        transport: &str,
        connection_data: &str,
        connection_token: &str,
    ) -> Url {
        with_common_query(
            self.duplex_base.clone(),
            SEND_PATH,
            protocol_version,
            transport,
            connection_data,
            connection_token,
        )
    }
}

fn with_common_query(
    mut url: Url,
    path: &str,
    protocol_version: &str,
    transport: &str,
    connection_data: &str,
    connection_token: &str,
) -> Url {
    url.set_path(path);

    // Ключи сортируются, как в каноническом кодировщике.
    let params = BTreeMap::from([
        ("clientProtocol", protocol_version),
        ("connectionToken", connection_token),
        ("transport", transport),
    ]);
    let encoded = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();

    // connectionData is pre-encoded and must come last.
    url.set_query(Some(&format!("{encoded}&connectionData={connection_data}")));
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAT: &str = "[%7B%22Name%22:%22chat%22%7D]";

    fn query_pairs(url: &Url) -> Vec<(String, String)> {
        url.query()
            .unwrap_or_default()
            .split('&')
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap();
                (key.to_string(), value.to_string())
            })
            .collect()
    }

    #[test]
    fn test_single_hub_descriptor() {
        assert_eq!(HubSubscription::new(["chat"]).encode(), CHAT);
    }

    #[test]
    fn test_multiple_hub_descriptor() {
        let subscription = HubSubscription::new(["a", "b"]);
        assert_eq!(
            subscription.to_string(),
            "[%7B%22Name%22:%22a%22%7D,%7B%22Name%22:%22b%22%7D]"
        );
    }

    #[test]
    fn test_descriptor_escapes_hub_name() {
        let encoded = HubSubscription::new(["my hub&x"]).encode();
        assert_eq!(encoded, "[%7B%22Name%22:%22my%20hub%26x%22%7D]");
    }

    #[test]
    fn test_negotiate_url() {
        let endpoint = Endpoint::new(Scheme::Http, "localhost:8080").unwrap();
        assert_eq!(
            endpoint.negotiate_url().as_str(),
            "http://localhost:8080/signalr/negotiate"
        );
    }

    #[test]
    fn test_start_url_matches_wire_format() {
        let endpoint = Endpoint::new(Scheme::Https, "example.com").unwrap();
        let url = endpoint.start_url("1.5", TRANSPORT_WEB_SOCKETS, CHAT, "abc123");
        assert_eq!(
            url.as_str(),
            "https://example.com/signalr/start?clientProtocol=1.5&connectionToken=abc123&transport=webSockets&connectionData=[%7B%22Name%22:%22chat%22%7D]"
        );
    }

    #[test]
    fn test_query_has_exactly_four_parameters() {
        let endpoint = Endpoint::new(Scheme::Http, "example.com").unwrap();
        for url in [
            endpoint.start_url("1.5", "webSockets", CHAT, "tok"),
            endpoint.connect_url("1.5", "webSockets", CHAT, "tok"),
            endpoint.send_url("1.5", "webSockets", CHAT, "tok"),
        ] {
            let pairs = query_pairs(&url);
            assert_eq!(pairs.len(), 4);
            assert!(pairs.contains(&("clientProtocol".into(), "1.5".into())));
            assert!(pairs.contains(&("transport".into(), "webSockets".into())));
            assert!(pairs.contains(&("connectionToken".into(), "tok".into())));
            assert_eq!(pairs[3], ("connectionData".into(), CHAT.into()));
        }
    }

    #[test]
    fn test_connection_token_is_form_encoded() {
        let endpoint = Endpoint::new(Scheme::Https, "example.com").unwrap();
        let url = endpoint.start_url("1.5", "webSockets", CHAT, "a/b+c=");
        let pairs = query_pairs(&url);
        assert!(pairs.contains(&("connectionToken".into(), "a%2Fb%2Bc%3D".into())));
    }

    #[test]
    fn test_duplex_urls_are_always_wss() {
        for scheme in [Scheme::Http, Scheme::Https] {
            let endpoint = Endpoint::new(scheme, "example.com:8443").unwrap();
            let connect = endpoint.connect_url("1.5", "webSockets", CHAT, "tok");
            let send = endpoint.send_url("1.5", "webSockets", CHAT, "tok");
            assert_eq!(connect.scheme(), "wss");
            assert_eq!(connect.path(), "/signalr/connect");
            assert_eq!(connect.port(), Some(8443));
            assert_eq!(send.scheme(), "wss");
            assert_eq!(send.path(), "/signalr/send");
        }
    }

    #[test]
    fn test_empty_host_is_rejected() {
        assert!(Endpoint::new(Scheme::Https, "").is_err());
    }
}
