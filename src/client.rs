//! High-level client: negotiate, start, connect, run.

use crate::{
    config::ClientConfig,
    connection::{Session, SessionEnd, SessionOptions},
    endpoint::{Endpoint, TRANSPORT_WEB_SOCKETS},
    error::SignalRError,
    negotiate::{NegotiationParameters, negotiate, start_transport},
};
use tracing::info;
use url::Url;

/// Result of the HTTP part of the handshake.
#[derive(Debug, Clone)]
pub struct Handshake {
    pub endpoint: Endpoint,
    pub parameters: NegotiationParameters,
    /// Encoded hub subscription sent as `connectionData`.
    pub connection_data: String,
    /// Body of the start response.
    pub start_response: String,
}

impl Handshake {
    /// The URL the WebSocket upgrade will use.
    pub fn connect_url(&self) -> Url {
        self.endpoint.connect_url(
            &self.parameters.protocol_version,
            TRANSPORT_WEB_SOCKETS,
            &self.connection_data,
            &self.parameters.connection_token,
        )
    }
}

/// Main client for a single SignalR session.
///
/// # Example
///
/// ```no_run
/// use signalr_classic::{ClientConfig, Scheme, SignalRClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ClientConfig::new(Scheme::Https, "example.com", "chat");
///     let client = SignalRClient::new(config);
///
///     let end = client
///         .run(async {
///             let _ = tokio::signal::ctrl_c().await;
///         })
///         .await?;
///     println!("Session ended: {end:?}");
///     Ok(())
/// }
/// ```
pub struct SignalRClient {
    config: ClientConfig,
    http: reqwest::Client,
}

impl SignalRClient {
    /// Creates a new client instance.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_http_client(config, reqwest::Client::new())
    }

    /// Creates a client that sends handshake requests through `http`.
    pub fn with_http_client(config: ClientConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Negotiates and announces the transport.
    ///
    /// Fails if either request fails, or if the negotiate response has no
    /// connection token or does not allow WebSockets.
    pub async fn handshake(&self) -> Result<Handshake, SignalRError> {
        let endpoint = self.config.endpoint()?;

        let parameters = negotiate(&self.http, &endpoint).await?;
        parameters.validate()?;
        info!(
            "Negotiated connection {} (protocol {})",
            parameters.connection_id, parameters.protocol_version
        );

        let connection_data = self.config.subscription().encode();
        let start_response =
            start_transport(&self.http, &endpoint, &parameters, &connection_data).await?;
        info!("{}", start_response);

        Ok(Handshake {
            endpoint,
            parameters,
            connection_data,
            start_response,
        })
    }

    /// Performs the handshake and opens the WebSocket session.
    pub async fn connect(&self) -> Result<Session, SignalRError> {
        let handshake = self.handshake().await?;
        Session::connect(
            &handshake.endpoint,
            &handshake.parameters,
            &handshake.connection_data,
            &self.config.origin(),
            SessionOptions::from(&self.config),
        )
        .await
    }

    /// Connects and runs the session until `interrupt` resolves or the
    /// session ends on its own.
    pub async fn run<F>(&self, interrupt: F) -> Result<SessionEnd, SignalRError>
    where
        F: Future<Output = ()>,
    {
        let session = self.connect().await?;
        Ok(session.run(interrupt).await)
    }
}
