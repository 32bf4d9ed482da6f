//! Rust client for ASP.NET SignalR over WebSockets.
//!
//! This crate implements the connection handshake and session maintenance of
//! the classic SignalR protocol: negotiate, start, WebSocket connect, periodic
//! keep-alive frames and an orderly close on interruption. Hub method
//! invocation is not covered; frames are exchanged as raw payloads.
//!
//! # Quick start
//!
//! ```rust
//! use signalr_classic::{Endpoint, HubSubscription, Scheme};
//!
//! let endpoint = Endpoint::new(Scheme::Https, "example.com").unwrap();
//! let connection_data = HubSubscription::new(["chat"]).encode();
//! let url = endpoint.start_url("1.5", "webSockets", &connection_data, "abc123");
//! assert_eq!(
//!     url.as_str(),
//!     "https://example.com/signalr/start?clientProtocol=1.5&connectionToken=abc123&transport=webSockets&connectionData=[%7B%22Name%22:%22chat%22%7D]"
//! );
//! ```
//!
//! For a full session, see [`SignalRClient`].

pub mod client;
pub mod config;
pub mod connection;
pub mod endpoint;
pub mod error;
pub mod negotiate;

pub use client::{Handshake, SignalRClient};
pub use config::{ClientConfig, Scheme};
pub use connection::{ReceivedFrame, Session, SessionEnd, SessionOptions, SessionState};
pub use endpoint::{Endpoint, HubSubscription, TRANSPORT_WEB_SOCKETS};
pub use error::SignalRError;
pub use negotiate::NegotiationParameters;
