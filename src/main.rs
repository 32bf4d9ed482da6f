use clap::Parser;
use signalr_classic::{ClientConfig, Scheme, SignalRClient};
use std::{process::ExitCode, time::Duration};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Connect to a SignalR hub over WebSockets and keep the session alive
/// until Ctrl-C.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Protocol for the handshake requests: http or https.
    #[arg(long, default_value = "https")]
    scheme: Scheme,

    /// Server to connect to, as host[:port].
    #[arg(long)]
    addr: String,

    /// Hub to subscribe to. Repeat for several hubs.
    #[arg(long = "hubname", required = true)]
    hubs: Vec<String>,

    /// Interval between keep-alive frames, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    keep_alive_ms: u64,

    /// Payload of the frame sent before closing.
    #[arg(long, default_value = "close")]
    close_payload: String,
}

impl Args {
    fn into_config(self) -> ClientConfig {
        ClientConfig {
            scheme: self.scheme,
            host: self.addr,
            hubs: self.hubs,
            ..ClientConfig::default()
        }
        .with_keep_alive_interval(Duration::from_millis(self.keep_alive_ms))
        .with_close_payload(self.close_payload)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    info!("Starting SignalR connection to {}", args.addr);

    let client = SignalRClient::new(args.into_config());
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    match client.run(interrupt).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
