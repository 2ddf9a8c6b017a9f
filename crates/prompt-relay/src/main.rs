//! `prompt-relay` binary entrypoint.
//!
//! Reads configuration from the environment, applies CLI overrides and starts
//! the Actix server.

use anyhow::Context;
use clap::Parser;
use prompt_relay::{serve, RelayConfig, RelayMode};

#[derive(Debug, Parser)]
#[command(name = "prompt-relay", version, about)]
struct Cli {
    /// Bind address (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Response mode: buffered, streaming or passthrough (overrides RELAY_MODE)
    #[arg(short, long)]
    mode: Option<RelayMode>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Respect `RUST_LOG` if set; otherwise default to info.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = RelayConfig::from_env().context("invalid relay configuration")?;

    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }

    serve(config).await
}
