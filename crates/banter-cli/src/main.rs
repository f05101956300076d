//! Banter interactive chat client.
//!
//! # Usage
//!
//! ```bash
//! # Connect to a local server
//! banter
//!
//! # Connect to a remote server with client-side debug logging
//! RUST_LOG=banter_client=debug banter --server 198.51.100.7:9090
//! ```

use std::net::SocketAddr;

use banter_client::{Client, quic};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod repl;

/// Banter chat client
#[derive(Parser, Debug)]
#[command(name = "banter")]
#[command(about = "Interactive client for the banter chat protocol")]
#[command(version)]
struct Args {
    /// Server address to connect to
    #[arg(short, long, default_value = "127.0.0.1:9090")]
    server: SocketAddr,

    /// Log level used when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("connecting to {}", args.server);
    let connection = quic::connect(args.server).await?;
    let client = Client::new(connection.clone());

    repl::run(client).await?;

    connection.close();
    Ok(())
}
