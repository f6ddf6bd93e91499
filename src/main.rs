//! TCP Chat Relay - Entry Point
//!
//! Parses the command line, installs logging and runs the accept loop.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use chat_relay::{Cli, Listener};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chat_relay=info")),
        )
        .init();

    let cli = Cli::parse();

    let listener = Listener::bind(cli.listen).await?;
    listener.run_until_ctrl_c().await?;

    Ok(())
}
