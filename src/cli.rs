//! Command line configuration

use std::net::SocketAddr;

use clap::Parser;

/// Default listening endpoint (all IPv4 interfaces, port 15001)
pub const DEFAULT_LISTEN: &str = "0.0.0.0:15001";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Socket address to accept chat connections on. Use port 0 for an ephemeral port.
    #[arg(long, default_value = DEFAULT_LISTEN)]
    pub listen: SocketAddr,
}
