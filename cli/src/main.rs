use std::net::SocketAddr;
use std::process::ExitCode;

use chainwatch_core::ChainName;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Observe a chain's new blocks, logs and pending/finalized transactions,
/// republishing decoded records onto the pub/sub bus.
#[derive(Debug, Parser)]
struct Opts {
    /// which chain to observe (ethereum, arbitrum, base, optimism, polygon, avalanche)
    chain: String,
    /// Redis-compatible bus endpoint
    #[clap(long, default_value = "redis://127.0.0.1:6379")]
    bus_url: String,
    /// address the read-only HTTP status surface listens on
    #[clap(long, default_value = "127.0.0.1:8080")]
    http_addr: SocketAddr,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let opts = Opts::parse();

    let chain_name = match ChainName::parse(&opts.chain) {
        Ok(chain_name) => chain_name,
        Err(err) => {
            tracing::error!(error = %err, "invalid chain name");
            return ExitCode::FAILURE;
        }
    };

    match chainwatch_engine::supervisor::run(chain_name, &opts.bus_url, opts.http_addr).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "service exited with an error");
            ExitCode::FAILURE
        }
    }
}
