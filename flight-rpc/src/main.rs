//! Entry point for the `flight-rpc` client.
//!
//! Builds a [`ClientConfig`] from the environment, applies command-line
//! overrides, opens the UDP transport and hands stdin/stdout to the shell.
//! All protocol work is delegated to library modules; `main.rs` owns only
//! process setup (logging, argument parsing).

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use flight_rpc::client::FlightClient;
use flight_rpc::config::ClientConfig;
use flight_rpc::shell::Shell;
use flight_rpc::transport::Transport;

/// Flight information system client.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Server host (overrides FLIGHT_SERVER_HOST).
    #[arg(long)]
    host: Option<String>,
    /// Server UDP port (overrides FLIGHT_SERVER_PORT).
    #[arg(long)]
    port: Option<u16>,
    /// Probability of a sent UDP packet being dropped.
    #[arg(short, long)]
    outgoing_drop: Option<f64>,
    /// Probability of a received UDP packet being dropped.
    #[arg(short, long)]
    incoming_drop: Option<f64>,
    /// Timeout in milliseconds when waiting for a server reply (0 = wait forever).
    #[arg(short, long)]
    timeout: Option<u64>,
    /// Number of timeout retries before aborting a call.
    #[arg(short, long)]
    retry: Option<u32>,
    /// Seed for the packet-loss simulator.
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    fn apply(self, cfg: &mut ClientConfig) {
        if let Some(host) = self.host {
            cfg.host = host;
        }
        if let Some(port) = self.port {
            cfg.port = port;
        }
        if let Some(rate) = self.outgoing_drop {
            cfg.outgoing_loss = rate;
        }
        if let Some(rate) = self.incoming_drop {
            cfg.incoming_loss = rate;
        }
        if let Some(ms) = self.timeout {
            cfg.timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }
        if let Some(retries) = self.retry {
            cfg.retries = retries;
        }
        if self.seed.is_some() {
            cfg.seed = self.seed;
        }
    }
}

fn main() -> Result<()> {
    // Set RUST_LOG to control verbosity.
    env_logger::init();

    let mut cfg = ClientConfig::from_env().context("reading FLIGHT_* environment")?;
    Cli::parse().apply(&mut cfg);

    let mut transport = cfg.build_transport().context("configuring transport")?;
    transport.open().context("opening UDP socket")?;
    log::info!(
        "Talking to {} (timeout {:?}, {} retries)",
        transport.peer(),
        cfg.timeout,
        cfg.retries
    );

    let mut shell = Shell::new(FlightClient::new(transport), io::stdout().lock());
    shell.run(io::stdin().lock())?;
    Ok(())
}
