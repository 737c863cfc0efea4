//! Client configuration: peer address, datagram size, timeout/retry policy
//! and synthetic loss rates.
//!
//! Values come from defaults, then the environment ([`ClientConfig::from_env`]),
//! then whatever the binary's command line overrides.
//!
//! | Variable               | Field           | Default       |
//! |------------------------|-----------------|---------------|
//! | `FLIGHT_SERVER_HOST`   | `host`          | `127.0.0.1`   |
//! | `FLIGHT_SERVER_PORT`   | `port`          | `12345`       |
//! | `FLIGHT_UDP_BUF_SIZE`  | `max_datagram`  | `65535`       |
//! | `FLIGHT_TIMEOUT_MS`    | `timeout`       | none (0)      |
//! | `FLIGHT_RETRIES`       | `retries`       | `0`           |
//! | `FLIGHT_OUTGOING_DROP` | `outgoing_loss` | `0.0`         |
//! | `FLIGHT_INCOMING_DROP` | `incoming_loss` | `0.0`         |
//! | `FLIGHT_SEED`          | `seed`          | none          |

use std::net::{SocketAddr, ToSocketAddrs};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ConfigError, Result};
use crate::simulator::{LossSimulator, SimulatorConfig};
use crate::transport::{UdpTransport, MAX_DATAGRAM};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 12345;

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Largest message that may be sent.
    pub max_datagram: usize,
    /// Per-receive timeout; `None` blocks indefinitely.
    pub timeout: Option<Duration>,
    /// Retransmissions after the first send.
    pub retries: u32,
    pub outgoing_loss: f64,
    pub incoming_loss: f64,
    pub seed: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_datagram: MAX_DATAGRAM,
            timeout: None,
            retries: 0,
            outgoing_loss: 0.0,
            incoming_loss: 0.0,
            seed: None,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `FLIGHT_*` environment variables.
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) but reading from an arbitrary source.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> std::result::Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Some(host) = lookup("FLIGHT_SERVER_HOST") {
            cfg.host = host;
        }
        if let Some(port) = parse(&lookup, "FLIGHT_SERVER_PORT")? {
            cfg.port = port;
        }
        if let Some(size) = parse(&lookup, "FLIGHT_UDP_BUF_SIZE")? {
            cfg.max_datagram = size;
        }
        if let Some(ms) = parse::<u64>(&lookup, "FLIGHT_TIMEOUT_MS")? {
            cfg.timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }
        if let Some(retries) = parse(&lookup, "FLIGHT_RETRIES")? {
            cfg.retries = retries;
        }
        if let Some(rate) = parse(&lookup, "FLIGHT_OUTGOING_DROP")? {
            cfg.outgoing_loss = rate;
        }
        if let Some(rate) = parse(&lookup, "FLIGHT_INCOMING_DROP")? {
            cfg.incoming_loss = rate;
        }
        if let Some(seed) = parse(&lookup, "FLIGHT_SEED")? {
            cfg.seed = Some(seed);
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        for rate in [self.outgoing_loss, self.incoming_loss] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::LossRate(rate));
            }
        }
        if self.max_datagram == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_datagram",
                value: "0".into(),
            });
        }
        Ok(())
    }

    /// Resolve `host:port` to the first matching socket address.
    pub fn peer_addr(&self) -> std::result::Result<SocketAddr, ConfigError> {
        let target = format!("{}:{}", self.host, self.port);
        target
            .to_socket_addrs()
            .map_err(|_| ConfigError::Resolve(target.clone()))?
            .next()
            .ok_or(ConfigError::Resolve(target))
    }

    pub fn simulator_config(&self) -> SimulatorConfig {
        SimulatorConfig {
            outgoing_loss: self.outgoing_loss,
            incoming_loss: self.incoming_loss,
            seed: self.seed,
        }
    }

    /// A closed [`UdpTransport`] configured from these settings.
    pub fn build_transport(&self) -> Result<UdpTransport> {
        self.validate()?;
        let mut transport = UdpTransport::new(self.peer_addr()?);
        transport.set_timeout(self.timeout);
        transport.set_max_retries(self.retries);
        transport.set_max_datagram(self.max_datagram);
        transport.set_simulator(LossSimulator::new(&self.simulator_config())?);
        Ok(transport)
    }
}

fn parse<V: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> std::result::Result<Option<V>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}
