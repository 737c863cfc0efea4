//! Per-datagram drop decisions for the UDP transport.
//!
//! The only fault modelled is loss, rolled independently in each direction.
//! [`crate::transport::UdpTransport`] asks the [`LossSimulator`] once per
//! transmission (including retransmissions) and once per datagram accepted
//! from the peer:
//!
//! | Direction | Rate            | On a hit                                  |
//! |-----------|-----------------|-------------------------------------------|
//! | Send      | `outgoing_loss` | counted as an attempt, never reaches wire |
//! | Receive   | `incoming_loss` | discarded, the receive deadline runs on   |
//!
//! A rate of `0.0` never consumes randomness.  Seeding the generator makes a
//! run's drop pattern repeatable.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::ConfigError;

/// Loss rates for each direction plus an optional seed.  Rates outside
/// `[0.0, 1.0]` are rejected by [`LossSimulator::new`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulatorConfig {
    /// Probability that a flushed datagram is silently discarded.
    pub outgoing_loss: f64,
    /// Probability that a received datagram is silently discarded.
    pub incoming_loss: f64,
    /// RNG seed; `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

/// Per-datagram drop decisions.
#[derive(Debug)]
pub struct LossSimulator {
    outgoing_loss: f64,
    incoming_loss: f64,
    rng: StdRng,
}

impl Default for LossSimulator {
    fn default() -> Self {
        Self {
            outgoing_loss: 0.0,
            incoming_loss: 0.0,
            rng: StdRng::from_os_rng(),
        }
    }
}

impl LossSimulator {
    /// Build a simulator, rejecting rates outside `[0.0, 1.0]`.
    pub fn new(config: &SimulatorConfig) -> Result<Self, ConfigError> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self {
            outgoing_loss: check_rate(config.outgoing_loss)?,
            incoming_loss: check_rate(config.incoming_loss)?,
            rng,
        })
    }

    pub fn outgoing_loss(&self) -> f64 {
        self.outgoing_loss
    }

    pub fn incoming_loss(&self) -> f64 {
        self.incoming_loss
    }

    pub fn set_outgoing_loss(&mut self, rate: f64) -> Result<(), ConfigError> {
        self.outgoing_loss = check_rate(rate)?;
        Ok(())
    }

    pub fn set_incoming_loss(&mut self, rate: f64) -> Result<(), ConfigError> {
        self.incoming_loss = check_rate(rate)?;
        Ok(())
    }

    /// Should the datagram about to be sent be dropped?
    pub fn drop_outgoing(&mut self) -> bool {
        roll(&mut self.rng, self.outgoing_loss)
    }

    /// Should the datagram just received be dropped?
    pub fn drop_incoming(&mut self) -> bool {
        roll(&mut self.rng, self.incoming_loss)
    }
}

fn check_rate(rate: f64) -> Result<f64, ConfigError> {
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ConfigError::LossRate(rate))
    }
}

// `random::<f64>()` is in [0, 1), so a rate of 1.0 always drops and 0.0 never
// consumes randomness.
fn roll(rng: &mut StdRng, rate: f64) -> bool {
    rate > 0.0 && rng.random::<f64>() < rate
}
