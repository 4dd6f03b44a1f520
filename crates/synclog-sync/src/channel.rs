//! Unreliable delivery decisions.
//!
//! Every step that can be lost (record generation, probing, noticing a
//! response) consults its own [`Channel`]. Tests inject channels with drop
//! probability 0 or 1, or scripted ones, instead of relying on randomness.

use std::sync::{Arc, Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::DropProbabilities;
use crate::error::{Result, SyncError};

/// Pass/drop filter consulted once per candidate message.
///
/// Implementations must be thread-safe (Send + Sync).
pub trait Channel: Send + Sync {
    /// Whether the message at this call site gets through.
    fn should_deliver(&self) -> bool;
}

/// Check that `p` is a usable probability.
pub fn validate_probability(p: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(SyncError::InvalidProbability(p))
    }
}

/// Channel that drops each message independently with a fixed probability.
pub struct LossyChannel {
    drop_probability: f64,
    rng: Mutex<StdRng>,
}

impl LossyChannel {
    /// Create a channel seeded from OS entropy.
    pub fn new(drop_probability: f64) -> Result<Self> {
        Ok(Self {
            drop_probability: validate_probability(drop_probability)?,
            rng: Mutex::new(StdRng::from_entropy()),
        })
    }

    /// Create a channel with a reproducible drop sequence.
    pub fn seeded(drop_probability: f64, seed: u64) -> Result<Self> {
        Ok(Self {
            drop_probability: validate_probability(drop_probability)?,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        })
    }

    /// A channel that never drops.
    pub fn reliable() -> Self {
        Self {
            drop_probability: 0.0,
            rng: Mutex::new(StdRng::seed_from_u64(0)),
        }
    }

    /// A channel that drops everything.
    pub fn dead() -> Self {
        Self {
            drop_probability: 1.0,
            rng: Mutex::new(StdRng::seed_from_u64(0)),
        }
    }
}

impl Channel for LossyChannel {
    fn should_deliver(&self) -> bool {
        if self.drop_probability <= 0.0 {
            return true;
        }
        if self.drop_probability >= 1.0 {
            return false;
        }

        let roll: f64 = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen();
        roll >= self.drop_probability
    }
}

impl std::fmt::Debug for LossyChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LossyChannel")
            .field("drop_probability", &self.drop_probability)
            .finish()
    }
}

/// The three independent loss points of one agent.
#[derive(Clone)]
pub struct AgentChannels {
    /// Suppresses record generation ("no new data this round").
    pub generate: Arc<dyn Channel>,
    /// Suppresses probes.
    pub probe: Arc<dyn Channel>,
    /// Suppresses noticing a delivered response.
    pub receive: Arc<dyn Channel>,
}

impl AgentChannels {
    /// Build from explicit channels.
    pub fn new(
        generate: Arc<dyn Channel>,
        probe: Arc<dyn Channel>,
        receive: Arc<dyn Channel>,
    ) -> Self {
        Self {
            generate,
            probe,
            receive,
        }
    }

    /// Build lossy channels from configured probabilities.
    ///
    /// With a seed, the three channels get distinct derived seeds so their
    /// drop sequences are independent but reproducible.
    pub fn from_probabilities(drop: &DropProbabilities, seed: Option<u64>) -> Result<Self> {
        let make = |p: f64, offset: u64| -> Result<Arc<dyn Channel>> {
            let channel = match seed {
                Some(seed) => LossyChannel::seeded(p, seed.wrapping_mul(3).wrapping_add(offset))?,
                None => LossyChannel::new(p)?,
            };
            Ok(Arc::new(channel))
        };

        Ok(Self {
            generate: make(drop.record, 0)?,
            probe: make(drop.probe, 1)?,
            receive: make(drop.response, 2)?,
        })
    }

    /// Channels that never drop anything.
    pub fn reliable() -> Self {
        let channel: Arc<dyn Channel> = Arc::new(LossyChannel::reliable());
        Self::new(channel.clone(), channel.clone(), channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reliable_and_dead() {
        let reliable = LossyChannel::reliable();
        let dead = LossyChannel::dead();
        for _ in 0..100 {
            assert!(reliable.should_deliver());
            assert!(!dead.should_deliver());
        }
    }

    #[test]
    fn test_probability_bounds_enforced() {
        assert!(matches!(
            LossyChannel::new(1.5),
            Err(SyncError::InvalidProbability(p)) if p == 1.5
        ));
        assert!(LossyChannel::new(-0.1).is_err());
        assert!(LossyChannel::new(f64::NAN).is_err());
        assert!(LossyChannel::new(0.0).is_ok());
        assert!(LossyChannel::new(1.0).is_ok());
    }

    #[test]
    fn test_seeded_channel_reproducible() {
        let a = LossyChannel::seeded(0.5, 99).unwrap();
        let b = LossyChannel::seeded(0.5, 99).unwrap();
        let run_a: Vec<bool> = (0..64).map(|_| a.should_deliver()).collect();
        let run_b: Vec<bool> = (0..64).map(|_| b.should_deliver()).collect();
        assert_eq!(run_a, run_b);
    }

    #[test]
    fn test_drop_rate_roughly_matches() {
        let channel = LossyChannel::seeded(0.4, 7).unwrap();
        let delivered = (0..10_000).filter(|_| channel.should_deliver()).count();
        // Expect ~6000 deliveries.
        assert!((5_500..6_500).contains(&delivered), "delivered {}", delivered);
    }

    #[test]
    fn test_agent_channels_from_probabilities() {
        let drop = DropProbabilities {
            record: 1.0,
            probe: 0.0,
            response: 1.0,
        };
        let channels = AgentChannels::from_probabilities(&drop, Some(1)).unwrap();
        assert!(!channels.generate.should_deliver());
        assert!(channels.probe.should_deliver());
        assert!(!channels.receive.should_deliver());
    }

    #[test]
    fn test_agent_channels_reject_bad_probability() {
        let drop = DropProbabilities {
            record: 0.4,
            probe: 2.0,
            response: 0.6,
        };
        assert!(AgentChannels::from_probabilities(&drop, None).is_err());
    }
}
