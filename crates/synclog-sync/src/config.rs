//! Loss configuration for agents.

use serde::{Deserialize, Serialize};

use crate::channel::validate_probability;
use crate::error::Result;

/// Drop probabilities for the three independent loss points of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropProbabilities {
    /// Chance that an agent has no new record in a round.
    pub record: f64,
    /// Chance that a probe is never sent.
    pub probe: f64,
    /// Chance that a delivered response goes unnoticed.
    pub response: f64,
}

impl DropProbabilities {
    /// No loss anywhere.
    pub const NONE: Self = Self {
        record: 0.0,
        probe: 0.0,
        response: 0.0,
    };

    /// Check every probability is within `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        validate_probability(self.record)?;
        validate_probability(self.probe)?;
        validate_probability(self.response)?;
        Ok(())
    }

    /// Whether some step can never succeed, so convergence is impossible.
    pub fn blocks_convergence(&self) -> bool {
        self.probe >= 1.0 || self.response >= 1.0
    }
}

impl Default for DropProbabilities {
    fn default() -> Self {
        Self {
            record: 0.4,
            probe: 0.5,
            response: 0.6,
        }
    }
}
