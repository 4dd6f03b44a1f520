//! Simulation configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use synclog_core::DEFAULT_PAYLOAD_FIELDS;
use synclog_sync::DropProbabilities;

use crate::error::{Result, SimError};

/// Configuration for a simulation run.
///
/// Every field has a default, so a config file only needs the overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of agents.
    pub agents: usize,
    /// Generation rounds before settling.
    pub rounds: u64,
    /// Give up settling after this many rounds. `None` keeps retrying.
    pub max_settle_rounds: Option<u64>,
    /// Seed for reproducible loss patterns.
    pub seed: Option<u64>,
    /// Drop probabilities shared by every agent.
    pub drop: DropProbabilities,
    /// Payload field names.
    pub payload_fields: Vec<String>,
    /// Run agents as independent tasks over the in-memory transport.
    ///
    /// Read by [`crate::simulation::run`]; the drivers themselves ignore it.
    pub concurrent: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            agents: 10,
            rounds: 1000,
            max_settle_rounds: None,
            seed: None,
            drop: DropProbabilities::default(),
            payload_fields: DEFAULT_PAYLOAD_FIELDS.iter().map(|f| f.to_string()).collect(),
            concurrent: false,
        }
    }
}

impl SimulationConfig {
    /// Load and validate a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration can drive a run.
    pub fn validate(&self) -> Result<()> {
        if self.agents == 0 {
            return Err(SimError::InvalidConfig("at least one agent is required".into()));
        }
        if self.payload_fields.is_empty() {
            return Err(SimError::InvalidConfig("payload_fields must not be empty".into()));
        }
        self.drop.validate()?;
        Ok(())
    }
}
