//! Sequential convergence driver.
//!
//! Every round visits each agent in turn against one shared authority.
//! After the generation rounds, settle rounds (probe and reconcile only)
//! repeat until every agent's log equals the authority's.

use std::sync::Arc;

use synclog_core::{AgentId, Digest, RandomRecordGenerator, Record, RecordGenerator};
use synclog_sync::{
    log_state_hash, settle_round, sync_round, verify_authorship, verify_convergence, Agent,
    AgentChannels, SyncAuthority, SyncError,
};

use crate::config::SimulationConfig;
use crate::error::Result;
use crate::report::{RunStats, SimulationReport};

/// Build the configured agents, all drawing records from `generator`.
///
/// With a seed, agent `i` derives its channels from `seed + i`.
pub fn build_agents(
    config: &SimulationConfig,
    generator: Arc<dyn RecordGenerator>,
) -> Result<Vec<Agent>> {
    (0..config.agents)
        .map(|i| -> Result<Agent> {
            let seed = config.seed.map(|s| s.wrapping_add(i as u64));
            let channels = AgentChannels::from_probabilities(&config.drop, seed)?;
            Ok(Agent::new(AgentId::indexed(i), generator.clone(), channels))
        })
        .collect()
}

/// Check every agent against the authority log.
///
/// Returns the shared state hash on success.
pub fn verify_agents(authority_log: &[Record], agents: &[Agent]) -> Result<Option<Digest>> {
    let convergence = verify_convergence(authority_log, agents);
    if !convergence.is_converged() {
        return Err(SyncError::VerificationFailed(convergence.to_string()).into());
    }

    let authorship = verify_authorship(authority_log, agents);
    if !authorship.is_converged() {
        return Err(SyncError::VerificationFailed(authorship.to_string()).into());
    }

    Ok(log_state_hash(authority_log))
}

/// A set of agents and one authority, driven round by round.
pub struct Simulation {
    config: SimulationConfig,
    authority: Arc<SyncAuthority>,
    agents: Vec<Agent>,
    stats: RunStats,
    rounds_run: u64,
    settle_rounds: u64,
}

impl Simulation {
    /// Create a simulation with random payloads.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let generator = Arc::new(RandomRecordGenerator::new(config.payload_fields.clone()));
        Self::with_generator(config, generator)
    }

    /// Create a simulation drawing records from `generator`.
    pub fn with_generator(
        config: SimulationConfig,
        generator: Arc<dyn RecordGenerator>,
    ) -> Result<Self> {
        config.validate()?;
        let agents = build_agents(&config, generator)?;
        Ok(Self::with_agents(config, agents))
    }

    /// Create a simulation over prebuilt agents.
    ///
    /// `config.agents` is ignored in favour of `agents`.
    pub fn with_agents(config: SimulationConfig, agents: Vec<Agent>) -> Self {
        Self {
            config,
            authority: Arc::new(SyncAuthority::new()),
            agents,
            stats: RunStats::default(),
            rounds_run: 0,
            settle_rounds: 0,
        }
    }

    /// The authority.
    pub fn authority(&self) -> &SyncAuthority {
        &self.authority
    }

    /// The agents.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Counters so far.
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Generation rounds run so far.
    pub fn rounds_run(&self) -> u64 {
        self.rounds_run
    }

    /// Run one generation round for every agent.
    pub fn run_round(&mut self) -> Result<()> {
        for agent in &mut self.agents {
            let outcome = sync_round(agent, &self.authority)?;
            self.stats.record_round(&outcome);
        }
        self.rounds_run += 1;
        Ok(())
    }

    /// Whether every agent's log equals the authority log.
    pub fn is_converged(&self) -> bool {
        verify_convergence(&self.authority.snapshot(), &self.agents).is_converged()
    }

    /// Run settle rounds until converged. Returns the number of rounds used.
    ///
    /// Fails with [`SyncError::NotConverged`] once `max_settle_rounds` is
    /// exhausted.
    pub fn settle(&mut self) -> Result<u64> {
        let start = self.settle_rounds;
        while !self.is_converged() {
            let used = self.settle_rounds - start;
            if let Some(max) = self.config.max_settle_rounds {
                if used >= max {
                    tracing::info!(rounds = used, "giving up on convergence");
                    return Err(SyncError::NotConverged { rounds: used }.into());
                }
            }

            for agent in &mut self.agents {
                let outcome = settle_round(agent, &self.authority)?;
                self.stats.record_reconcile(outcome);
            }
            self.settle_rounds += 1;
        }
        Ok(self.settle_rounds - start)
    }

    /// Verify convergence and authorship, returning the state hash.
    pub fn verify(&self) -> Result<Option<Digest>> {
        verify_agents(&self.authority.snapshot(), &self.agents)
    }

    /// Run the configured rounds, settle and verify.
    pub fn run(&mut self) -> Result<SimulationReport> {
        tracing::info!(
            agents = self.agents.len(),
            rounds = self.config.rounds,
            "starting simulation"
        );

        for _ in 0..self.config.rounds {
            self.run_round()?;
        }
        tracing::info!(records = self.authority.len(), "generation finished, settling");

        let settle_rounds = self.settle()?;
        let state_hash = self.verify()?;
        tracing::info!(settle_rounds, records = self.authority.len(), "converged");

        Ok(SimulationReport {
            agents: self.agents.len(),
            rounds: self.rounds_run,
            settle_rounds,
            log_len: self.authority.len(),
            state_hash,
            stats: self.stats,
        })
    }
}

/// Run `config` with the driver it selects.
///
/// With `concurrent` set, each agent becomes a task on the current runtime;
/// otherwise the sequential driver runs inline.
pub async fn run(config: SimulationConfig) -> Result<SimulationReport> {
    if config.concurrent {
        crate::concurrent::run_concurrent(config).await
    } else {
        Simulation::new(config)?.run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use synclog_sync::DropProbabilities;

    fn lossless(agents: usize, rounds: u64) -> SimulationConfig {
        SimulationConfig {
            agents,
            rounds,
            drop: DropProbabilities::NONE,
            ..Default::default()
        }
    }

    #[test]
    fn test_lossless_run_settles_in_one_round() {
        let mut sim = Simulation::new(lossless(3, 4)).unwrap();
        for _ in 0..4 {
            sim.run_round().unwrap();
        }
        assert_eq!(sim.authority().len(), 12);

        // The last agent of the last round saw everything; earlier ones did not.
        assert!(!sim.is_converged());
        assert_eq!(sim.settle().unwrap(), 1);
        assert!(sim.verify().unwrap().is_some());
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let config = SimulationConfig {
            agents: 4,
            rounds: 30,
            seed: Some(7),
            ..Default::default()
        };
        let a = Simulation::new(config.clone()).unwrap().run().unwrap();
        let b = Simulation::new(config).unwrap().run().unwrap();

        // Payloads are random, the loss pattern is not.
        assert_eq!(a.log_len, b.log_len);
        assert_eq!(a.settle_rounds, b.settle_rounds);
        assert_eq!(a.stats, b.stats);
    }

    #[test]
    fn test_settle_cap() {
        let config = SimulationConfig {
            agents: 2,
            rounds: 3,
            max_settle_rounds: Some(5),
            drop: DropProbabilities {
                record: 0.0,
                probe: 0.0,
                response: 1.0,
            },
            ..Default::default()
        };
        let mut sim = Simulation::new(config).unwrap();
        let err = sim.run().unwrap_err();
        assert!(matches!(
            err,
            SimError::Sync(SyncError::NotConverged { rounds: 5 })
        ));
    }

    #[test]
    fn test_build_agents_ids() {
        let config = lossless(3, 0);
        let agents = build_agents(&config, Arc::new(RandomRecordGenerator::default())).unwrap();
        let ids: Vec<_> = agents.iter().map(|a| a.id().to_string()).collect();
        assert_eq!(ids, vec!["dev_0", "dev_1", "dev_2"]);
    }

    #[tokio::test]
    async fn test_run_dispatches_on_concurrent() {
        for concurrent in [false, true] {
            let config = SimulationConfig {
                concurrent,
                ..lossless(3, 4)
            };
            let report = run(config).await.unwrap();
            assert_eq!(report.log_len, 12);
            assert_eq!(report.stats.generated, 12);
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SimulationConfig {
            agents: 0,
            ..Default::default()
        };
        assert!(matches!(
            Simulation::new(config),
            Err(SimError::InvalidConfig(_))
        ));
    }
}
