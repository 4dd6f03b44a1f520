//! Concurrent convergence driver.
//!
//! Each agent runs as its own tokio task and reaches the authority only
//! through a [`MemoryTransport`], so every message crosses the wire codec
//! and arrives interleaved with other agents' traffic.

use std::sync::Arc;

use tokio::task::JoinHandle;

use synclog_core::{RandomRecordGenerator, RecordGenerator};
use synclog_sync::round::{settle_round_over, sync_round_over};
use synclog_sync::{Agent, AuthorityService, MemoryTransport, SyncAuthority, SyncError};

use crate::config::SimulationConfig;
use crate::error::{Result, SimError};
use crate::report::{RunStats, SimulationReport};
use crate::simulation::{build_agents, verify_agents};

/// Requests buffered per agent before senders wait on the service.
const QUEUE_DEPTH_PER_AGENT: usize = 4;

/// Run a simulation with random payloads and one task per agent.
pub async fn run_concurrent(config: SimulationConfig) -> Result<SimulationReport> {
    let generator = Arc::new(RandomRecordGenerator::new(config.payload_fields.clone()));
    run_concurrent_with(config, generator).await
}

/// Run a concurrent simulation drawing records from `generator`.
pub async fn run_concurrent_with(
    config: SimulationConfig,
    generator: Arc<dyn RecordGenerator>,
) -> Result<SimulationReport> {
    config.validate()?;

    let authority = Arc::new(SyncAuthority::new());
    let (transport, service) =
        AuthorityService::spawn(authority.clone(), config.agents * QUEUE_DEPTH_PER_AGENT);
    let agents = build_agents(&config, generator)?;

    tracing::info!(
        agents = agents.len(),
        rounds = config.rounds,
        "starting concurrent simulation"
    );

    let rounds = config.rounds;
    let handles: Vec<_> = agents
        .into_iter()
        .map(|agent| {
            let transport = transport.clone();
            tokio::spawn(generate(agent, transport, rounds))
        })
        .collect();
    let generated = match join_all(handles).await {
        Ok(generated) => generated,
        Err(e) => {
            service.abort();
            return Err(e);
        }
    };

    // Nothing appends from here on, so the target length is fixed.
    let target = authority.len();
    tracing::info!(records = target, "generation finished, settling");

    let max_settle_rounds = config.max_settle_rounds;
    let handles: Vec<_> = generated
        .into_iter()
        .map(|(agent, stats)| {
            let transport = transport.clone();
            tokio::spawn(settle(agent, stats, transport, target, max_settle_rounds))
        })
        .collect();
    let settled = match join_all(handles).await {
        Ok(settled) => settled,
        Err(e) => {
            service.abort();
            return Err(e);
        }
    };

    drop(transport);
    service
        .await
        .map_err(|e| SimError::TaskFailed(format!("authority service: {}", e)))?;

    let mut stats = RunStats::default();
    let mut settle_rounds = 0;
    let mut agents = Vec::with_capacity(settled.len());
    for (agent, agent_stats, used) in settled {
        stats.merge(&agent_stats);
        settle_rounds = settle_rounds.max(used);
        agents.push(agent);
    }

    let authority_log = authority.snapshot();
    let state_hash = verify_agents(&authority_log, &agents)?;
    tracing::info!(settle_rounds, records = authority_log.len(), "converged");

    Ok(SimulationReport {
        agents: agents.len(),
        rounds,
        settle_rounds,
        log_len: authority_log.len(),
        state_hash,
        stats,
    })
}

async fn generate(
    mut agent: Agent,
    transport: MemoryTransport,
    rounds: u64,
) -> synclog_sync::Result<(Agent, RunStats)> {
    let mut stats = RunStats::default();
    for _ in 0..rounds {
        let outcome = sync_round_over(&mut agent, &transport).await?;
        stats.record_round(&outcome);
        tokio::task::yield_now().await;
    }
    Ok((agent, stats))
}

async fn settle(
    mut agent: Agent,
    mut stats: RunStats,
    transport: MemoryTransport,
    target: usize,
    max_rounds: Option<u64>,
) -> synclog_sync::Result<(Agent, RunStats, u64)> {
    let mut used = 0;
    while agent.synced_len() < target {
        if max_rounds.is_some_and(|max| used >= max) {
            tracing::info!(agent = %agent.id(), rounds = used, "giving up on convergence");
            return Err(SyncError::NotConverged { rounds: used });
        }

        let outcome = settle_round_over(&mut agent, &transport).await?;
        stats.record_reconcile(outcome);
        used += 1;
        tokio::task::yield_now().await;
    }
    Ok((agent, stats, used))
}

/// Await every task in order. The first failure aborts the tasks not yet
/// awaited.
async fn join_all<T>(handles: Vec<JoinHandle<synclog_sync::Result<T>>>) -> Result<Vec<T>> {
    let mut results = Vec::with_capacity(handles.len());
    let mut remaining = handles.into_iter();
    while let Some(handle) = remaining.next() {
        let err = match handle.await {
            Ok(Ok(value)) => {
                results.push(value);
                continue;
            }
            Ok(Err(e)) => SimError::from(e),
            Err(e) => SimError::TaskFailed(e.to_string()),
        };
        for rest in remaining.by_ref() {
            rest.abort();
        }
        return Err(err);
    }
    Ok(results)
}
