//! One agent's turn in a sync round.
//!
//! ```text
//! Agent                              Authority
//!   |  emit_probe()  (gate: skip the turn if suppressed)
//!   |-------- RECORD (if generated) -->|
//!   |-------- PROBE (fresh) ---------->|
//!   |<------- UPDATE ------------------|
//!   |  reconcile()
//! ```
//!
//! Settle rounds skip the gate and generation: probe, then reconcile.

use synclog_core::{Message, Record};

use crate::agent::Agent;
use crate::authority::SyncAuthority;
use crate::error::Result;
use crate::reconcile::ReconcileOutcome;
use crate::transport::Transport;

/// What one agent did during a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundOutcome {
    /// Whether the opening probe got through.
    pub participated: bool,
    /// The record submitted this round, if any.
    pub generated: Option<Record>,
    /// How the response was applied, if the agent participated.
    pub reconcile: Option<ReconcileOutcome>,
}

impl RoundOutcome {
    fn skipped() -> Self {
        Self {
            participated: false,
            generated: None,
            reconcile: None,
        }
    }
}

/// Run one generation round for `agent` against a local authority.
pub fn sync_round(agent: &mut Agent, authority: &SyncAuthority) -> Result<RoundOutcome> {
    if agent.emit_probe().is_none() {
        return Ok(RoundOutcome::skipped());
    }

    let generated = agent.generate_record();
    authority.handle(generated.clone().map(Message::Record))?;

    let response = authority.handle(agent.emit_probe().map(Message::Probe))?;
    let reconcile = agent.reconcile(response.as_ref());

    Ok(RoundOutcome {
        participated: true,
        generated,
        reconcile: Some(reconcile),
    })
}

/// Run one settle round (probe and reconcile only).
pub fn settle_round(agent: &mut Agent, authority: &SyncAuthority) -> Result<ReconcileOutcome> {
    let response = authority.handle(agent.emit_probe().map(Message::Probe))?;
    Ok(agent.reconcile(response.as_ref()))
}

/// [`sync_round`] over a transport.
pub async fn sync_round_over<T: Transport + ?Sized>(
    agent: &mut Agent,
    transport: &T,
) -> Result<RoundOutcome> {
    if agent.emit_probe().is_none() {
        return Ok(RoundOutcome::skipped());
    }

    let generated = agent.generate_record();
    if let Some(record) = &generated {
        transport.send(Message::Record(record.clone())).await?;
    }

    let response = match agent.emit_probe() {
        Some(probe) => transport.send(Message::Probe(probe)).await?,
        None => None,
    };
    let reconcile = agent.reconcile(response.as_ref());

    Ok(RoundOutcome {
        participated: true,
        generated,
        reconcile: Some(reconcile),
    })
}

/// [`settle_round`] over a transport.
pub async fn settle_round_over<T: Transport + ?Sized>(
    agent: &mut Agent,
    transport: &T,
) -> Result<ReconcileOutcome> {
    let response = match agent.emit_probe() {
        Some(probe) => transport.send(Message::Probe(probe)).await?,
        None => None,
    };
    Ok(agent.reconcile(response.as_ref()))
}
