//! Agent: one device that originates records and pulls catch-up data.
//!
//! Every operation first consults its own loss channel. A suppressed step
//! returns nothing and changes nothing.

use std::fmt;
use std::sync::Arc;

use synclog_core::{AgentId, CatchUpResponse, Probe, Record, RecordGenerator};

use crate::channel::AgentChannels;
use crate::reconcile::{apply_update, ReconcileOutcome};

/// An independent producer and consumer of the shared log.
///
/// `local_log` is always `synced ++ pending`: a prefix last installed from
/// the authority, followed by records generated here since then.
pub struct Agent {
    /// This agent's identity.
    id: AgentId,
    /// The agent's view of the log.
    local_log: Vec<Record>,
    /// Every record this agent originated, in order.
    sent_log: Vec<Record>,
    /// Length of the prefix of `local_log` installed from the authority.
    synced_len: usize,
    /// Source of new records.
    generator: Arc<dyn RecordGenerator>,
    /// Loss points.
    channels: AgentChannels,
}

impl Agent {
    /// Create an agent with empty logs.
    pub fn new(id: AgentId, generator: Arc<dyn RecordGenerator>, channels: AgentChannels) -> Self {
        Self {
            id,
            local_log: Vec::new(),
            sent_log: Vec::new(),
            synced_len: 0,
            generator,
            channels,
        }
    }

    /// This agent's id.
    pub fn id(&self) -> &AgentId {
        &self.id
    }

    /// The local log.
    pub fn local_log(&self) -> &[Record] {
        &self.local_log
    }

    /// Records this agent originated.
    pub fn sent_log(&self) -> &[Record] {
        &self.sent_log
    }

    /// Length of the prefix confirmed by the authority.
    pub fn synced_len(&self) -> usize {
        self.synced_len
    }

    /// Locally generated records not yet reflected by a response.
    pub fn pending(&self) -> &[Record] {
        &self.local_log[self.synced_len..]
    }

    /// Maybe produce a new record.
    ///
    /// On success the record is appended to both the local and sent logs.
    pub fn generate_record(&mut self) -> Option<Record> {
        if !self.channels.generate.should_deliver() {
            tracing::trace!(agent = %self.id, "no new record this round");
            return None;
        }

        let record = self.generator.next(&self.id);
        self.local_log.push(record.clone());
        self.sent_log.push(record.clone());
        Some(record)
    }

    /// Maybe produce a probe.
    ///
    /// The probe asks for everything from the synchronized length onward,
    /// so records generated since the last response are re-read in the
    /// authority's order. Without pending records this is the local length.
    pub fn emit_probe(&self) -> Option<Probe> {
        if !self.channels.probe.should_deliver() {
            tracing::trace!(agent = %self.id, "probe suppressed");
            return None;
        }

        Some(Probe::new(self.id.clone(), self.synced_len as u64))
    }

    /// Apply a catch-up response, if one arrived and gets noticed.
    pub fn reconcile(&mut self, response: Option<&CatchUpResponse>) -> ReconcileOutcome {
        if !self.channels.receive.should_deliver() {
            tracing::trace!(agent = %self.id, "response not noticed");
            return ReconcileOutcome::Ignored;
        }

        let Some(response) = response else {
            return ReconcileOutcome::Absent;
        };

        let outcome = apply_update(&mut self.local_log, response);
        match outcome {
            ReconcileOutcome::Applied {
                kept,
                replaced,
                appended,
            } => {
                self.synced_len = response.end() as usize;
                tracing::debug!(
                    agent = %self.id,
                    kept,
                    replaced,
                    appended,
                    "applied update"
                );
            }
            ReconcileOutcome::Stale { from, local_len } => {
                tracing::debug!(agent = %self.id, from, local_len, "discarded stale update");
            }
            ReconcileOutcome::Ignored | ReconcileOutcome::Absent => {}
        }

        outcome
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("local_len", &self.local_log.len())
            .field("sent_len", &self.sent_log.len())
            .field("synced_len", &self.synced_len)
            .finish()
    }
}
