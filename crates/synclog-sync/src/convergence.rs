//! Convergence verification.
//!
//! After a run, every agent's log should equal the authority's, and the
//! authority's log split by author should equal what each agent sent.

use std::collections::HashMap;
use std::fmt;

use synclog_core::{AgentId, Digest, Record};

use crate::agent::Agent;

/// Compute a deterministic state hash for a log.
///
/// Algorithm:
/// 1. Start from a domain-separated Blake3 hasher
/// 2. Feed each record digest in log order
/// 3. Return the final hash, or `None` for an empty log
pub fn log_state_hash(records: &[Record]) -> Option<Digest> {
    if records.is_empty() {
        return None;
    }

    let mut hasher = blake3::Hasher::new();
    hasher.update(b"synclog-state-v0:");
    for record in records {
        hasher.update(record.digest().as_bytes());
    }

    Some(hasher.finalize().into())
}

/// Result of convergence verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvergenceResult {
    /// Every agent holds exactly the authority log.
    Converged,
    /// An agent is consistent so far but not caught up.
    NotConverged { agent: AgentId, reason: String },
    /// An agent holds a different record at a shared position.
    Diverged { agent: AgentId, at_index: usize },
    /// The authority's records for an agent don't match its sent log.
    AuthorshipMismatch { agent: AgentId, reason: String },
}

impl ConvergenceResult {
    /// Check if verification passed.
    pub fn is_converged(&self) -> bool {
        matches!(self, ConvergenceResult::Converged)
    }

    /// Check if a divergent record was found.
    pub fn is_diverged(&self) -> bool {
        matches!(self, ConvergenceResult::Diverged { .. })
    }
}

impl fmt::Display for ConvergenceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvergenceResult::Converged => write!(f, "converged"),
            ConvergenceResult::NotConverged { agent, reason } => {
                write!(f, "{} not converged: {}", agent, reason)
            }
            ConvergenceResult::Diverged { agent, at_index } => {
                write!(f, "{} diverged at index {}", agent, at_index)
            }
            ConvergenceResult::AuthorshipMismatch { agent, reason } => {
                write!(f, "{} authorship mismatch: {}", agent, reason)
            }
        }
    }
}

/// Index of the first position where two logs disagree.
pub fn first_divergence(a: &[Record], b: &[Record]) -> Option<usize> {
    a.iter().zip(b).position(|(x, y)| x != y)
}

/// Whether `log` is a prefix of `authority_log`.
pub fn is_prefix_of(log: &[Record], authority_log: &[Record]) -> bool {
    log.len() <= authority_log.len() && first_divergence(log, authority_log).is_none()
}

/// Verify every agent's local log equals the authority log.
///
/// Each local log must first be a prefix of the authority log; only then
/// does a length difference count as merely lagging behind.
pub fn verify_convergence(authority_log: &[Record], agents: &[Agent]) -> ConvergenceResult {
    for agent in agents {
        let local = agent.local_log();

        if !is_prefix_of(local, authority_log) {
            return match first_divergence(local, authority_log) {
                Some(at_index) => ConvergenceResult::Diverged {
                    agent: agent.id().clone(),
                    at_index,
                },
                None => ConvergenceResult::NotConverged {
                    agent: agent.id().clone(),
                    reason: format!(
                        "local log holds {} records the authority lacks",
                        local.len() - authority_log.len()
                    ),
                },
            };
        }

        if local.len() != authority_log.len() {
            return ConvergenceResult::NotConverged {
                agent: agent.id().clone(),
                reason: format!(
                    "length mismatch: local={}, authority={}",
                    local.len(),
                    authority_log.len()
                ),
            };
        }
    }

    ConvergenceResult::Converged
}

/// Verify the authority log, partitioned by author, equals each sent log.
///
/// Catches lost records (sent but never appended) as well as reordering of
/// one author's records.
pub fn verify_authorship(authority_log: &[Record], agents: &[Agent]) -> ConvergenceResult {
    let mut by_author: HashMap<&AgentId, Vec<&Record>> = HashMap::new();
    for record in authority_log {
        by_author.entry(record.author_id()).or_default().push(record);
    }

    for agent in agents {
        let authored = by_author.remove(agent.id()).unwrap_or_default();
        let sent = agent.sent_log();

        if authored.len() != sent.len() {
            return ConvergenceResult::AuthorshipMismatch {
                agent: agent.id().clone(),
                reason: format!(
                    "authority holds {} records, agent sent {}",
                    authored.len(),
                    sent.len()
                ),
            };
        }

        if let Some(i) = authored.iter().zip(sent).position(|(a, s)| *a != s) {
            return ConvergenceResult::AuthorshipMismatch {
                agent: agent.id().clone(),
                reason: format!("record {} differs from sent log", i),
            };
        }
    }

    if let Some((author, records)) = by_author.into_iter().next() {
        return ConvergenceResult::AuthorshipMismatch {
            agent: author.clone(),
            reason: format!("{} records from an unknown agent", records.len()),
        };
    }

    ConvergenceResult::Converged
}
