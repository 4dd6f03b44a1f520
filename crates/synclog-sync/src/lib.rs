//! # Synclog Sync
//!
//! Agents, the sync authority, and the protocol that converges their logs
//! over a channel that silently drops messages.
//!
//! ## Overview
//!
//! Each [`Agent`] keeps a local copy of the log and originates records. The
//! [`SyncAuthority`] keeps the one authoritative, append-only log. Agents
//! push records and pull the log suffix they are missing; every step can be
//! lost, and the next round supersedes anything that was.
//!
//! ## Key Properties
//!
//! - **Append-only authority**: the authority log never shrinks or reorders
//! - **Truncate and overwrite**: an accepted update replaces the local
//!   suffix from its `from` index, so agents adopt the authority's order
//! - **Stale rejection**: an update starting beyond the local log is dropped
//! - **Idempotent**: applying the same update twice equals applying it once
//!
//! ## Message Flow
//!
//! ```text
//! Agent                              Authority
//!   |-------- RECORD ----------------->|
//!   |-------- PROBE {from} ----------->|
//!   |<------- UPDATE {from, records} --|
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use synclog_core::{AgentId, RandomRecordGenerator};
//! use synclog_sync::{round::sync_round, Agent, AgentChannels, SyncAuthority};
//!
//! let authority = SyncAuthority::new();
//! let mut agent = Agent::new(
//!     AgentId::indexed(0),
//!     Arc::new(RandomRecordGenerator::default()),
//!     AgentChannels::reliable(),
//! );
//!
//! sync_round(&mut agent, &authority).unwrap();
//! assert_eq!(agent.local_log(), &authority.snapshot()[..]);
//! ```

pub mod agent;
pub mod authority;
pub mod channel;
pub mod config;
pub mod convergence;
pub mod error;
pub mod reconcile;
pub mod round;
pub mod transport;

pub use agent::Agent;
pub use authority::SyncAuthority;
pub use channel::{AgentChannels, Channel, LossyChannel};
pub use config::DropProbabilities;
pub use convergence::{log_state_hash, verify_authorship, verify_convergence, ConvergenceResult};
pub use error::{Result, SyncError};
pub use reconcile::{apply_update, ReconcileOutcome};
pub use round::{settle_round, sync_round, RoundOutcome};
pub use transport::{memory::AuthorityService, memory::MemoryTransport, LocalTransport, Transport};
