//! # Synclog
//!
//! The unified API for synclog - append-only logs kept in sync between many
//! agents and one authority over a channel that silently drops messages.
//!
//! ## Overview
//!
//! Synclog provides:
//!
//! - **Records**: Immutable entries stamped with author and creation time
//! - **Agents**: Devices that originate records and pull what they miss
//! - **Authority**: The single keeper of the ordered, append-only log
//! - **Simulation**: Drivers that tick agents under loss until every log
//!   matches the authority's
//!
//! ## Key Concepts
//!
//! - **Probe**: "send me everything from index `from` onward"
//! - **Update**: the authority's reply, a suffix of its log
//! - **Truncate and overwrite**: an agent replaces its log from `from` on,
//!   adopting the authority's order
//! - **Settle round**: probe and reconcile only, run until convergence
//!
//! ## Usage
//!
//! ```rust
//! use synclog::{Simulation, SimulationConfig};
//!
//! let config = SimulationConfig {
//!     agents: 3,
//!     rounds: 20,
//!     seed: Some(1),
//!     ..Default::default()
//! };
//!
//! let report = Simulation::new(config).unwrap().run().unwrap();
//! assert_eq!(report.agents, 3);
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `synclog::core` - Records, messages and the wire codec
//! - `synclog::sync` - Agents, authority, channels and verification

pub mod concurrent;
pub mod config;
pub mod error;
pub mod report;
pub mod simulation;

// Re-export component crates
pub use synclog_core as core;
pub use synclog_sync as sync;

// Re-export main types for convenience
pub use concurrent::{run_concurrent, run_concurrent_with};
pub use config::SimulationConfig;
pub use error::{Result, SimError};
pub use report::{RunStats, SimulationReport};
pub use simulation::{build_agents, run, verify_agents, Simulation};

// Re-export commonly used types
pub use synclog_core::{AgentId, CatchUpResponse, Message, Probe, Record};
pub use synclog_sync::{Agent, DropProbabilities, ReconcileOutcome, SyncAuthority};
