//! # Synclog Testkit
//!
//! Testing utilities for synclog.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: scripted channels, a frozen clock, a predictable record
//!   generator, and ready-made agents and networks
//! - **Generators**: Proptest strategies for records, probes, responses and
//!   drop probabilities
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use synclog_testkit::generators::{catch_up_response, records};
//!
//! proptest! {
//!     #[test]
//!     fn update_is_idempotent(log in records(10), response in catch_up_response(10, 5)) {
//!         // ...
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use synclog_testkit::fixtures::TestNetwork;
//! use synclog_sync::sync_round;
//!
//! let mut network = TestNetwork::new(2);
//! for agent in &mut network.agents {
//!     sync_round(agent, &network.authority).unwrap();
//! }
//! assert_eq!(network.authority.len(), 2);
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{
    deaf_agent, reliable_agent, scripted_agent, FixedClock, ScriptedChannel, SequentialGenerator,
    TestNetwork,
};
