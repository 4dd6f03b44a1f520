//! # Synclog Core
//!
//! Pure primitives for synclog: records, protocol messages, and the wire codec.
//!
//! This crate contains no I/O, no networking, and no shared state. Everything
//! here is plain data plus the functions that encode, decode, and digest it.
//!
//! ## Key Types
//!
//! - [`Record`] - An immutable entry originated by one agent
//! - [`AgentId`] - Identifier of an agent (device)
//! - [`Message`] - The protocol envelope: `RECORD`, `PROBE` or `UPDATE`
//! - [`Probe`] / [`CatchUpResponse`] - The pull request and its answer
//! - [`RecordGenerator`] - Source of fresh records for an agent
//!
//! ## Wire Format
//!
//! Messages travel as CBOR maps tagged by a `kind` field. See [`messages`].

pub mod digest;
pub mod error;
pub mod generator;
pub mod messages;
pub mod record;
pub mod types;

pub use digest::Digest;
pub use error::{ProtocolError, Result};
pub use generator::{Clock, RandomRecordGenerator, RecordGenerator, SystemClock};
pub use messages::{CatchUpResponse, Message, MessageKind, Probe};
pub use record::{Payload, Record, DEFAULT_PAYLOAD_FIELDS};
pub use types::AgentId;
