//! Record: the unit of data an agent originates.
//!
//! A record is immutable. It has no sequence number of its own; its position
//! in any log is purely index-based. Two records are the same record when
//! author, creation time, and payload all match.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::digest::Digest;
use crate::types::AgentId;

/// Field names used by the default record generator.
pub const DEFAULT_PAYLOAD_FIELDS: [&str; 3] = ["a", "b", "c"];

/// Domain prefix for record digests.
const RECORD_DOMAIN: &[u8] = b"synclog-record-v0:";

/// Opaque record data. Ordered so encodings are deterministic.
pub type Payload = BTreeMap<String, String>;

/// An immutable record.
///
/// Fields are private; once built, a record can only be read or cloned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Creation time in microseconds since the Unix epoch. Author-claimed.
    created_at: i64,
    /// The agent that originated this record.
    author_id: AgentId,
    /// Opaque payload.
    payload: Payload,
}

impl Record {
    /// Create a record.
    pub fn new(author_id: AgentId, created_at: i64, payload: Payload) -> Self {
        Self {
            created_at,
            author_id,
            payload,
        }
    }

    /// The originating agent.
    pub fn author_id(&self) -> &AgentId {
        &self.author_id
    }

    /// Creation time (Unix microseconds).
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// The payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Look up a single payload field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.payload.get(name).map(String::as_str)
    }

    /// Deterministic byte encoding of the identity tuple.
    ///
    /// Format: domain || len(author) || author || created_at (BE) ||
    /// count || (len(key) || key || len(value) || value)*
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64 + self.payload.len() * 48);
        buf.extend_from_slice(RECORD_DOMAIN);
        put_str(&mut buf, self.author_id.as_str());
        buf.extend_from_slice(&self.created_at.to_be_bytes());
        buf.extend_from_slice(&(self.payload.len() as u64).to_be_bytes());
        for (key, value) in &self.payload {
            put_str(&mut buf, key);
            put_str(&mut buf, value);
        }
        buf
    }

    /// Blake3 digest of [`Record::canonical_bytes`].
    pub fn digest(&self) -> Digest {
        Digest::hash(&self.canonical_bytes())
    }
}

fn put_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u64).to_be_bytes());
    buf.extend_from_slice(s.as_bytes());
}
