//! Protocol message types and their wire codec.
//!
//! Three kinds of message exist:
//!
//! ```text
//! Agent                              Authority
//!   |-------- RECORD {record} -------->|   append, no reply
//!   |-------- PROBE {from} ----------->|
//!   |<------- UPDATE {from, records} --|   log[from..] at reply time
//! ```
//!
//! On the wire each message is a CBOR map carrying a `kind` field
//! (`RECORD`, `PROBE` or `UPDATE`) next to the message's own fields.

use ciborium::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ProtocolError, Result};
use crate::record::Record;
use crate::types::AgentId;

/// Discriminator carried in the `kind` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageKind {
    /// Record submission from an agent.
    Record,
    /// Catch-up request from an agent.
    Probe,
    /// Catch-up response from the authority.
    Update,
}

impl MessageKind {
    /// The wire name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Record => "RECORD",
            MessageKind::Probe => "PROBE",
            MessageKind::Update => "UPDATE",
        }
    }

    /// Parse a wire name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "RECORD" => Some(Self::Record),
            "PROBE" => Some(Self::Probe),
            "UPDATE" => Some(Self::Update),
            _ => None,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pull request: "send me everything from this index onward".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Probe {
    /// The probing agent.
    pub author_id: AgentId,
    /// First log index the agent wants. Absent on the wire means 0.
    #[serde(default)]
    pub from: u64,
}

impl Probe {
    /// Create a probe.
    pub fn new(author_id: AgentId, from: u64) -> Self {
        Self { author_id, from }
    }
}

/// The authority's answer to a [`Probe`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatchUpResponse {
    /// Echo of the probe's `from`.
    #[serde(default)]
    pub from: u64,
    /// The authority log from `from` onward, at reply time. Each element
    /// carries its own `kind: "RECORD"` on the wire.
    #[serde(default, with = "tagged_records")]
    pub records: Vec<Record>,
}

impl CatchUpResponse {
    /// Create a response.
    pub fn new(from: u64, records: Vec<Record>) -> Self {
        Self { from, records }
    }

    /// Log length an agent ends up with after applying this response.
    pub fn end(&self) -> u64 {
        self.from + self.records.len() as u64
    }
}

/// Protocol envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "UPPERCASE")]
pub enum Message {
    /// Record submission (fire and forget).
    Record(Record),
    /// Catch-up request.
    Probe(Probe),
    /// Catch-up response.
    Update(CatchUpResponse),
}

impl Message {
    /// The kind of this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Record(_) => MessageKind::Record,
            Message::Probe(_) => MessageKind::Probe,
            Message::Update(_) => MessageKind::Update,
        }
    }

    /// Encode to CBOR bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| ProtocolError::EncodingError(e.to_string()))?;
        Ok(buf)
    }

    /// Decode from CBOR bytes.
    ///
    /// The `kind` field is checked before the body so that an unknown kind
    /// is reported as such rather than as a generic decoding failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let value: Value = ciborium::from_reader(bytes)
            .map_err(|e| ProtocolError::DecodingError(e.to_string()))?;

        kind_of(&value)?;

        value
            .deserialized()
            .map_err(|e| ProtocolError::DecodingError(e.to_string()))
    }
}

impl From<Record> for Message {
    fn from(record: Record) -> Self {
        Message::Record(record)
    }
}

impl From<Probe> for Message {
    fn from(probe: Probe) -> Self {
        Message::Probe(probe)
    }
}

impl From<CatchUpResponse> for Message {
    fn from(response: CatchUpResponse) -> Self {
        Message::Update(response)
    }
}

/// Wire form of [`CatchUpResponse::records`]: every element is tagged like a
/// standalone `RECORD` message, and the tag is required on decode.
mod tagged_records {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::record::Record;

    #[derive(Serialize)]
    #[serde(tag = "kind", rename_all = "UPPERCASE")]
    enum TaggedRef<'a> {
        Record(&'a Record),
    }

    #[derive(Deserialize)]
    #[serde(tag = "kind", rename_all = "UPPERCASE")]
    enum Tagged {
        Record(Record),
    }

    pub fn serialize<S: Serializer>(
        records: &[Record],
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(records.iter().map(TaggedRef::Record))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Vec<Record>, D::Error> {
        let tagged = Vec::<Tagged>::deserialize(deserializer)?;
        Ok(tagged
            .into_iter()
            .map(|Tagged::Record(record)| record)
            .collect())
    }
}

/// Read the `kind` field of an undecoded message.
fn kind_of(value: &Value) -> Result<MessageKind> {
    let entries = value
        .as_map()
        .ok_or_else(|| ProtocolError::DecodingError("message is not a map".into()))?;

    let kind = entries
        .iter()
        .find(|(key, _)| key.as_text() == Some("kind"))
        .map(|(_, kind)| kind)
        .ok_or(ProtocolError::MissingKind)?;

    match kind.as_text() {
        Some(name) => {
            MessageKind::parse(name).ok_or_else(|| ProtocolError::UnrecognizedKind(name.into()))
        }
        None => Err(ProtocolError::UnrecognizedKind(format!("{:?}", kind))),
    }
}
