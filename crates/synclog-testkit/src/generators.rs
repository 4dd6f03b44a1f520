//! Proptest generators for property-based testing.

use proptest::prelude::*;

use synclog_core::{AgentId, CatchUpResponse, Payload, Probe, Record};
use synclog_sync::DropProbabilities;

/// Generate an indexed agent id.
pub fn agent_id() -> impl Strategy<Value = AgentId> {
    (0usize..16).prop_map(AgentId::indexed)
}

/// Generate a timestamp (Unix microseconds).
pub fn timestamp() -> impl Strategy<Value = i64> {
    0i64..=1_800_000_000_000_000i64
}

/// Generate a payload with the default field set.
pub fn payload() -> impl Strategy<Value = Payload> {
    ("[0-9a-f]{8}", "[0-9a-f]{8}", "[0-9a-f]{8}").prop_map(|(a, b, c)| {
        [("a", a), ("b", b), ("c", c)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    })
}

/// Generate a record.
pub fn record() -> impl Strategy<Value = Record> {
    (agent_id(), timestamp(), payload())
        .prop_map(|(author, created_at, payload)| Record::new(author, created_at, payload))
}

/// Generate up to `max_len` records.
pub fn records(max_len: usize) -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(record(), 0..=max_len)
}

/// Generate a probe.
pub fn probe(max_from: u64) -> impl Strategy<Value = Probe> {
    (agent_id(), 0..=max_from).prop_map(|(author, from)| Probe::new(author, from))
}

/// Generate a catch-up response.
pub fn catch_up_response(max_from: u64, max_len: usize) -> impl Strategy<Value = CatchUpResponse> {
    (0..=max_from, records(max_len)).prop_map(|(from, records)| CatchUpResponse::new(from, records))
}

/// Generate drop probabilities low enough for runs to settle quickly.
pub fn drop_probabilities() -> impl Strategy<Value = DropProbabilities> {
    (0.0f64..0.8, 0.0f64..0.8, 0.0f64..0.8).prop_map(|(record, probe, response)| {
        DropProbabilities {
            record,
            probe,
            response,
        }
    })
}
