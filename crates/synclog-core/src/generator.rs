//! Record generation: clocks and payload generators.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

use crate::record::{Payload, Record, DEFAULT_PAYLOAD_FIELDS};
use crate::types::AgentId;

/// Source of creation timestamps.
pub trait Clock: Send + Sync {
    /// Current time in microseconds since the Unix epoch.
    fn now_micros(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_micros(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as i64)
            .unwrap_or_default()
    }
}

/// Produces fresh records on behalf of an agent.
///
/// Implementations must use the same payload field set for every record
/// and must never repeat a payload value.
pub trait RecordGenerator: Send + Sync {
    /// Produce a new record authored by `author`.
    fn next(&self, author: &AgentId) -> Record;
}

/// Generator filling each field with a random 128-bit hex string.
pub struct RandomRecordGenerator {
    fields: Vec<String>,
    clock: Arc<dyn Clock>,
}

impl RandomRecordGenerator {
    /// Create a generator for the given field names, stamped by the system clock.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl Default for RandomRecordGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_PAYLOAD_FIELDS)
    }
}

impl RecordGenerator for RandomRecordGenerator {
    fn next(&self, author: &AgentId) -> Record {
        let mut rng = rand::thread_rng();
        let payload: Payload = self
            .fields
            .iter()
            .map(|field| (field.clone(), hex::encode(rng.gen::<[u8; 16]>())))
            .collect();

        Record::new(author.clone(), self.clock.now_micros(), payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generator_uses_fixed_field_set() {
        let generator = RandomRecordGenerator::default();
        let author = AgentId::indexed(0);

        for _ in 0..20 {
            let record = generator.next(&author);
            let keys: Vec<&str> = record.payload().keys().map(String::as_str).collect();
            assert_eq!(keys, vec!["a", "b", "c"]);
            assert_eq!(record.author_id(), &author);
        }
    }

    #[test]
    fn test_generator_values_unique() {
        let generator = RandomRecordGenerator::new(["x", "y"]);
        let mut seen = HashSet::new();

        for i in 0..500 {
            let record = generator.next(&AgentId::indexed(i % 4));
            for value in record.payload().values() {
                assert!(!value.is_empty());
                assert!(seen.insert(value.clone()), "duplicate value {}", value);
            }
        }
    }

    #[test]
    fn test_generator_uses_injected_clock() {
        struct Frozen;
        impl Clock for Frozen {
            fn now_micros(&self) -> i64 {
                1_700_000_000_000_000
            }
        }

        let generator = RandomRecordGenerator::default().with_clock(Arc::new(Frozen));
        let record = generator.next(&AgentId::indexed(1));
        assert_eq!(record.created_at(), 1_700_000_000_000_000);
    }

    #[test]
    fn test_system_clock_is_positive() {
        assert!(SystemClock.now_micros() > 0);
    }
}
