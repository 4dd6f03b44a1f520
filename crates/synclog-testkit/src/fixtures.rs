//! Test fixtures and helpers.
//!
//! Deterministic stand-ins for the random parts of the system: scripted
//! channels, a frozen clock, and a generator with predictable values.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use synclog_core::{AgentId, Clock, Payload, Record, RecordGenerator, DEFAULT_PAYLOAD_FIELDS};
use synclog_sync::{Agent, AgentChannels, Channel, LossyChannel, SyncAuthority};

/// A channel that replays a fixed sequence of decisions.
///
/// Once the script runs out every call returns `fallback`.
pub struct ScriptedChannel {
    script: Mutex<VecDeque<bool>>,
    fallback: bool,
}

impl ScriptedChannel {
    /// Create a channel from a script.
    pub fn new(script: impl IntoIterator<Item = bool>, fallback: bool) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
        }
    }

    /// A channel that always returns `decision`.
    pub fn always(decision: bool) -> Self {
        Self::new(Vec::<bool>::new(), decision)
    }

    /// Decisions not consumed yet.
    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

impl Channel for ScriptedChannel {
    fn should_deliver(&self) -> bool {
        self.script.lock().unwrap().pop_front().unwrap_or(self.fallback)
    }
}

/// A clock that returns the same instant until told otherwise.
#[derive(Debug, Default)]
pub struct FixedClock(AtomicI64);

impl FixedClock {
    /// Create a clock frozen at `micros`.
    pub fn new(micros: i64) -> Self {
        Self(AtomicI64::new(micros))
    }

    /// Move the clock.
    pub fn set(&self, micros: i64) {
        self.0.store(micros, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_micros(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Generator with predictable payloads: `<author>-<n>-<field>`.
///
/// The counter is shared across authors, so values stay globally unique.
pub struct SequentialGenerator {
    counter: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl SequentialGenerator {
    /// Create a generator stamped by `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            counter: AtomicU64::new(0),
            clock,
        }
    }

    /// Create a generator whose timestamps are all zero.
    pub fn frozen() -> Self {
        Self::new(Arc::new(FixedClock::new(0)))
    }

    /// Records produced so far.
    pub fn produced(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}

impl RecordGenerator for SequentialGenerator {
    fn next(&self, author: &AgentId) -> Record {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let payload: Payload = DEFAULT_PAYLOAD_FIELDS
            .iter()
            .map(|field| (field.to_string(), format!("{}-{}-{}", author, n, field)))
            .collect();
        Record::new(author.clone(), self.clock.now_micros(), payload)
    }
}

/// Build an agent whose channels never drop.
pub fn reliable_agent(n: usize, generator: Arc<dyn RecordGenerator>) -> Agent {
    Agent::new(AgentId::indexed(n), generator, AgentChannels::reliable())
}

/// Build an agent with one scripted channel per loss point.
pub fn scripted_agent(
    n: usize,
    generator: Arc<dyn RecordGenerator>,
    generate: ScriptedChannel,
    probe: ScriptedChannel,
    receive: ScriptedChannel,
) -> Agent {
    Agent::new(
        AgentId::indexed(n),
        generator,
        AgentChannels::new(Arc::new(generate), Arc::new(probe), Arc::new(receive)),
    )
}

/// Build an agent that is reliable except for a dead receive channel.
pub fn deaf_agent(n: usize, generator: Arc<dyn RecordGenerator>) -> Agent {
    let reliable: Arc<dyn Channel> = Arc::new(LossyChannel::reliable());
    Agent::new(
        AgentId::indexed(n),
        generator,
        AgentChannels::new(reliable.clone(), reliable, Arc::new(LossyChannel::dead())),
    )
}

/// An authority plus `count` reliable agents sharing one sequential generator.
pub struct TestNetwork {
    pub authority: SyncAuthority,
    pub agents: Vec<Agent>,
    pub generator: Arc<SequentialGenerator>,
}

impl TestNetwork {
    /// Create a network of reliable agents.
    pub fn new(count: usize) -> Self {
        let generator = Arc::new(SequentialGenerator::frozen());
        let agents = (0..count)
            .map(|n| reliable_agent(n, generator.clone()))
            .collect();

        Self {
            authority: SyncAuthority::new(),
            agents,
            generator,
        }
    }
}
