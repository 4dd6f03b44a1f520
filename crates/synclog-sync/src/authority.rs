//! Sync authority: the single keeper of the ordered log.
//!
//! The log sits behind one `RwLock`. Appends take the write lock; probe
//! replies copy the suffix under a single read lock, so a reply never misses
//! a record appended before the probe was handled.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use synclog_core::{CatchUpResponse, Digest, Message, ProtocolError, Record, Result};

use crate::convergence::log_state_hash;

/// The authoritative, append-only log.
#[derive(Debug, Default)]
pub struct SyncAuthority {
    log: RwLock<Vec<Record>>,
}

impl SyncAuthority {
    /// Create an authority with an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle one incoming message.
    ///
    /// - nothing arrived: `Ok(None)`
    /// - `RECORD`: appended, `Ok(None)`
    /// - `PROBE`: `Ok(Some(update))` with the log from `from` onward
    /// - anything else: [`ProtocolError::UnexpectedKind`]
    pub fn handle(&self, message: Option<Message>) -> Result<Option<CatchUpResponse>> {
        match message {
            None => Ok(None),
            Some(Message::Record(record)) => {
                let len = self.append(record);
                tracing::debug!(len, "appended record");
                Ok(None)
            }
            Some(Message::Probe(probe)) => {
                let response = self.catch_up(probe.from);
                tracing::trace!(
                    agent = %probe.author_id,
                    from = probe.from,
                    records = response.records.len(),
                    "answered probe"
                );
                Ok(Some(response))
            }
            Some(other) => Err(ProtocolError::UnexpectedKind {
                kind: other.kind(),
                receiver: "authority",
            }),
        }
    }

    /// Handle a CBOR-encoded message and encode the reply.
    pub fn handle_bytes(&self, bytes: &[u8]) -> Result<Option<Vec<u8>>> {
        let message = Message::from_bytes(bytes)?;
        self.handle(Some(message))?
            .map(|response| Message::Update(response).to_bytes())
            .transpose()
    }

    /// The log from `from` onward. Empty when `from` is past the end.
    pub fn catch_up(&self, from: u64) -> CatchUpResponse {
        let log = self.read();
        let start = usize::try_from(from).unwrap_or(usize::MAX).min(log.len());
        CatchUpResponse::new(from, log[start..].to_vec())
    }

    /// A copy of the whole log.
    pub fn snapshot(&self) -> Vec<Record> {
        self.read().clone()
    }

    /// Number of records in the log.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Rolling digest of the log, `None` while empty.
    pub fn state_hash(&self) -> Option<Digest> {
        log_state_hash(&self.read())
    }

    /// Append a record, returning the new length.
    fn append(&self, record: Record) -> usize {
        let mut log = self.write();
        log.push(record);
        log.len()
    }

    // A panicked writer can only have been mid-push; the vector is still valid.
    fn read(&self) -> RwLockReadGuard<'_, Vec<Record>> {
        self.log.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Record>> {
        self.log.write().unwrap_or_else(PoisonError::into_inner)
    }
}
