//! Reconciliation: applying a catch-up response to a local log.
//!
//! Policy:
//! 1. `from > len(log)`: the response would leave a gap. Reject it.
//! 2. Otherwise keep `log[..from]` and replace everything after it with
//!    the response's records. Truncate and overwrite, never merge.
//!
//! Local records at or beyond `from` are discarded even if the authority
//! hasn't seen them yet. They are presumed forwarded and reappear once the
//! authority has processed them.

use synclog_core::{CatchUpResponse, Record};

/// What happened when an agent was handed a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The agent failed to notice the response.
    Ignored,
    /// Nothing was delivered.
    Absent,
    /// The response starts beyond the local log and was discarded.
    Stale {
        /// The response's `from`.
        from: u64,
        /// Local log length at application time.
        local_len: u64,
    },
    /// The local log was truncated at `kept` and extended.
    Applied {
        /// Entries before `from`, left untouched.
        kept: u64,
        /// Local entries at or after `from` that were dropped.
        replaced: u64,
        /// Entries taken from the response.
        appended: u64,
    },
}

impl ReconcileOutcome {
    /// Whether the local log was rewritten.
    pub fn is_applied(&self) -> bool {
        matches!(self, ReconcileOutcome::Applied { .. })
    }

    /// Whether the response was rejected as stale.
    pub fn is_stale(&self) -> bool {
        matches!(self, ReconcileOutcome::Stale { .. })
    }
}

/// Apply `response` to `log` in place.
pub fn apply_update(log: &mut Vec<Record>, response: &CatchUpResponse) -> ReconcileOutcome {
    let local_len = log.len() as u64;
    if response.from > local_len {
        return ReconcileOutcome::Stale {
            from: response.from,
            local_len,
        };
    }

    // from <= log.len(), so this fits in usize.
    let from = response.from as usize;
    let replaced = log.len() - from;

    log.truncate(from);
    log.extend(response.records.iter().cloned());

    ReconcileOutcome::Applied {
        kept: response.from,
        replaced: replaced as u64,
        appended: response.records.len() as u64,
    }
}
