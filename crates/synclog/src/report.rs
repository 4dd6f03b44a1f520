//! Run statistics.

use std::fmt;

use synclog_core::Digest;
use synclog_sync::{ReconcileOutcome, RoundOutcome};

/// Counters accumulated over rounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Agent turns whose opening probe got through.
    pub participated: u64,
    /// Records generated and submitted.
    pub generated: u64,
    /// Responses applied.
    pub applied: u64,
    /// Responses rejected as stale.
    pub stale: u64,
    /// Responses the agent failed to notice.
    pub ignored: u64,
    /// Local records replaced by truncation.
    pub replaced: u64,
}

impl RunStats {
    /// Count one generation-round outcome.
    pub fn record_round(&mut self, outcome: &RoundOutcome) {
        if outcome.participated {
            self.participated += 1;
        }
        if outcome.generated.is_some() {
            self.generated += 1;
        }
        if let Some(reconcile) = outcome.reconcile {
            self.record_reconcile(reconcile);
        }
    }

    /// Count one reconciliation.
    pub fn record_reconcile(&mut self, outcome: ReconcileOutcome) {
        match outcome {
            ReconcileOutcome::Applied { replaced, .. } => {
                self.applied += 1;
                self.replaced += replaced;
            }
            ReconcileOutcome::Stale { .. } => self.stale += 1,
            ReconcileOutcome::Ignored => self.ignored += 1,
            ReconcileOutcome::Absent => {}
        }
    }

    /// Add another set of counters.
    pub fn merge(&mut self, other: &RunStats) {
        self.participated += other.participated;
        self.generated += other.generated;
        self.applied += other.applied;
        self.stale += other.stale;
        self.ignored += other.ignored;
        self.replaced += other.replaced;
    }
}

/// Result of a completed, verified simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationReport {
    /// Number of agents.
    pub agents: usize,
    /// Generation rounds run.
    pub rounds: u64,
    /// Settle rounds needed to converge.
    pub settle_rounds: u64,
    /// Final authority log length.
    pub log_len: usize,
    /// State hash shared by every log.
    pub state_hash: Option<Digest>,
    /// Counters.
    pub stats: RunStats,
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "agents:          {}", self.agents)?;
        writeln!(f, "rounds:          {}", self.rounds)?;
        writeln!(f, "settle rounds:   {}", self.settle_rounds)?;
        writeln!(f, "records:         {}", self.log_len)?;
        match &self.state_hash {
            Some(hash) => writeln!(f, "state hash:      {}", hash)?,
            None => writeln!(f, "state hash:      (empty log)")?,
        }
        writeln!(f, "turns taken:     {}", self.stats.participated)?;
        writeln!(
            f,
            "updates:         {} applied, {} stale, {} ignored",
            self.stats.applied, self.stats.stale, self.stats.ignored
        )?;
        write!(f, "replaced local:  {}", self.stats.replaced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_count_outcomes() {
        let mut stats = RunStats::default();
        stats.record_reconcile(ReconcileOutcome::Applied {
            kept: 0,
            replaced: 2,
            appended: 3,
        });
        stats.record_reconcile(ReconcileOutcome::Stale { from: 4, local_len: 1 });
        stats.record_reconcile(ReconcileOutcome::Ignored);
        stats.record_reconcile(ReconcileOutcome::Absent);

        assert_eq!(stats.applied, 1);
        assert_eq!(stats.replaced, 2);
        assert_eq!(stats.stale, 1);
        assert_eq!(stats.ignored, 1);
    }

    #[test]
    fn test_stats_merge() {
        let mut a = RunStats {
            generated: 2,
            ..Default::default()
        };
        let b = RunStats {
            generated: 3,
            applied: 1,
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.generated, 5);
        assert_eq!(a.applied, 1);
    }

    #[test]
    fn test_report_display() {
        let report = SimulationReport {
            agents: 2,
            rounds: 5,
            settle_rounds: 1,
            log_len: 0,
            state_hash: None,
            stats: RunStats::default(),
        };
        let text = report.to_string();
        assert!(text.contains("agents:          2"));
        assert!(text.contains("(empty log)"));
    }
}
