//! Poll cycle statistics exposed on `/api/status`

use parking_lot::RwLock;
use serde::Serialize;

/// Result of a single poll cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollOutcome {
    /// The sample differed from the cached snapshot
    Changed,
    /// The sample equalled the cached snapshot
    Unchanged,
    /// The fetch failed; the snapshot was left as it was
    Skipped,
}

/// Point-in-time view of the poller
#[derive(Clone, Debug, Default, Serialize)]
pub struct PollStatus {
    pub last_outcome: Option<PollOutcome>,
    /// Unix timestamp of the last completed cycle
    pub last_polled_at: Option<i64>,
    /// Unix timestamp of the last detected change
    pub last_changed_at: Option<i64>,
    pub row_count: Option<u64>,
    pub cycles: u64,
    pub changes: u64,
    pub consecutive_failures: u32,
}

/// Shared, lock-protected poll statistics
#[derive(Default)]
pub struct PollerStats {
    status: RwLock<PollStatus>,
}

impl PollerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: PollOutcome, row_count: Option<u64>) {
        let now = chrono::Utc::now().timestamp();
        let mut status = self.status.write();

        status.last_outcome = Some(outcome);
        status.last_polled_at = Some(now);
        status.cycles += 1;

        match outcome {
            PollOutcome::Changed => {
                status.last_changed_at = Some(now);
                status.changes += 1;
                status.consecutive_failures = 0;
                status.row_count = row_count;
            }
            PollOutcome::Unchanged => {
                status.consecutive_failures = 0;
                status.row_count = row_count;
            }
            PollOutcome::Skipped => {
                status.consecutive_failures = status.consecutive_failures.saturating_add(1);
            }
        }
    }

    pub fn status(&self) -> PollStatus {
        self.status.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tracks_failures_and_changes() {
        let stats = PollerStats::new();

        stats.record(PollOutcome::Skipped, None);
        stats.record(PollOutcome::Skipped, None);
        assert_eq!(stats.status().consecutive_failures, 2);
        assert!(stats.status().last_changed_at.is_none());

        stats.record(PollOutcome::Changed, Some(11));
        let status = stats.status();
        assert_eq!(status.consecutive_failures, 0);
        assert_eq!(status.changes, 1);
        assert_eq!(status.cycles, 3);
        assert_eq!(status.row_count, Some(11));
        assert_eq!(status.last_outcome, Some(PollOutcome::Changed));
    }

    #[test]
    fn test_outcome_serializes_snake_case() {
        let json = serde_json::to_string(&PollOutcome::Unchanged).unwrap();
        assert_eq!(json, "\"unchanged\"");
    }
}
