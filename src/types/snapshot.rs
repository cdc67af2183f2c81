//! Last-observed state of the vote store

use serde_json::Value;

/// Field the vote-count endpoint reports its row count under
pub const ROW_COUNT_FIELD: &str = "rowCount";

/// The cached poll response, compared by value on every cycle
///
/// Starts empty, so the first successful sample after startup always
/// counts as a change.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VoteCountSnapshot {
    last: Option<Value>,
}

impl VoteCountSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_none()
    }

    /// True if `sample` differs from the cached value in shape or content
    pub fn differs_from(&self, sample: &Value) -> bool {
        self.last.as_ref() != Some(sample)
    }

    /// Compare and, on difference, replace the cached value
    ///
    /// Returns whether the sample was a change.
    pub fn observe(&mut self, sample: Value) -> bool {
        if !self.differs_from(&sample) {
            return false;
        }
        self.last = Some(sample);
        true
    }

    /// Row count of the cached sample, if it has one
    pub fn row_count(&self) -> Option<u64> {
        self.last.as_ref()?.get(ROW_COUNT_FIELD)?.as_u64()
    }
}
