//! Slope-Change Schedule
//!
//! Signed slope deltas keyed by week-aligned timestamp. Replay adds the delta
//! to the running slope when it crosses the timestamp.
//!
//! Updates are two-phase: [`SlopeSchedule::stage`] validates and computes the
//! resulting values without touching the schedule, [`SlopeSchedule::commit`]
//! writes them. A failed operation therefore never leaves a half-applied
//! schedule behind.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use lib_types::Timestamp;

use crate::errors::{VoteLockError, VoteLockResult};
use crate::WEEK;

/// Resulting values for a set of timestamps, ready to commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedSlopes {
    values: BTreeMap<Timestamp, i128>,
}

impl StagedSlopes {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Week-aligned slope deltas for one owner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlopeSchedule {
    changes: BTreeMap<Timestamp, i128>,
}

impl SlopeSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheduled delta at `ts` (0 if none)
    pub fn get(&self, ts: Timestamp) -> i128 {
        self.changes.get(&ts).copied().unwrap_or(0)
    }

    /// Compute the values that adding `deltas` would produce
    ///
    /// Deltas at the same timestamp are merged. Every timestamp must be
    /// week-aligned.
    pub fn stage(&self, deltas: &[(Timestamp, i128)]) -> VoteLockResult<StagedSlopes> {
        let mut values: BTreeMap<Timestamp, i128> = BTreeMap::new();
        for &(ts, delta) in deltas {
            if ts % WEEK != 0 {
                return Err(VoteLockError::DataConsistency(format!(
                    "slope change at {} is not week-aligned",
                    ts
                )));
            }
            let current = match values.get(&ts) {
                Some(v) => *v,
                None => self.get(ts),
            };
            let updated = current.checked_add(delta).ok_or(VoteLockError::Overflow)?;
            values.insert(ts, updated);
        }
        Ok(StagedSlopes { values })
    }

    /// Write staged values; zeroed entries are dropped
    pub fn commit(&mut self, staged: StagedSlopes) {
        for (ts, value) in staged.values {
            if value == 0 {
                self.changes.remove(&ts);
            } else {
                self.changes.insert(ts, value);
            }
        }
    }

    /// Number of non-zero entries
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Sum of every scheduled delta
    pub fn net(&self) -> i128 {
        self.changes.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Timestamp, &i128)> {
        self.changes.iter()
    }
}
