//! Lock Ledger Entries
//!
//! A [`LockedBalance`] is the principal an account has locked and the
//! week-aligned time it unlocks. [`LockedBalance::modified`] is the single
//! place where lock changes are validated; [`curve`] turns a lock into the
//! voting-power function it earns.

use serde::{Deserialize, Serialize};

use lib_types::{Amount, BlockStamp, Timestamp};

use crate::config::EscrowConfig;
use crate::decay::round_to_week;
use crate::errors::{VoteLockError, VoteLockResult};
use crate::point::Point;

/// Principal and unlock time for one account
///
/// `amount == 0 && end == 0` is the empty lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LockedBalance {
    pub amount: Amount,
    /// Unlock time, always on a week boundary
    pub end: Timestamp,
}

impl LockedBalance {
    pub fn is_empty(&self) -> bool {
        self.amount == 0 && self.end == 0
    }

    /// True once the unlock time has been reached
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.end <= now
    }

    /// The lock after adding `amount` and optionally moving the unlock time
    ///
    /// `unlock` is rounded down to a week boundary; `None` keeps the current
    /// unlock time.
    ///
    /// # Rules
    ///
    /// 1. The resulting principal is positive
    /// 2. The resulting unlock time is strictly after `now`
    /// 3. The unlock time is at most `now + max_lock_horizon`
    /// 4. The unlock time only moves earlier if the lock keeps full power
    ///    (stays at least `max_lock_duration` away)
    pub fn modified(
        &self,
        amount: Amount,
        unlock: Option<Timestamp>,
        now: Timestamp,
        config: &EscrowConfig,
    ) -> VoteLockResult<LockedBalance> {
        // Rule 1: Positive principal
        let new_amount = self.amount.checked_add(amount).ok_or(VoteLockError::Overflow)?;
        if new_amount == 0 {
            return Err(VoteLockError::InvalidLock("nothing to lock".to_string()));
        }

        // Rule 2: Unlock strictly in the future
        let end = unlock.map(round_to_week).unwrap_or(self.end);
        if end <= now {
            return Err(VoteLockError::InvalidLock(format!(
                "unlock time {} is not after now ({})",
                end, now
            )));
        }

        // Rule 3: Bounded horizon
        let max_end = now.saturating_add(config.max_lock_horizon);
        if end > max_end {
            return Err(VoteLockError::InvalidLock(format!(
                "unlock time {} exceeds maximum {}",
                end, max_end
            )));
        }

        // Rule 4: No early unlock unless power is unaffected
        let full_power_from = now.saturating_add(config.max_lock_duration);
        if end < self.end && end < full_power_from {
            return Err(VoteLockError::InvalidLock(format!(
                "unlock time {} is before current unlock {}",
                end, self.end
            )));
        }

        Ok(LockedBalance {
            amount: new_amount,
            end,
        })
    }
}

/// Deferred start of decay for a lock longer than the full-power duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kink {
    /// `end - max_lock_duration`
    pub timestamp: Timestamp,
    /// Slope that switches on at `timestamp`
    pub slope: i128,
}

/// Voting-power function earned by a lock at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockCurve {
    pub point: Point,
    pub kink: Option<Kink>,
}

impl LockCurve {
    /// Slope-change entries this curve schedules: `(timestamp, delta)`
    ///
    /// Decay stops at `end`; an extended lock also starts decaying at its
    /// kink.
    pub fn scheduled(&self, end: Timestamp) -> Vec<(Timestamp, i128)> {
        match self.kink {
            Some(kink) => vec![(kink.timestamp, kink.slope), (end, -kink.slope)],
            None if self.point.slope != 0 => vec![(end, -self.point.slope)],
            None => Vec::new(),
        }
    }
}

/// Voting power of `lock` at `stamp`
///
/// `slope = amount / max_duration` and `bias = slope * min(end - now,
/// max_duration)`. A lock unlocking further out than `max_duration` holds
/// full power with zero slope until its kink.
pub fn curve(lock: &LockedBalance, stamp: BlockStamp, max_duration: u64) -> VoteLockResult<LockCurve> {
    let now = stamp.timestamp;
    if lock.amount == 0 || lock.end <= now || max_duration == 0 {
        return Ok(LockCurve {
            point: Point::zero_at(stamp),
            kink: None,
        });
    }

    let amount = i128::try_from(lock.amount).map_err(|_| VoteLockError::Overflow)?;
    let slope = amount / i128::from(max_duration);
    let remaining = lock.end - now;

    let (point_slope, duration, kink) = if remaining > max_duration {
        let kink = Kink {
            timestamp: lock.end - max_duration,
            slope,
        };
        (0, max_duration, (slope != 0).then_some(kink))
    } else {
        (slope, remaining, None)
    };

    let bias = slope
        .checked_mul(i128::from(duration))
        .ok_or(VoteLockError::Overflow)?;

    Ok(LockCurve {
        point: Point {
            bias,
            slope: point_slope,
            timestamp: now,
            block: stamp.height,
        },
        kink,
    })
}
