//! Withdrawal Settlement
//!
//! Splits a lock's principal between the account and the treasury. Leaving
//! before unlock costs `principal * min(time_left / max_duration, max_penalty)`;
//! leaving at or after unlock costs nothing.

use serde::{Deserialize, Serialize};

use lib_types::{Amount, Timestamp, MAX_BPS};

use crate::config::EscrowConfig;
use crate::errors::{VoteLockError, VoteLockResult};
use crate::lock::LockedBalance;

/// How a withdrawn principal is split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Settlement {
    pub principal: Amount,
    /// Paid to the treasury
    pub penalty: Amount,
    /// Paid back to the account
    pub returned: Amount,
}

impl Settlement {
    /// Full principal back, no penalty
    pub fn on_time(principal: Amount) -> Self {
        Self {
            principal,
            penalty: 0,
            returned: principal,
        }
    }

    /// Settle `lock` at `now` on the early-exit path
    pub fn compute(lock: &LockedBalance, now: Timestamp, config: &EscrowConfig) -> VoteLockResult<Self> {
        let penalty = early_exit_penalty(lock, now, config)?;
        let returned = lock
            .amount
            .checked_sub(penalty)
            .ok_or(VoteLockError::Overflow)?;
        Ok(Self {
            principal: lock.amount,
            penalty,
            returned,
        })
    }
}

/// Penalty owed for leaving `lock` at `now`
pub fn early_exit_penalty(lock: &LockedBalance, now: Timestamp, config: &EscrowConfig) -> VoteLockResult<Amount> {
    if lock.end <= now || lock.amount == 0 || config.max_lock_duration == 0 {
        return Ok(0);
    }

    let max_duration = Amount::from(config.max_lock_duration);
    let time_left = Amount::from(lock.end - now).min(max_duration);

    let proportional = lock
        .amount
        .checked_mul(time_left)
        .ok_or(VoteLockError::Overflow)?
        / max_duration;
    let ceiling = lock
        .amount
        .checked_mul(Amount::from(config.max_penalty_bps))
        .ok_or(VoteLockError::Overflow)?
        / Amount::from(MAX_BPS);

    Ok(proportional.min(ceiling))
}
