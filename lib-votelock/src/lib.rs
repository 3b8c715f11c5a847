//! Vote-Locked Token Accounting
//!
//! Principal locked until a week-aligned unlock time earns voting power that
//! decays linearly to zero at unlock. Power is tracked as (bias, slope)
//! checkpoints per account and globally, with week-bucketed slope changes
//! replayed lazily whenever a query or mutation crosses a week boundary.
//! Leaving before unlock costs a time-proportional penalty paid to a
//! treasury.
//!
//! # Key Principles
//!
//! 1. **Explicit time**: every operation receives the current [`BlockStamp`];
//!    the engine never reads a clock
//! 2. **Append-only history**: checkpoints are never rewritten
//! 3. **All or nothing**: a failed operation leaves no partial state
//! 4. **Integer math**: division truncates, overflow is an error
//!
//! # Usage
//!
//! ```ignore
//! use lib_votelock::{EscrowConfig, VoteEscrow, WEEK};
//!
//! let mut escrow = VoteEscrow::new(EscrowConfig::default(), token, vault, treasury, genesis)?;
//! escrow.modify_lock(&store, alice, 1_000, Some(now.timestamp + 26 * WEEK), now)?;
//! let power = escrow.balance_of(&alice, now.timestamp)?;
//! ```
//!
//! [`BlockStamp`]: lib_types::BlockStamp

pub mod config;
pub mod decay;
pub mod errors;
pub mod escrow;
pub mod lock;
pub mod penalty;
pub mod point;
pub mod schedule;
pub mod shared;

use lib_types::Bps;

pub use config::EscrowConfig;
pub use decay::{replay, round_to_week};
pub use errors::{VoteLockError, VoteLockResult};
pub use escrow::{VoteEscrow, WithdrawalReceipt};
pub use lock::{Kink, LockCurve, LockedBalance};
pub use penalty::Settlement;
pub use point::{Point, PointHistory};
pub use schedule::SlopeSchedule;
pub use shared::SharedVoteEscrow;

pub const DAY: u64 = 86_400;
pub const WEEK: u64 = 7 * DAY;

/// One year, rounded down to whole weeks (52 weeks)
pub const DEFAULT_MAX_LOCK_DURATION: u64 = 365 * DAY / WEEK * WEEK;

/// 75% ceiling on the early-exit penalty
pub const DEFAULT_MAX_PENALTY_BPS: Bps = 7_500;
