//! Vote-Lock Errors

use thiserror::Error;
use lib_tokens::TokenError;
use lib_types::{Address, BlockStamp, Timestamp};

/// Error during vote-lock operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VoteLockError {
    #[error("Invalid lock: {0}")]
    InvalidLock(String),

    #[error("No active lock for {0:?}")]
    NoActiveLock(Address),

    #[error("Lock not withdrawable until {end}, now={now}")]
    NotWithdrawable { end: Timestamp, now: Timestamp },

    #[error("Query out of range: {0}")]
    OutOfRange(String),

    #[error("Checkpoint data inconsistent: {0}")]
    DataConsistency(String),

    #[error("Clock went backwards: last={last}, now={now}")]
    ClockRegression { last: BlockStamp, now: BlockStamp },

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Token ledger error: {0}")]
    Token(#[from] TokenError),
}

/// Result type for vote-lock operations
pub type VoteLockResult<T> = Result<T, VoteLockError>;
