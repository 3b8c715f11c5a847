//! Token Ledger Errors

use lib_types::{Address, Amount, TokenId};
use thiserror::Error;

/// Error during token operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Contract is paused")]
    Paused,

    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: Amount, need: Amount },

    #[error("Insufficient allowance: have {have}, need {need}")]
    InsufficientAllowance { have: Amount, need: Amount },

    #[error("Token not found: {0:?}")]
    TokenNotFound(TokenId),

    #[error("Token already deployed: {0:?}")]
    AlreadyDeployed(TokenId),

    #[error("Zero amount not allowed")]
    ZeroAmount,

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Arithmetic underflow")]
    Underflow,

    #[error("Unauthorized minter: {0:?}")]
    UnauthorizedMinter(Address),

    #[error("Supply cap exceeded: max {max}, would have {would_have}")]
    SupplyCapExceeded { max: Amount, would_have: Amount },

    #[error("Conservation invariant violated: {0}")]
    ConservationViolated(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for token operations
pub type TokenResult<T> = Result<T, TokenError>;
