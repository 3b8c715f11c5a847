//! Fungible token ledger
//!
//! This crate provides the base-token ledger the vote-lock engine deposits
//! into and pays out of.
//!
//! # Key Types
//!
//! - [`TokenContract`]: token metadata, mint rules and supply counters
//! - [`MintPolicy`]: controls minting behavior
//! - [`TokenStore`]: storage for balances and allowances
//! - [`InMemoryTokenStore`]: shared in-memory store
//!
//! # Execution
//!
//! Use [`apply_token_transfer`], [`apply_token_transfer_from`],
//! [`apply_token_approve`] and [`apply_token_mint`] to mutate the ledger with
//! full validation.

pub mod contract;
pub mod errors;
pub mod memory;
pub mod transfer;

pub use contract::*;
pub use errors::*;
pub use memory::InMemoryTokenStore;
pub use transfer::{
    apply_token_approve, apply_token_mint, apply_token_payouts, apply_token_transfer, apply_token_transfer_from,
    load_contract, TokenStore,
};
