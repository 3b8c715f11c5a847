//! TokenContract
//!
//! The fungible base token that vote-lock deposits are denominated in.
//! Balances and allowances live in a [`crate::TokenStore`]; the contract
//! itself only carries metadata, mint rules and supply counters.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use lib_types::{Address, Amount, TokenId};

// =============================================================================
// MINT POLICY
// =============================================================================

/// Who may mint new supply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MintPolicy {
    /// Anyone may mint (test tokens, faucets)
    Open,
    /// Only the listed addresses may mint
    Restricted { minters: HashSet<Address> },
    /// Supply is fixed at deployment
    Disabled,
}

impl MintPolicy {
    /// Check if an address may mint under this policy
    pub fn allows(&self, minter: &Address) -> bool {
        match self {
            MintPolicy::Open => true,
            MintPolicy::Restricted { minters } => minters.contains(minter),
            MintPolicy::Disabled => false,
        }
    }
}

impl Default for MintPolicy {
    fn default() -> Self {
        MintPolicy::Disabled
    }
}

// =============================================================================
// TOKEN CONTRACT
// =============================================================================

/// Base token contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenContract {
    // =========================================================================
    // Identity
    // =========================================================================
    /// Unique token identifier
    pub id: TokenId,
    /// Human-readable token name
    pub name: String,
    /// Token symbol
    pub symbol: String,
    /// Number of decimal places (display only)
    pub decimals: u8,

    // =========================================================================
    // Supply
    // =========================================================================
    /// Mint rules
    pub mint_policy: MintPolicy,
    /// Hard cap on total supply (None = uncapped)
    pub supply_cap: Option<Amount>,
    /// Total supply in circulation
    pub total_supply: Amount,

    // =========================================================================
    // Safety Flags
    // =========================================================================
    /// Whether transfers and mints are paused
    pub paused: bool,
}

impl TokenContract {
    /// Create a new token contract with no supply
    pub fn new(id: TokenId, name: String, symbol: String, decimals: u8, mint_policy: MintPolicy) -> Self {
        Self {
            id,
            name,
            symbol,
            decimals,
            mint_policy,
            supply_cap: None,
            total_supply: 0,
            paused: false,
        }
    }

    /// Set a supply cap
    pub fn with_supply_cap(mut self, cap: Amount) -> Self {
        self.supply_cap = Some(cap);
        self
    }

    /// Check the supply cap invariant
    pub fn is_valid(&self) -> bool {
        match self.supply_cap {
            Some(cap) => self.total_supply <= cap,
            None => true,
        }
    }

    /// Remaining mintable supply (None = unlimited)
    pub fn mintable_supply(&self) -> Option<Amount> {
        self.supply_cap.map(|cap| cap.saturating_sub(self.total_supply))
    }
}

// =============================================================================
// TRANSFER RESULT
// =============================================================================

/// Result of a successful transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferResult {
    /// Amount credited to the recipient
    pub amount: Amount,
    /// Sender balance after the debit
    pub from_balance: Amount,
    /// Recipient balance after the credit
    pub to_balance: Amount,
}
