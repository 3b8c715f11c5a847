//! Token Transfer Execution
//!
//! The `apply_*` functions are the canonical way to move, approve and mint
//! base tokens with full validation.

use lib_types::{Address, Amount, TokenId};
use std::collections::BTreeMap;

use crate::contract::{TokenContract, TransferResult};
use crate::errors::{TokenError, TokenResult};

/// Trait for token storage operations
///
/// This trait defines the minimal storage interface needed for token
/// operations. Implementations use interior mutability so a single store can
/// be shared between the ledger and its callers.
pub trait TokenStore {
    /// Get token contract by ID
    fn get_token_contract(&self, id: &TokenId) -> TokenResult<Option<TokenContract>>;

    /// Update token contract
    fn put_token_contract(&self, contract: &TokenContract) -> TokenResult<()>;

    /// Get token balance for an address
    fn get_token_balance(&self, token: &TokenId, address: &Address) -> TokenResult<Amount>;

    /// Set token balance for an address
    fn set_token_balance(&self, token: &TokenId, address: &Address, amount: Amount) -> TokenResult<()>;

    /// Get the amount `spender` may move out of `owner`'s balance
    fn get_allowance(&self, token: &TokenId, owner: &Address, spender: &Address) -> TokenResult<Amount>;

    /// Set the amount `spender` may move out of `owner`'s balance
    fn set_allowance(&self, token: &TokenId, owner: &Address, spender: &Address, amount: Amount) -> TokenResult<()>;
}

/// Load a deployed contract or fail with `TokenNotFound`
pub fn load_contract(store: &dyn TokenStore, id: &TokenId) -> TokenResult<TokenContract> {
    store
        .get_token_contract(id)?
        .ok_or(TokenError::TokenNotFound(*id))
}

/// Apply a token transfer with full validation
///
/// # Enforcement
///
/// This function enforces:
/// - **Pause**: Transfer fails if contract is paused
/// - **Amount**: Zero transfers are rejected
/// - **Balance**: Sender must hold at least `amount`
/// - **Conservation**: sender debit == recipient credit
pub fn apply_token_transfer(
    store: &dyn TokenStore,
    contract: &TokenContract,
    from: Address,
    to: Address,
    amount: Amount,
) -> TokenResult<TransferResult> {
    // =========================================================================
    // Check 1: Pause
    // =========================================================================
    if contract.paused {
        return Err(TokenError::Paused);
    }

    // =========================================================================
    // Check 2: Amount > 0
    // =========================================================================
    if amount == 0 {
        return Err(TokenError::ZeroAmount);
    }

    // =========================================================================
    // Check 3: Sufficient balance
    // =========================================================================
    let from_balance = store.get_token_balance(&contract.id, &from)?;
    if from_balance < amount {
        return Err(TokenError::InsufficientBalance {
            have: from_balance,
            need: amount,
        });
    }

    // Self-transfer is a balance no-op
    if from == to {
        return Ok(TransferResult {
            amount,
            from_balance,
            to_balance: from_balance,
        });
    }

    let to_balance = store.get_token_balance(&contract.id, &to)?;
    let new_from_balance = from_balance
        .checked_sub(amount)
        .ok_or(TokenError::Underflow)?;
    let new_to_balance = to_balance
        .checked_add(amount)
        .ok_or(TokenError::Overflow)?;

    // =========================================================================
    // Conservation invariant verification
    // =========================================================================
    let debited = from_balance - new_from_balance;
    let credited = new_to_balance - to_balance;
    if debited != credited {
        return Err(TokenError::ConservationViolated(format!(
            "debited ({}) != credited ({})",
            debited, credited
        )));
    }

    // =========================================================================
    // Apply state transitions
    // =========================================================================
    store.set_token_balance(&contract.id, &from, new_from_balance)?;
    store.set_token_balance(&contract.id, &to, new_to_balance)?;

    Ok(TransferResult {
        amount,
        from_balance: new_from_balance,
        to_balance: new_to_balance,
    })
}

/// Pay several recipients out of `from` as one transfer
///
/// Every credit is computed before any balance is written, so either all
/// payouts land or none do. Zero-amount entries are skipped. Returns the
/// remaining balance of `from`.
pub fn apply_token_payouts(
    store: &dyn TokenStore,
    contract: &TokenContract,
    from: Address,
    payouts: &[(Address, Amount)],
) -> TokenResult<Amount> {
    // =========================================================================
    // Check 1: Pause
    // =========================================================================
    if contract.paused {
        return Err(TokenError::Paused);
    }

    // =========================================================================
    // Check 2: Amount > 0
    // =========================================================================
    let total = payouts
        .iter()
        .try_fold(0 as Amount, |acc, (_, amount)| acc.checked_add(*amount))
        .ok_or(TokenError::Overflow)?;
    if total == 0 {
        return Err(TokenError::ZeroAmount);
    }

    // =========================================================================
    // Check 3: Sufficient balance
    // =========================================================================
    let from_balance = store.get_token_balance(&contract.id, &from)?;
    if from_balance < total {
        return Err(TokenError::InsufficientBalance {
            have: from_balance,
            need: total,
        });
    }

    // =========================================================================
    // Check 4: Every credit fits
    // =========================================================================
    let mut balances = BTreeMap::new();
    balances.insert(from, from_balance - total);
    for (to, amount) in payouts.iter().filter(|(_, amount)| *amount > 0) {
        let current = match balances.get(to) {
            Some(balance) => *balance,
            None => store.get_token_balance(&contract.id, to)?,
        };
        let credited = current.checked_add(*amount).ok_or(TokenError::Overflow)?;
        balances.insert(*to, credited);
    }

    // =========================================================================
    // Apply state transitions
    // =========================================================================
    for (address, balance) in &balances {
        store.set_token_balance(&contract.id, address, *balance)?;
    }

    Ok(balances.get(&from).copied().unwrap_or_default())
}

/// Move `amount` from `from` to `to` on behalf of `spender`
///
/// Consumes `amount` of the allowance `from` granted to `spender`. The
/// allowance is only reduced once the transfer itself succeeded.
pub fn apply_token_transfer_from(
    store: &dyn TokenStore,
    contract: &TokenContract,
    spender: Address,
    from: Address,
    to: Address,
    amount: Amount,
) -> TokenResult<TransferResult> {
    let allowance = store.get_allowance(&contract.id, &from, &spender)?;
    if allowance < amount {
        return Err(TokenError::InsufficientAllowance {
            have: allowance,
            need: amount,
        });
    }

    let result = apply_token_transfer(store, contract, from, to, amount)?;

    let remaining = allowance
        .checked_sub(amount)
        .ok_or(TokenError::Underflow)?;
    store.set_allowance(&contract.id, &from, &spender, remaining)?;

    Ok(result)
}

/// Set the allowance `owner` grants to `spender` (overwrites any previous value)
pub fn apply_token_approve(
    store: &dyn TokenStore,
    contract: &TokenContract,
    owner: Address,
    spender: Address,
    amount: Amount,
) -> TokenResult<()> {
    if contract.paused {
        return Err(TokenError::Paused);
    }
    store.set_allowance(&contract.id, &owner, &spender, amount)
}

/// Mint new supply to `to`
///
/// # Enforcement
///
/// - **Pause**: Mint fails if contract is paused
/// - **Mint policy**: `minter` must be allowed by the contract's policy
/// - **Cap invariants**: total_supply never exceeds supply_cap
pub fn apply_token_mint(
    store: &dyn TokenStore,
    contract: &mut TokenContract,
    minter: Address,
    to: Address,
    amount: Amount,
) -> TokenResult<Amount> {
    if contract.paused {
        return Err(TokenError::Paused);
    }
    if !contract.mint_policy.allows(&minter) {
        return Err(TokenError::UnauthorizedMinter(minter));
    }
    if amount == 0 {
        return Err(TokenError::ZeroAmount);
    }

    let new_supply = contract
        .total_supply
        .checked_add(amount)
        .ok_or(TokenError::Overflow)?;
    if let Some(max) = contract.supply_cap {
        if new_supply > max {
            return Err(TokenError::SupplyCapExceeded {
                max,
                would_have: new_supply,
            });
        }
    }

    let balance = store.get_token_balance(&contract.id, &to)?;
    let new_balance = balance.checked_add(amount).ok_or(TokenError::Overflow)?;

    store.set_token_balance(&contract.id, &to, new_balance)?;
    contract.total_supply = new_supply;
    store.put_token_contract(contract)?;

    Ok(new_balance)
}
