//! In-memory token store for tests, simulations and embedded hosts
//!
//! Thread-safe maps wrapped in `Arc<RwLock<_>>`; clones share the same state.
//! All data is lost on process termination.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use lib_types::{Address, Amount, TokenId};

use crate::contract::TokenContract;
use crate::errors::{TokenError, TokenResult};
use crate::transfer::TokenStore;

#[derive(Debug, Default)]
struct Tables {
    contracts: HashMap<TokenId, TokenContract>,
    balances: HashMap<(TokenId, Address), Amount>,
    allowances: HashMap<(TokenId, Address, Address), Amount>,
}

/// In-memory [`TokenStore`]
#[derive(Clone, Debug, Default)]
pub struct InMemoryTokenStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryTokenStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new token contract
    pub fn deploy(&self, contract: TokenContract) -> TokenResult<()> {
        let mut tables = self.tables.write();
        if tables.contracts.contains_key(&contract.id) {
            return Err(TokenError::AlreadyDeployed(contract.id));
        }
        tables.contracts.insert(contract.id, contract);
        Ok(())
    }

    /// Sum of all balances held for a token
    pub fn total_balances(&self, token: &TokenId) -> Amount {
        self.tables
            .read()
            .balances
            .iter()
            .filter(|((id, _), _)| id == token)
            .map(|(_, amount)| *amount)
            .sum()
    }
}

impl TokenStore for InMemoryTokenStore {
    fn get_token_contract(&self, id: &TokenId) -> TokenResult<Option<TokenContract>> {
        Ok(self.tables.read().contracts.get(id).cloned())
    }

    fn put_token_contract(&self, contract: &TokenContract) -> TokenResult<()> {
        self.tables.write().contracts.insert(contract.id, contract.clone());
        Ok(())
    }

    fn get_token_balance(&self, token: &TokenId, address: &Address) -> TokenResult<Amount> {
        Ok(*self.tables.read().balances.get(&(*token, *address)).unwrap_or(&0))
    }

    fn set_token_balance(&self, token: &TokenId, address: &Address, amount: Amount) -> TokenResult<()> {
        let mut tables = self.tables.write();
        if amount == 0 {
            tables.balances.remove(&(*token, *address));
        } else {
            tables.balances.insert((*token, *address), amount);
        }
        Ok(())
    }

    fn get_allowance(&self, token: &TokenId, owner: &Address, spender: &Address) -> TokenResult<Amount> {
        Ok(*self
            .tables
            .read()
            .allowances
            .get(&(*token, *owner, *spender))
            .unwrap_or(&0))
    }

    fn set_allowance(&self, token: &TokenId, owner: &Address, spender: &Address, amount: Amount) -> TokenResult<()> {
        self.tables
            .write()
            .allowances
            .insert((*token, *owner, *spender), amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::MintPolicy;

    fn token() -> TokenContract {
        TokenContract::new(TokenId::new([4u8; 32]), "Base".to_string(), "BASE".to_string(), 18, MintPolicy::Open)
    }

    #[test]
    fn test_deploy_twice_rejected() {
        let store = InMemoryTokenStore::new();
        store.deploy(token()).unwrap();
        assert!(matches!(store.deploy(token()), Err(TokenError::AlreadyDeployed(_))));
    }

    #[test]
    fn test_clones_share_state() {
        let store = InMemoryTokenStore::new();
        let shared = store.clone();
        let id = token().id;
        let addr = Address::new([1u8; 32]);

        store.set_token_balance(&id, &addr, 55).unwrap();
        assert_eq!(shared.get_token_balance(&id, &addr).unwrap(), 55);
        assert_eq!(shared.total_balances(&id), 55);
    }

    #[test]
    fn test_missing_entries_read_as_zero() {
        let store = InMemoryTokenStore::new();
        let id = token().id;
        let a = Address::new([1u8; 32]);
        let b = Address::new([2u8; 32]);
        assert_eq!(store.get_token_balance(&id, &a).unwrap(), 0);
        assert_eq!(store.get_allowance(&id, &a, &b).unwrap(), 0);
    }
}
