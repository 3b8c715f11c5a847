//! Shared Vote Escrow
//!
//! Thread-safe handle around a [`VoteEscrow`]. Mutations take the write lock
//! for their whole plan/settle/commit sequence, so the global history sees
//! one mutation at a time; queries share the read lock and always observe a
//! fully committed state. Clones share the same escrow.

use parking_lot::RwLock;
use std::sync::Arc;

use lib_tokens::TokenStore;
use lib_types::{Address, Amount, BlockHeight, BlockStamp, Timestamp};

use crate::errors::VoteLockResult;
use crate::escrow::{VoteEscrow, WithdrawalReceipt};
use crate::lock::LockedBalance;

#[derive(Clone, Debug)]
pub struct SharedVoteEscrow {
    inner: Arc<RwLock<VoteEscrow>>,
}

impl SharedVoteEscrow {
    pub fn new(escrow: VoteEscrow) -> Self {
        Self {
            inner: Arc::new(RwLock::new(escrow)),
        }
    }

    pub fn modify_lock(
        &self,
        store: &dyn TokenStore,
        account: Address,
        amount: Amount,
        unlock: Option<Timestamp>,
        now: BlockStamp,
    ) -> VoteLockResult<LockedBalance> {
        self.inner.write().modify_lock(store, account, amount, unlock, now)
    }

    pub fn deposit_for(
        &self,
        store: &dyn TokenStore,
        funder: Address,
        account: Address,
        amount: Amount,
        now: BlockStamp,
    ) -> VoteLockResult<LockedBalance> {
        self.inner.write().deposit_for(store, funder, account, amount, now)
    }

    pub fn withdraw(&self, store: &dyn TokenStore, account: Address, now: BlockStamp) -> VoteLockResult<WithdrawalReceipt> {
        self.inner.write().withdraw(store, account, now)
    }

    pub fn withdraw_early(
        &self,
        store: &dyn TokenStore,
        account: Address,
        now: BlockStamp,
    ) -> VoteLockResult<WithdrawalReceipt> {
        self.inner.write().withdraw_early(store, account, now)
    }

    pub fn checkpoint(&self, now: BlockStamp) -> VoteLockResult<u64> {
        self.inner.write().checkpoint(now)
    }

    pub fn balance_of(&self, account: &Address, ts: Timestamp) -> VoteLockResult<Amount> {
        self.inner.read().balance_of(account, ts)
    }

    pub fn total_supply(&self, ts: Timestamp) -> VoteLockResult<Amount> {
        self.inner.read().total_supply(ts)
    }

    pub fn get_prior_votes(&self, account: &Address, height: BlockHeight, now: BlockStamp) -> VoteLockResult<Amount> {
        self.inner.read().get_prior_votes(account, height, now)
    }

    pub fn total_supply_at(&self, height: BlockHeight, now: BlockStamp) -> VoteLockResult<Amount> {
        self.inner.read().total_supply_at(height, now)
    }

    /// Run several queries against one consistent state
    pub fn read<R>(&self, f: impl FnOnce(&VoteEscrow) -> R) -> R {
        f(&self.inner.read())
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> VoteEscrow {
        self.inner.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EscrowConfig;
    use crate::WEEK;
    use lib_tokens::{apply_token_approve, apply_token_mint, InMemoryTokenStore, MintPolicy, TokenContract};
    use lib_types::TokenId;
    use std::thread;

    const AMOUNT: Amount = 1_000_000_000_000_000;
    const T0: Timestamp = 2_000 * WEEK;
    const TOKEN: TokenId = TokenId::new([1u8; 32]);
    const VAULT: Address = Address::new([0xee; 32]);

    #[test]
    fn test_concurrent_locks_keep_sum_consistent() {
        let store = InMemoryTokenStore::new();
        let mut contract = TokenContract::new(TOKEN, "Base".to_string(), "BASE".to_string(), 18, MintPolicy::Open);
        store.deploy(contract.clone()).unwrap();

        let accounts: Vec<Address> = (1..=8u8).map(|i| Address::new([i; 32])).collect();
        for who in &accounts {
            apply_token_mint(&store, &mut contract, *who, *who, AMOUNT).unwrap();
            apply_token_approve(&store, &contract, *who, VAULT, AMOUNT).unwrap();
        }

        let now = BlockStamp::new(2, T0 + 10);
        let escrow = VoteEscrow::new(EscrowConfig::default(), TOKEN, VAULT, Address::new([0xaa; 32]), BlockStamp::new(1, T0)).unwrap();
        let shared = SharedVoteEscrow::new(escrow);

        let handles: Vec<_> = accounts
            .iter()
            .enumerate()
            .map(|(i, who)| {
                let shared = shared.clone();
                let store = store.clone();
                let who = *who;
                thread::spawn(move || {
                    let unlock = T0 + (i as u64 + 1) * WEEK;
                    shared.modify_lock(&store, who, AMOUNT, Some(unlock), now).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let (epoch, sum, total) = shared.read(|escrow| {
            let sum: Amount = accounts
                .iter()
                .map(|a| escrow.balance_of(a, T0 + WEEK / 2).unwrap())
                .sum();
            (escrow.global_epoch(), sum, escrow.total_supply(T0 + WEEK / 2).unwrap())
        });
        assert_eq!(epoch, 8);
        assert_eq!(sum, total);
        assert_eq!(store.total_balances(&TOKEN), 8 * AMOUNT);
        assert_eq!(store.get_token_balance(&TOKEN, &VAULT).unwrap(), 8 * AMOUNT);
        assert_eq!(shared.snapshot().global_epoch(), 8);
    }
}
