//! Shared Test Harness for lib-votelock Tests
//!
//! A simulated chain: a funded base-token ledger, an escrow, and a clock that
//! advances one block per `mine` call.

#![allow(dead_code)]

use anyhow::Result;
use lib_tokens::{apply_token_approve, apply_token_mint, InMemoryTokenStore, MintPolicy, TokenContract, TokenStore};
use lib_types::{Address, Amount, BlockStamp, Timestamp, TokenId};
use lib_votelock::{
    EscrowConfig, LockedBalance, VoteEscrow, VoteLockResult, WithdrawalReceipt, DEFAULT_MAX_LOCK_DURATION, WEEK,
};

pub const H: u64 = 3_600;
pub const DAY: u64 = 86_400;
pub const MAXTIME: u64 = DEFAULT_MAX_LOCK_DURATION;
pub const AMOUNT: Amount = 1_000_000_000_000_000_000;

/// Genesis time, on a week boundary
pub const T0: Timestamp = 2_600 * WEEK;

pub const TOKEN: TokenId = TokenId::new([0x70; 32]);
pub const VAULT: Address = Address::new([0xee; 32]);
pub const TREASURY: Address = Address::new([0xaa; 32]);

pub fn account(n: u8) -> Address {
    Address::new([n; 32])
}

pub fn alice() -> Address {
    account(1)
}

pub fn bob() -> Address {
    account(2)
}

/// Slope earned by `amount` locked under the default duration
pub fn slope_of(amount: Amount) -> Amount {
    amount / Amount::from(MAXTIME)
}

/// Full voting power of `amount` (`slope * MAXTIME`)
pub fn power_of(amount: Amount) -> Amount {
    slope_of(amount) * Amount::from(MAXTIME)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct Harness {
    pub store: InMemoryTokenStore,
    pub contract: TokenContract,
    pub escrow: VoteEscrow,
    pub now: BlockStamp,
}

impl Harness {
    /// Chain at genesis (block 1, `T0`)
    pub fn new(config: EscrowConfig) -> Result<Self> {
        init_tracing();
        let store = InMemoryTokenStore::new();
        let contract = TokenContract::new(TOKEN, "Base".to_string(), "BASE".to_string(), 18, MintPolicy::Open);
        store.deploy(contract.clone())?;

        let genesis = BlockStamp::new(1, T0);
        let escrow = VoteEscrow::new(config, TOKEN, VAULT, TREASURY, genesis)?;
        Ok(Self {
            store,
            contract,
            escrow,
            now: genesis,
        })
    }

    /// Mint `amount` to `who` and approve the vault for all of it
    pub fn fund(&mut self, who: Address, amount: Amount) -> Result<()> {
        apply_token_mint(&self.store, &mut self.contract, who, who, amount)?;
        let approved = self.store.get_allowance(&TOKEN, &who, &VAULT)?;
        apply_token_approve(&self.store, &self.contract, who, VAULT, approved + amount)?;
        Ok(())
    }

    /// Produce one block `dt` seconds after the current one
    pub fn mine(&mut self, dt: u64) -> BlockStamp {
        self.now = BlockStamp::new(self.now.height + 1, self.now.timestamp + dt);
        self.now
    }

    /// Produce `n` blocks `dt` seconds apart
    pub fn mine_many(&mut self, n: u64, dt: u64) -> BlockStamp {
        for _ in 0..n {
            self.mine(dt);
        }
        self.now
    }

    pub fn lock(&mut self, who: Address, amount: Amount, unlock: Option<Timestamp>) -> VoteLockResult<LockedBalance> {
        self.escrow.modify_lock(&self.store, who, amount, unlock, self.now)
    }

    pub fn withdraw(&mut self, who: Address) -> VoteLockResult<WithdrawalReceipt> {
        self.escrow.withdraw(&self.store, who, self.now)
    }

    pub fn withdraw_early(&mut self, who: Address) -> VoteLockResult<WithdrawalReceipt> {
        self.escrow.withdraw_early(&self.store, who, self.now)
    }

    /// Voting power of `who` now
    pub fn power(&self, who: Address) -> Result<Amount> {
        Ok(self.escrow.balance_of(&who, self.now.timestamp)?)
    }

    /// Total voting power now
    pub fn supply(&self) -> Result<Amount> {
        Ok(self.escrow.total_supply(self.now.timestamp)?)
    }

    /// Base-token balance of `who`
    pub fn tokens(&self, who: Address) -> Result<Amount> {
        Ok(self.store.get_token_balance(&TOKEN, &who)?)
    }
}
