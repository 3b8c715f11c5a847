//! Vote Escrow
//!
//! Owns the lock ledger, the per-account and global checkpoint histories and
//! their slope schedules. Principal is held by the escrow's `vault` address on
//! the external token ledger.
//!
//! # Mutation flow
//!
//! Every mutation runs in three steps:
//!
//! 1. **Plan**: validate, advance the global point to now and stage the new
//!    points and slope changes (fallible, touches nothing)
//! 2. **Settle**: move tokens on the ledger
//! 3. **Commit**: write the planned state (infallible)
//!
//! so a failure at any step leaves the escrow unchanged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use lib_tokens::{apply_token_payouts, apply_token_transfer_from, load_contract, TokenStore};
use lib_types::{Address, Amount, BlockHeight, BlockStamp, Timestamp, TokenId};

use crate::config::EscrowConfig;
use crate::decay::{replay, replay_with};
use crate::errors::{VoteLockError, VoteLockResult};
use crate::lock::{curve, LockedBalance};
use crate::penalty::Settlement;
use crate::point::{Point, PointHistory};
use crate::schedule::{SlopeSchedule, StagedSlopes};

// =============================================================================
// STATE
// =============================================================================

/// Lock, checkpoints and slope schedule of one account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub lock: LockedBalance,
    pub history: PointHistory,
    pub slopes: SlopeSchedule,
}

/// Outcome of a withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    pub account: Address,
    pub settlement: Settlement,
    pub stamp: BlockStamp,
}

/// The vote-lock engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteEscrow {
    config: EscrowConfig,
    /// Base token locked in the escrow
    token: TokenId,
    /// Ledger address holding locked principal
    vault: Address,
    /// Ledger address receiving early-exit penalties
    treasury: Address,
    accounts: BTreeMap<Address, AccountState>,
    global: PointHistory,
    global_slopes: SlopeSchedule,
    last_seen: BlockStamp,
}

/// Everything a lock change writes, computed up front
#[derive(Debug)]
struct LockUpdate {
    account: Address,
    lock: LockedBalance,
    account_point: Point,
    account_slopes: StagedSlopes,
    global_slopes: StagedSlopes,
    weekly: Vec<Point>,
    global_point: Point,
    stamp: BlockStamp,
}

impl VoteEscrow {
    /// Create an escrow whose history starts at `genesis`
    pub fn new(
        config: EscrowConfig,
        token: TokenId,
        vault: Address,
        treasury: Address,
        genesis: BlockStamp,
    ) -> VoteLockResult<Self> {
        config.validate()?;
        tracing::info!(
            "Vote escrow created at {} (max lock {}s, horizon {}s, extended locks: {}, max penalty {} bps)",
            genesis,
            config.max_lock_duration,
            config.max_lock_horizon,
            config.allows_extended_locks(),
            config.max_penalty_bps
        );
        Ok(Self {
            config,
            token,
            vault,
            treasury,
            accounts: BTreeMap::new(),
            global: PointHistory::with_origin(Point::zero_at(genesis)),
            global_slopes: SlopeSchedule::new(),
            last_seen: genesis,
        })
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Add `amount` to `account`'s lock and/or move its unlock time
    ///
    /// `amount` is pulled from `account` with `transferFrom` (the vault must be
    /// approved). `amount = 0, unlock = None` only re-checkpoints the lock.
    pub fn modify_lock(
        &mut self,
        store: &dyn TokenStore,
        account: Address,
        amount: Amount,
        unlock: Option<Timestamp>,
        now: BlockStamp,
    ) -> VoteLockResult<LockedBalance> {
        self.observe(now)?;
        let old = self.locked(&account);
        let lock = old.modified(amount, unlock, now.timestamp, &self.config)?;
        let update = self.plan(account, lock, now)?;

        if amount > 0 {
            let contract = load_contract(store, &self.token)?;
            apply_token_transfer_from(store, &contract, self.vault, account, self.vault, amount)?;
        }
        self.commit(update);

        tracing::info!(
            "Lock {:?}: amount {} -> {}, end {} -> {} at {}",
            account,
            old.amount,
            lock.amount,
            old.end,
            lock.end,
            now
        );
        Ok(lock)
    }

    /// Add `amount` paid by `funder` to `account`'s active lock
    pub fn deposit_for(
        &mut self,
        store: &dyn TokenStore,
        funder: Address,
        account: Address,
        amount: Amount,
        now: BlockStamp,
    ) -> VoteLockResult<LockedBalance> {
        self.observe(now)?;
        let old = self.locked(&account);
        if old.amount == 0 || old.is_expired(now.timestamp) {
            return Err(VoteLockError::NoActiveLock(account));
        }
        if amount == 0 {
            return Err(VoteLockError::InvalidLock("deposit amount must be positive".to_string()));
        }
        let lock = old.modified(amount, None, now.timestamp, &self.config)?;
        let update = self.plan(account, lock, now)?;

        let contract = load_contract(store, &self.token)?;
        apply_token_transfer_from(store, &contract, self.vault, funder, self.vault, amount)?;
        self.commit(update);

        tracing::info!(
            "Lock {:?}: {:?} deposited {} (total {}) at {}",
            account,
            funder,
            amount,
            lock.amount,
            now
        );
        Ok(lock)
    }

    /// Return the full principal of an unlocked lock
    pub fn withdraw(
        &mut self,
        store: &dyn TokenStore,
        account: Address,
        now: BlockStamp,
    ) -> VoteLockResult<WithdrawalReceipt> {
        self.observe(now)?;
        let lock = self.locked(&account);
        if lock.amount == 0 {
            return Err(VoteLockError::NoActiveLock(account));
        }
        if !lock.is_expired(now.timestamp) {
            return Err(VoteLockError::NotWithdrawable {
                end: lock.end,
                now: now.timestamp,
            });
        }
        self.settle(store, account, Settlement::on_time(lock.amount), now)
    }

    /// Leave a lock before it unlocks, paying the early-exit penalty
    ///
    /// After unlock this is equivalent to [`VoteEscrow::withdraw`].
    pub fn withdraw_early(
        &mut self,
        store: &dyn TokenStore,
        account: Address,
        now: BlockStamp,
    ) -> VoteLockResult<WithdrawalReceipt> {
        self.observe(now)?;
        let lock = self.locked(&account);
        if lock.amount == 0 {
            return Err(VoteLockError::NoActiveLock(account));
        }
        let settlement = Settlement::compute(&lock, now.timestamp, &self.config)?;
        self.settle(store, account, settlement, now)
    }

    /// Advance the global history to `now` and record a point there
    ///
    /// Returns the new global epoch.
    pub fn checkpoint(&mut self, now: BlockStamp) -> VoteLockResult<u64> {
        self.observe(now)?;
        let (weekly, point) = self.advance_global(now)?;
        for p in weekly {
            self.global.push(p);
        }
        let epoch = self.global.push(point);
        self.last_seen = now;

        tracing::debug!(
            "Global checkpoint {} at {}: bias={}, slope={}",
            epoch,
            now,
            point.bias,
            point.slope
        );
        Ok(epoch)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    pub fn config(&self) -> &EscrowConfig {
        &self.config
    }

    pub fn token(&self) -> TokenId {
        self.token
    }

    pub fn vault(&self) -> Address {
        self.vault
    }

    pub fn treasury(&self) -> Address {
        self.treasury
    }

    /// Latest stamp seen by a mutation
    pub fn last_seen(&self) -> BlockStamp {
        self.last_seen
    }

    /// Current lock of `account` (empty if none)
    pub fn locked(&self, account: &Address) -> LockedBalance {
        self.accounts
            .get(account)
            .map(|state| state.lock)
            .unwrap_or_default()
    }

    /// Latest checkpoint index of `account`
    pub fn epoch(&self, account: &Address) -> u64 {
        self.accounts
            .get(account)
            .map(|state| state.history.epoch())
            .unwrap_or(0)
    }

    /// Latest global checkpoint index
    pub fn global_epoch(&self) -> u64 {
        self.global.epoch()
    }

    /// Checkpoint `epoch` of `account`
    pub fn point_history(&self, account: &Address, epoch: u64) -> Option<Point> {
        match self.accounts.get(account) {
            Some(state) => state.history.get(epoch).copied(),
            None if epoch == 0 => Some(Point::default()),
            None => None,
        }
    }

    /// Global checkpoint `epoch` (0 is the genesis point)
    pub fn global_point_history(&self, epoch: u64) -> Option<Point> {
        self.global.get(epoch).copied()
    }

    /// Slope delta `account` has scheduled at `ts`
    pub fn slope_changes(&self, account: &Address, ts: Timestamp) -> i128 {
        self.accounts
            .get(account)
            .map(|state| state.slopes.get(ts))
            .unwrap_or(0)
    }

    /// Aggregate slope delta scheduled at `ts`
    pub fn global_slope_changes(&self, ts: Timestamp) -> i128 {
        self.global_slopes.get(ts)
    }

    /// Voting power of `account` at `ts`
    ///
    /// Works for any `ts` from genesis on, including the future (the
    /// current lock projected forward).
    pub fn balance_of(&self, account: &Address, ts: Timestamp) -> VoteLockResult<Amount> {
        self.ensure_covered(ts)?;
        let state = match self.accounts.get(account) {
            Some(state) => state,
            None => return Ok(0),
        };
        let epoch = match state.history.find_by_timestamp(ts) {
            Some(epoch) if epoch > 0 => epoch,
            _ => return Ok(0),
        };
        let point = Self::point_at(&state.history, epoch)?;
        let at = replay(point, &state.slopes, ts)?;
        to_amount(at.bias)
    }

    /// Total voting power at `ts`
    pub fn total_supply(&self, ts: Timestamp) -> VoteLockResult<Amount> {
        self.ensure_covered(ts)?;
        let epoch = self.global.find_by_timestamp(ts).ok_or_else(|| {
            VoteLockError::OutOfRange(format!("no global checkpoint at or before {}", ts))
        })?;
        let point = Self::point_at(&self.global, epoch)?;
        let at = replay(point, &self.global_slopes, ts)?;
        to_amount(at.bias)
    }

    /// Timestamp of block `height`, interpolated between global checkpoints
    ///
    /// Past the last checkpoint the interpolation runs towards `now`.
    pub fn block_timestamp(&self, height: BlockHeight, now: BlockStamp) -> VoteLockResult<Timestamp> {
        self.observe(now)?;
        if height > now.height {
            return Err(VoteLockError::OutOfRange(format!(
                "block {} is after current block {}",
                height, now.height
            )));
        }
        let epoch = self.global.find_by_block(height).ok_or_else(|| {
            VoteLockError::OutOfRange(format!(
                "block {} precedes genesis block {}",
                height,
                self.global.origin().block
            ))
        })?;
        let point = Self::point_at(&self.global, epoch)?;

        let (next_ts, next_block) = match self.global.get(epoch + 1) {
            Some(next) => (next.timestamp, next.block),
            None => (now.timestamp, now.height),
        };
        if next_block <= point.block {
            return Ok(point.timestamp);
        }

        let dt = u128::from(next_ts.saturating_sub(point.timestamp))
            * u128::from(height - point.block)
            / u128::from(next_block - point.block);
        let dt = Timestamp::try_from(dt).map_err(|_| VoteLockError::Overflow)?;
        Ok(point.timestamp + dt)
    }

    /// Voting power of `account` at block `height`
    pub fn get_prior_votes(&self, account: &Address, height: BlockHeight, now: BlockStamp) -> VoteLockResult<Amount> {
        let ts = self.block_timestamp(height, now)?;
        self.balance_of(account, ts)
    }

    /// Total voting power at block `height`
    pub fn total_supply_at(&self, height: BlockHeight, now: BlockStamp) -> VoteLockResult<Amount> {
        let ts = self.block_timestamp(height, now)?;
        self.total_supply(ts)
    }

    // =========================================================================
    // SNAPSHOTS
    // =========================================================================

    /// Serialize the full escrow state
    pub fn to_bytes(&self) -> VoteLockResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| VoteLockError::Snapshot(e.to_string()))
    }

    /// Restore an escrow from [`VoteEscrow::to_bytes`] output
    pub fn from_bytes(bytes: &[u8]) -> VoteLockResult<Self> {
        let escrow: Self =
            bincode::deserialize(bytes).map_err(|e| VoteLockError::Snapshot(e.to_string()))?;
        escrow.config.validate()?;
        Ok(escrow)
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn observe(&self, now: BlockStamp) -> VoteLockResult<()> {
        if !now.is_at_or_after(&self.last_seen) {
            return Err(VoteLockError::ClockRegression {
                last: self.last_seen,
                now,
            });
        }
        Ok(())
    }

    fn ensure_covered(&self, ts: Timestamp) -> VoteLockResult<()> {
        let genesis = self.global.origin().timestamp;
        if ts < genesis {
            return Err(VoteLockError::OutOfRange(format!(
                "timestamp {} precedes genesis {}",
                ts, genesis
            )));
        }
        Ok(())
    }

    fn point_at(history: &PointHistory, epoch: u64) -> VoteLockResult<Point> {
        history
            .get(epoch)
            .copied()
            .ok_or_else(|| VoteLockError::DataConsistency(format!("missing checkpoint {}", epoch)))
    }

    /// Replay the global point to `now`
    ///
    /// Returns the week-boundary points crossed on the way (with interpolated
    /// block heights) and the point at `now`.
    fn advance_global(&self, now: BlockStamp) -> VoteLockResult<(Vec<Point>, Point)> {
        let last = *self.global.last();
        let mut weekly = Vec::new();
        let mut point = replay_with(last, &self.global_slopes, now.timestamp, |p| weekly.push(p))?;
        for p in &mut weekly {
            p.block = interpolate_block(&last, now, p.timestamp)?;
        }
        point.block = now.height;
        Ok((weekly, point))
    }

    fn plan(&self, account: Address, lock: LockedBalance, now: BlockStamp) -> VoteLockResult<LockUpdate> {
        let old_lock = self.locked(&account);
        let maxtime = self.config.max_lock_duration;
        let old = curve(&old_lock, now, maxtime)?;
        let new = curve(&lock, now, maxtime)?;

        // Cancel what the old curve still has scheduled, add the new curve's
        let mut deltas: Vec<(Timestamp, i128)> = old
            .scheduled(old_lock.end)
            .into_iter()
            .map(|(ts, delta)| (ts, -delta))
            .collect();
        deltas.extend(new.scheduled(lock.end));

        let account_slopes = match self.accounts.get(&account) {
            Some(state) => state.slopes.stage(&deltas)?,
            None => SlopeSchedule::new().stage(&deltas)?,
        };
        let global_slopes = self.global_slopes.stage(&deltas)?;

        let (weekly, mut global_point) = self.advance_global(now)?;
        let bias = global_point
            .bias
            .checked_add(new.point.bias)
            .and_then(|b| b.checked_sub(old.point.bias))
            .ok_or(VoteLockError::Overflow)?;
        let slope = global_point
            .slope
            .checked_add(new.point.slope)
            .and_then(|s| s.checked_sub(old.point.slope))
            .ok_or(VoteLockError::Overflow)?;
        if slope < 0 {
            tracing::error!(
                "Global slope would become {} after updating {:?} at {}",
                slope,
                account,
                now
            );
            return Err(VoteLockError::DataConsistency(format!(
                "global slope would become {}",
                slope
            )));
        }
        global_point.bias = bias.max(0);
        global_point.slope = slope;

        Ok(LockUpdate {
            account,
            lock,
            account_point: new.point,
            account_slopes,
            global_slopes,
            weekly,
            global_point,
            stamp: now,
        })
    }

    fn commit(&mut self, update: LockUpdate) {
        let state = self.accounts.entry(update.account).or_default();
        state.lock = update.lock;
        let account_epoch = state.history.push(update.account_point);
        state.slopes.commit(update.account_slopes);

        for p in update.weekly {
            self.global.push(p);
        }
        let global_epoch = self.global.push(update.global_point);
        self.global_slopes.commit(update.global_slopes);
        self.last_seen = update.stamp;

        tracing::debug!(
            "Checkpoint {:?} epoch {} (bias={}, slope={}), global epoch {} (bias={}, slope={})",
            update.account,
            account_epoch,
            update.account_point.bias,
            update.account_point.slope,
            global_epoch,
            update.global_point.bias,
            update.global_point.slope
        );
    }

    /// Zero the lock of `account` and pay out `settlement` from the vault
    fn settle(
        &mut self,
        store: &dyn TokenStore,
        account: Address,
        settlement: Settlement,
        now: BlockStamp,
    ) -> VoteLockResult<WithdrawalReceipt> {
        let update = self.plan(account, LockedBalance::default(), now)?;

        let contract = load_contract(store, &self.token)?;
        let held = store.get_token_balance(&self.token, &self.vault)?;
        if held < settlement.principal {
            tracing::error!(
                "Vault holds {} but owes {} to {:?}",
                held,
                settlement.principal,
                account
            );
            return Err(VoteLockError::DataConsistency(format!(
                "vault holds {}, owes {}",
                held, settlement.principal
            )));
        }
        apply_token_payouts(
            store,
            &contract,
            self.vault,
            &[(account, settlement.returned), (self.treasury, settlement.penalty)],
        )?;
        if settlement.penalty > 0 {
            tracing::info!(
                "Treasury received {} early-exit penalty from {:?} at {}",
                settlement.penalty,
                account,
                now
            );
        }
        self.commit(update);

        tracing::info!(
            "Withdrawal {:?}: principal {}, returned {}, penalty {} at {}",
            account,
            settlement.principal,
            settlement.returned,
            settlement.penalty,
            now
        );
        Ok(WithdrawalReceipt {
            account,
            settlement,
            stamp: now,
        })
    }
}

/// Block height at `ts`, assuming blocks advanced linearly from `from` to `now`
fn interpolate_block(from: &Point, now: BlockStamp, ts: Timestamp) -> VoteLockResult<BlockHeight> {
    let span = now.timestamp.saturating_sub(from.timestamp);
    if span == 0 {
        return Ok(from.block);
    }
    let blocks = u128::from(now.height.saturating_sub(from.block));
    let elapsed = u128::from(ts.saturating_sub(from.timestamp));
    let offset = BlockHeight::try_from(blocks * elapsed / u128::from(span)).map_err(|_| VoteLockError::Overflow)?;
    from.block.checked_add(offset).ok_or(VoteLockError::Overflow)
}

fn to_amount(bias: i128) -> VoteLockResult<Amount> {
    Amount::try_from(bias.max(0)).map_err(|_| VoteLockError::Overflow)
}
