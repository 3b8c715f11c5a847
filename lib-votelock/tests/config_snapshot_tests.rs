//! Configuration files and escrow snapshots.

mod common;

use anyhow::Result;
use common::*;
use lib_votelock::{EscrowConfig, SharedVoteEscrow, VoteEscrow, VoteLockError, WEEK};
use std::io::Write;
use tempfile::NamedTempFile;

// ── Config files ──────────────────────────────────────────────────────────────

#[test]
fn test_config_loaded_from_file() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "# extended locks, lighter penalty")?;
    writeln!(file, "max_lock_horizon = {}", 208 * WEEK)?;
    writeln!(file, "max_penalty_bps = 5000")?;

    let config = EscrowConfig::from_file(file.path())?;
    assert_eq!(config.max_lock_duration, MAXTIME);
    assert!(config.allows_extended_locks());

    let mut h = Harness::new(config)?;
    h.fund(alice(), AMOUNT)?;
    h.lock(alice(), AMOUNT, Some(T0 + 100 * WEEK))?;
    assert_eq!(h.power(alice())?, power_of(AMOUNT));

    let receipt = h.withdraw_early(alice())?;
    assert_eq!(receipt.settlement.penalty, AMOUNT / 2);
    Ok(())
}

#[test]
fn test_missing_config_file() {
    let result = EscrowConfig::from_file("/nonexistent/votelock.toml");
    assert!(matches!(result, Err(VoteLockError::InvalidConfig(_))));
}

#[test]
fn test_invalid_config_file_rejected() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "max_lock_duration = 1000")?;
    let result = EscrowConfig::from_file(file.path());
    assert!(matches!(result, Err(VoteLockError::InvalidConfig(_))));
    Ok(())
}

// ── Snapshots ─────────────────────────────────────────────────────────────────

#[test]
fn test_snapshot_restores_and_continues() -> Result<()> {
    let mut h = Harness::new(EscrowConfig::default())?;
    h.fund(alice(), 2 * AMOUNT)?;
    h.fund(bob(), AMOUNT)?;
    h.lock(alice(), AMOUNT, Some(T0 + 20 * WEEK))?;
    h.mine(3 * WEEK);
    h.lock(bob(), AMOUNT, Some(h.now.timestamp + 10 * WEEK))?;

    let bytes = h.escrow.to_bytes()?;
    let mut restored = VoteEscrow::from_bytes(&bytes)?;
    assert_eq!(restored, h.escrow);

    // Both copies advance identically
    let later = h.mine(2 * WEEK + DAY);
    h.escrow.checkpoint(later)?;
    restored.checkpoint(later)?;
    assert_eq!(restored, h.escrow);

    // The restored escrow keeps working against the same ledger
    restored.modify_lock(&h.store, alice(), AMOUNT, None, later)?;
    let alice_power = restored.balance_of(&alice(), later.timestamp)?;
    let bob_power = restored.balance_of(&bob(), later.timestamp)?;
    assert!(alice_power > h.power(alice())?);
    assert_eq!(restored.total_supply(later.timestamp)?, alice_power + bob_power);
    assert_eq!(h.tokens(VAULT)?, 3 * AMOUNT);
    Ok(())
}

#[test]
fn test_shared_escrow_serves_consistent_reads() -> Result<()> {
    let mut h = Harness::new(EscrowConfig::default())?;
    h.fund(alice(), AMOUNT)?;
    h.fund(bob(), AMOUNT)?;

    let shared = SharedVoteEscrow::new(h.escrow.clone());
    shared.modify_lock(&h.store, alice(), AMOUNT, Some(T0 + 10 * WEEK), h.now)?;
    shared.modify_lock(&h.store, bob(), AMOUNT, Some(T0 + 5 * WEEK), h.now)?;

    let later = h.mine(WEEK);
    let (alice_power, bob_power, total) = shared.read(|escrow| -> Result<_> {
        Ok((
            escrow.balance_of(&alice(), later.timestamp)?,
            escrow.balance_of(&bob(), later.timestamp)?,
            escrow.total_supply(later.timestamp)?,
        ))
    })?;
    assert_eq!(alice_power + bob_power, total);
    assert_eq!(shared.total_supply(later.timestamp)?, total);
    assert_eq!(shared.total_supply_at(later.height, later)?, total);
    assert_eq!(shared.get_prior_votes(&bob(), later.height, later)?, bob_power);

    let receipt = shared.withdraw_early(&h.store, bob(), later)?;
    assert!(receipt.settlement.penalty > 0);
    assert_eq!(shared.balance_of(&bob(), later.timestamp)?, 0);
    assert_eq!(shared.snapshot().global_epoch(), 3);
    Ok(())
}
