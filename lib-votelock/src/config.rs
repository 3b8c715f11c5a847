//! Escrow Configuration
//!
//! Durations and the penalty ceiling. Loadable from TOML; every field is
//! optional and falls back to the defaults below.
//!
//! ```toml
//! max_lock_duration = 31449600   # 52 weeks
//! max_lock_horizon = 125798400   # 208 weeks, enables extended locks
//! max_penalty_bps = 7500
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use lib_types::{Bps, MAX_BPS};

use crate::errors::{VoteLockError, VoteLockResult};
use crate::{DEFAULT_MAX_LOCK_DURATION, DEFAULT_MAX_PENALTY_BPS, WEEK};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscrowConfig {
    /// MAXTIME: the duration that earns full voting power, and the divisor
    /// turning principal into slope.
    pub max_lock_duration: u64,
    /// Furthest allowed unlock time, measured from now.
    pub max_lock_horizon: u64,
    /// Ceiling on the early-exit penalty.
    pub max_penalty_bps: Bps,
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            max_lock_duration: DEFAULT_MAX_LOCK_DURATION,
            max_lock_horizon: DEFAULT_MAX_LOCK_DURATION,
            max_penalty_bps: DEFAULT_MAX_PENALTY_BPS,
        }
    }
}

impl EscrowConfig {
    /// Allow unlock times up to `weeks` weeks out (extended locks).
    pub fn with_horizon_weeks(mut self, weeks: u64) -> Self {
        self.max_lock_horizon = weeks.saturating_mul(WEEK);
        self
    }

    /// Whether locks longer than MAXTIME can be created.
    pub fn allows_extended_locks(&self) -> bool {
        self.max_lock_horizon > self.max_lock_duration
    }

    pub fn validate(&self) -> VoteLockResult<()> {
        if self.max_lock_duration == 0 || self.max_lock_duration % WEEK != 0 {
            return Err(VoteLockError::InvalidConfig(format!(
                "max_lock_duration must be a non-zero multiple of {} seconds, got {}",
                WEEK, self.max_lock_duration
            )));
        }
        if self.max_lock_horizon % WEEK != 0 {
            return Err(VoteLockError::InvalidConfig(format!(
                "max_lock_horizon must be a multiple of {} seconds, got {}",
                WEEK, self.max_lock_horizon
            )));
        }
        if self.max_lock_horizon < self.max_lock_duration {
            return Err(VoteLockError::InvalidConfig(format!(
                "max_lock_horizon ({}) is shorter than max_lock_duration ({})",
                self.max_lock_horizon, self.max_lock_duration
            )));
        }
        if self.max_penalty_bps > MAX_BPS {
            return Err(VoteLockError::InvalidConfig(format!(
                "max_penalty_bps must be at most {}, got {}",
                MAX_BPS, self.max_penalty_bps
            )));
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> VoteLockResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| VoteLockError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> VoteLockResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            VoteLockError::InvalidConfig(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }
}
