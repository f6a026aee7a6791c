//! Pool configuration.

use serde::{Deserialize, Serialize};

use crate::{ParticipantId, Result, StakeError, constants};

/// Configuration for one staking pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Account that funds each epoch's reward budget.
    pub treasury: ParticipantId,
    /// Smallest accepted deposit.
    #[serde(default = "default_min_deposit")]
    pub min_deposit: u128,
    /// Largest lock duration an epoch may carry.
    #[serde(default = "default_max_lock_duration_secs")]
    pub max_lock_duration_secs: u64,
    /// Longest window an epoch may span.
    #[serde(default = "default_max_epoch_duration_secs")]
    pub max_epoch_duration_secs: u64,
}

fn default_min_deposit() -> u128 {
    constants::DEFAULT_MIN_DEPOSIT
}

fn default_max_lock_duration_secs() -> u64 {
    constants::DEFAULT_MAX_LOCK_DURATION_SECS
}

fn default_max_epoch_duration_secs() -> u64 {
    constants::DEFAULT_MAX_EPOCH_DURATION_SECS
}

impl PoolConfig {
    /// Config with default limits for the given treasury.
    #[must_use]
    pub fn new(treasury: ParticipantId) -> Self {
        Self {
            treasury,
            min_deposit: default_min_deposit(),
            max_lock_duration_secs: default_max_lock_duration_secs(),
            max_epoch_duration_secs: default_max_epoch_duration_secs(),
        }
    }

    /// Parse and validate a JSON config document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| StakeError::Configuration(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_deposit == 0 {
            return Err(StakeError::Configuration(
                "min_deposit must be > 0".into(),
            ));
        }
        if self.max_epoch_duration_secs == 0 {
            return Err(StakeError::Configuration(
                "max_epoch_duration_secs must be > 0".into(),
            ));
        }
        Ok(())
    }
}
