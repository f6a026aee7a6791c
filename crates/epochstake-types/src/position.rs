//! Participant positions.
//!
//! A position is created on the first deposit and never deleted; a fully
//! withdrawn position persists at zero principal. Whether a position is
//! current or stale is derived from its checkpoint epoch, never stored.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{EpochId, Result, StakeError, Timestamp, constants::ACC_SHARE_SCALE};

/// Derived lifecycle state of a position relative to the current epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionStatus {
    /// Never deposited.
    Uninitialized,
    /// Last settled in the current epoch.
    Active,
    /// Last settled in an epoch that has since closed.
    Stale,
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "UNINITIALIZED"),
            Self::Active => write!(f, "ACTIVE"),
            Self::Stale => write!(f, "STALE"),
        }
    }
}

/// One participant's stake and settlement checkpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantPosition {
    /// Principal currently staked.
    pub principal: u128,
    /// Accumulator value at the last settlement.
    pub checkpoint_acc_share: u128,
    /// Epoch in which the last settlement happened.
    pub checkpoint_epoch_id: EpochId,
    /// Time of the last explicit deposit or renew (starts the lock timer).
    pub last_deposit_time: Timestamp,
    /// Epoch in which `last_deposit_time` was set.
    pub lock_epoch_id: EpochId,
    /// Reward owed but not yet credited, carried across a top-up deposit.
    pub unclaimed_reward: u128,
    /// Reward credited to this participant over the position's lifetime.
    pub total_claimed: u128,
}

impl ParticipantPosition {
    /// Whether this position has ever been written.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        !self.checkpoint_epoch_id.is_none()
    }

    /// Stale iff principal was last settled in an earlier epoch.
    #[must_use]
    pub fn is_stale(&self, current: EpochId) -> bool {
        self.is_initialized() && self.checkpoint_epoch_id < current
    }

    #[must_use]
    pub fn status(&self, current: EpochId) -> PositionStatus {
        if !self.is_initialized() {
            PositionStatus::Uninitialized
        } else if self.is_stale(current) {
            PositionStatus::Stale
        } else {
            PositionStatus::Active
        }
    }

    /// Reward owed against the accumulator value `acc_share`:
    /// `unclaimed + principal * (acc_share - checkpoint) / SCALE`.
    ///
    /// The accumulator never resets across epochs, so this holds for
    /// current and stale positions alike.
    pub fn owed(&self, acc_share: u128) -> Result<u128> {
        let delta = acc_share
            .checked_sub(self.checkpoint_acc_share)
            .ok_or_else(|| StakeError::RewardInvariantViolation {
                reason: format!(
                    "checkpoint {} ahead of accumulator {acc_share}",
                    self.checkpoint_acc_share
                ),
            })?;
        let accrued = self
            .principal
            .checked_mul(delta)
            .ok_or(StakeError::ArithmeticOverflow {
                context: "position owed",
            })?
            / ACC_SHARE_SCALE;
        self.unclaimed_reward
            .checked_add(accrued)
            .ok_or(StakeError::ArithmeticOverflow {
                context: "position owed",
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_uninitialized() {
        let pos = ParticipantPosition::default();
        assert_eq!(pos.status(EpochId(1)), PositionStatus::Uninitialized);
        assert!(!pos.is_stale(EpochId(5)));
    }

    #[test]
    fn status_tracks_checkpoint_epoch() {
        let pos = ParticipantPosition {
            principal: 10,
            checkpoint_epoch_id: EpochId(2),
            ..ParticipantPosition::default()
        };
        assert_eq!(pos.status(EpochId(2)), PositionStatus::Active);
        assert_eq!(pos.status(EpochId(3)), PositionStatus::Stale);
    }

    #[test]
    fn owed_truncates_toward_zero() {
        let pos = ParticipantPosition {
            principal: 3,
            checkpoint_acc_share: 0,
            checkpoint_epoch_id: EpochId(1),
            ..ParticipantPosition::default()
        };
        // 3 * (SCALE / 2) / SCALE = 1.5 -> 1
        assert_eq!(pos.owed(ACC_SHARE_SCALE / 2).unwrap(), 1);
    }

    #[test]
    fn owed_includes_unclaimed_carry() {
        let pos = ParticipantPosition {
            principal: 100,
            checkpoint_acc_share: ACC_SHARE_SCALE,
            checkpoint_epoch_id: EpochId(1),
            unclaimed_reward: 7,
            ..ParticipantPosition::default()
        };
        assert_eq!(pos.owed(ACC_SHARE_SCALE).unwrap(), 7);
        assert_eq!(pos.owed(2 * ACC_SHARE_SCALE).unwrap(), 107);
    }

    #[test]
    fn checkpoint_ahead_of_accumulator_is_rejected() {
        let pos = ParticipantPosition {
            principal: 1,
            checkpoint_acc_share: 10,
            checkpoint_epoch_id: EpochId(1),
            ..ParticipantPosition::default()
        };
        let err = pos.owed(5).unwrap_err();
        assert!(matches!(err, StakeError::RewardInvariantViolation { .. }));
    }
}
