//! Pool-wide scalar state, persisted as a single versioned row.

use serde::{Deserialize, Serialize};

use crate::{EpochId, Timestamp};

/// The scalar fields shared by every operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRow {
    /// Running reward-per-unit-principal, scaled by `ACC_SHARE_SCALE`.
    pub acc_share: u128,
    /// Latest opened epoch (`EpochId::NONE` before the first open).
    pub current_epoch_id: EpochId,
    /// Principal compounding in the open epoch.
    pub total_principal_active_epoch: u128,
    /// Last instant the accumulator was advanced.
    pub last_accrual_time: Timestamp,
    /// Participants holding nonzero principal.
    pub total_participants: u64,
    /// Incremented on every committed mutation.
    pub version: u64,
}
