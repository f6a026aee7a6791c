//! Epoch lifecycle types.
//!
//! An epoch is a funded window `[start, end)` that pays its reward budget
//! out at a constant per-second rate. It is current from the moment it is
//! opened until the first operation that observes `now >= end`, which
//! records a [`ClosedEpochSnapshot`]. After that the pool has no active
//! epoch until the next one is opened.

use serde::{Deserialize, Serialize};

use crate::{EpochId, Timestamp};

/// Parameters of an epoch as requested by the pool operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochWindow {
    /// Total reward budget, in the smallest reward unit.
    pub funded_reward: u128,
    /// First second of the window (inclusive).
    pub start_time: Timestamp,
    /// End of the window (exclusive).
    pub end_time: Timestamp,
    /// Minimum time a deposit or renewal stays locked.
    pub lock_duration_secs: u64,
}

impl EpochWindow {
    #[must_use]
    pub fn new(
        funded_reward: u128,
        start_time: Timestamp,
        end_time: Timestamp,
        lock_duration_secs: u64,
    ) -> Self {
        Self {
            funded_reward,
            start_time,
            end_time,
            lock_duration_secs,
        }
    }

    /// Window length in seconds (zero for an inverted window).
    #[must_use]
    pub fn duration_secs(&self) -> u64 {
        self.end_time.secs_since(self.start_time)
    }

    /// `funded_reward / duration`, truncated. The remainder is never paid.
    #[must_use]
    pub fn payout_rate_per_second(&self) -> u128 {
        match self.duration_secs() {
            0 => 0,
            secs => self.funded_reward / u128::from(secs),
        }
    }
}

/// A funded epoch. Immutable once opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epoch {
    pub id: EpochId,
    pub funded_reward: u128,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub payout_rate_per_second: u128,
    pub lock_duration_secs: u64,
}

impl Epoch {
    /// Build the epoch `id` from an already validated window.
    #[must_use]
    pub fn from_window(id: EpochId, window: &EpochWindow) -> Self {
        Self {
            id,
            funded_reward: window.funded_reward,
            start_time: window.start_time,
            end_time: window.end_time,
            payout_rate_per_second: window.payout_rate_per_second(),
            lock_duration_secs: window.lock_duration_secs,
        }
    }

    #[must_use]
    pub fn has_started(&self, now: Timestamp) -> bool {
        now >= self.start_time
    }

    #[must_use]
    pub fn has_ended(&self, now: Timestamp) -> bool {
        now >= self.end_time
    }

    /// Deposits are only accepted inside `[start, end)`.
    #[must_use]
    pub fn accepts_deposits(&self, now: Timestamp) -> bool {
        self.has_started(now) && !self.has_ended(now)
    }

    /// The portion of the budget that the per-second rate can ever pay.
    #[must_use]
    pub fn payable_reward(&self) -> u128 {
        let secs = u128::from(self.end_time.secs_since(self.start_time));
        self.payout_rate_per_second.saturating_mul(secs)
    }
}

/// Immutable record of an epoch at the instant it ended. Written exactly
/// once, keyed by `epoch_id`.
///
/// `acc_share_at_close` lets observers audit one epoch's contribution to the
/// accumulator; settlement never needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedEpochSnapshot {
    pub epoch_id: EpochId,
    /// Accumulator value pinned at `end_time`.
    pub acc_share_at_close: u128,
    pub payout_rate_per_second: u128,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub total_reward_funded: u128,
    /// Reward that actually accrued to stakers during the epoch.
    pub reward_emitted: u128,
    /// When the close was observed (always `>= end_time`).
    pub closed_at: Timestamp,
    /// Hash of the previous snapshot (all zeros for epoch 1).
    pub prev_hash: [u8; 32],
    /// SHA-256 commitment over this snapshot's fields and `prev_hash`.
    pub snapshot_hash: [u8; 32],
}

impl ClosedEpochSnapshot {
    /// Funded reward that was never emitted: intervals without stakers plus
    /// the rate-truncation remainder.
    #[must_use]
    pub fn reward_forfeited(&self) -> u128 {
        self.total_reward_funded.saturating_sub(self.reward_emitted)
    }

    #[must_use]
    pub fn hash_hex(&self) -> String {
        hex::encode(self.snapshot_hash)
    }
}
