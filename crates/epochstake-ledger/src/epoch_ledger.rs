//! Epoch ledger — the open/closed lifecycle and the snapshot arena.
//!
//! Epochs and snapshots live in two append-only vectors indexed by
//! `epoch_id - 1`. An epoch can only be opened once the previous one has a
//! snapshot, so for every closed id in `[1, current)` a snapshot exists and
//! the arena has no gaps.
//!
//! Each snapshot commits to its predecessor:
//!
//! ```text
//! hash_n = SHA-256(domain || epoch_id || acc_share_at_close || rate
//!                  || start || end || funded || emitted || closed_at
//!                  || hash_{n-1})
//! ```

use epochstake_types::{
    ClosedEpochSnapshot, Epoch, EpochId, EpochWindow, Result, StakeError, Timestamp,
    constants::{ACC_SHARE_SCALE, SNAPSHOT_HASH_DOMAIN},
};
use sha2::{Digest, Sha256};

/// Operator-facing bounds applied when an epoch is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLimits {
    pub max_epoch_duration_secs: u64,
    pub max_lock_duration_secs: u64,
}

/// Owns every epoch ever opened and every snapshot ever recorded.
#[derive(Debug, Clone, Default)]
pub struct EpochLedger {
    epochs: Vec<Epoch>,
    snapshots: Vec<ClosedEpochSnapshot>,
}

impl EpochLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted tables, re-verifying ids and the hash chain.
    pub fn from_parts(epochs: Vec<Epoch>, snapshots: Vec<ClosedEpochSnapshot>) -> Result<Self> {
        for (idx, epoch) in epochs.iter().enumerate() {
            let expected = EpochId(idx as u64 + 1);
            if epoch.id != expected {
                return Err(StakeError::SnapshotChainBroken {
                    epoch_id: epoch.id,
                    reason: format!("epoch stored at position of {expected}"),
                });
            }
        }
        let open_epochs = epochs.len().checked_sub(snapshots.len());
        if !matches!(open_epochs, Some(0 | 1)) {
            return Err(StakeError::SnapshotChainBroken {
                epoch_id: EpochId(snapshots.len() as u64),
                reason: format!(
                    "{} epochs but {} snapshots",
                    epochs.len(),
                    snapshots.len()
                ),
            });
        }

        let ledger = Self { epochs, snapshots };
        ledger.verify_chain()?;
        Ok(ledger)
    }

    /// Latest opened epoch id, or `EpochId::NONE`.
    #[must_use]
    pub fn current_epoch_id(&self) -> EpochId {
        self.epochs.last().map_or(EpochId::NONE, |e| e.id)
    }

    /// The open epoch, if one has not been closed yet.
    #[must_use]
    pub fn active_epoch(&self) -> Option<&Epoch> {
        if self.is_active() {
            self.epochs.last()
        } else {
            None
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.epochs.len() > self.snapshots.len()
    }

    #[must_use]
    pub fn epoch(&self, id: EpochId) -> Option<&Epoch> {
        Self::index(id).and_then(|i| self.epochs.get(i))
    }

    #[must_use]
    pub fn snapshot(&self, id: EpochId) -> Option<&ClosedEpochSnapshot> {
        Self::index(id).and_then(|i| self.snapshots.get(i))
    }

    #[must_use]
    pub fn epochs(&self) -> &[Epoch] {
        &self.epochs
    }

    #[must_use]
    pub fn snapshots(&self) -> &[ClosedEpochSnapshot] {
        &self.snapshots
    }

    /// Total reward funded across all epochs ever opened.
    #[must_use]
    pub fn total_funded(&self) -> u128 {
        self.epochs
            .iter()
            .fold(0u128, |acc, e| acc.saturating_add(e.funded_reward))
    }

    fn index(id: EpochId) -> Option<usize> {
        usize::try_from(id.0).ok()?.checked_sub(1)
    }

    /// The open epoch if `now` is at or past its end.
    #[must_use]
    pub fn elapsed_epoch(&self, now: Timestamp) -> Option<&Epoch> {
        self.active_epoch().filter(|e| e.has_ended(now))
    }

    /// Check `window` against the clock, the limits, and the lifecycle.
    ///
    /// Callers must close an elapsed epoch first; an epoch that is still
    /// open here has not ended.
    pub fn validate_window(
        &self,
        window: &EpochWindow,
        now: Timestamp,
        limits: WindowLimits,
    ) -> Result<()> {
        if let Some(epoch) = self.active_epoch() {
            return Err(StakeError::EpochStillActive {
                epoch_id: epoch.id,
                ends_at: epoch.end_time,
            });
        }
        if window.end_time <= window.start_time {
            return Err(StakeError::InvalidWindow {
                reason: format!(
                    "end {} is not after start {}",
                    window.end_time, window.start_time
                ),
            });
        }
        if window.start_time < now {
            return Err(StakeError::InvalidWindow {
                reason: format!("start {} is in the past (now {now})", window.start_time),
            });
        }
        if window.duration_secs() > limits.max_epoch_duration_secs {
            return Err(StakeError::InvalidWindow {
                reason: format!(
                    "duration {}s exceeds limit {}s",
                    window.duration_secs(),
                    limits.max_epoch_duration_secs
                ),
            });
        }
        if window.lock_duration_secs > limits.max_lock_duration_secs {
            return Err(StakeError::InvalidWindow {
                reason: format!(
                    "lock {}s exceeds limit {}s",
                    window.lock_duration_secs, limits.max_lock_duration_secs
                ),
            });
        }
        // The accumulator never resets, so its ceiling is every reward ever
        // funded times the scale, reached with a single unit staked.
        let cumulative = self
            .total_funded()
            .checked_add(window.funded_reward)
            .and_then(|total| total.checked_mul(ACC_SHARE_SCALE));
        if cumulative.is_none() {
            return Err(StakeError::RewardTooLarge {
                funded: window.funded_reward,
            });
        }
        Ok(())
    }

    /// Append the next epoch. The previous epoch must already be closed.
    pub fn open(&mut self, window: &EpochWindow) -> Result<&Epoch> {
        if let Some(epoch) = self.active_epoch() {
            return Err(StakeError::EpochStillActive {
                epoch_id: epoch.id,
                ends_at: epoch.end_time,
            });
        }
        let id = self.current_epoch_id().next();
        self.epochs.push(Epoch::from_window(id, window));
        Ok(&self.epochs[self.epochs.len() - 1])
    }

    /// Write the snapshot for the open epoch and mark the pool inactive.
    ///
    /// `acc_share_at_close` must already be pinned at the epoch's end.
    pub fn record_close(
        &mut self,
        acc_share_at_close: u128,
        reward_emitted: u128,
        closed_at: Timestamp,
    ) -> Result<&ClosedEpochSnapshot> {
        let epoch = self.active_epoch().ok_or(StakeError::NoActiveEpoch)?;
        let epoch_id = epoch.id;

        if Self::index(epoch_id) != Some(self.snapshots.len()) {
            return Err(StakeError::SnapshotChainBroken {
                epoch_id,
                reason: format!("{} snapshots already recorded", self.snapshots.len()),
            });
        }

        let prev_hash = self.snapshots.last().map_or([0u8; 32], |s| s.snapshot_hash);
        let mut snapshot = ClosedEpochSnapshot {
            epoch_id,
            acc_share_at_close,
            payout_rate_per_second: epoch.payout_rate_per_second,
            start_time: epoch.start_time,
            end_time: epoch.end_time,
            total_reward_funded: epoch.funded_reward,
            reward_emitted,
            closed_at,
            prev_hash,
            snapshot_hash: [0u8; 32],
        };
        snapshot.snapshot_hash = Self::compute_snapshot_hash(&snapshot);

        tracing::info!(
            epoch = %epoch_id,
            acc_share = acc_share_at_close,
            emitted = reward_emitted,
            forfeited = snapshot.reward_forfeited(),
            hash = %snapshot.hash_hex(),
            "Epoch closed"
        );

        self.snapshots.push(snapshot);
        Ok(&self.snapshots[self.snapshots.len() - 1])
    }

    fn compute_snapshot_hash(snapshot: &ClosedEpochSnapshot) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(SNAPSHOT_HASH_DOMAIN);
        hasher.update(snapshot.epoch_id.0.to_le_bytes());
        hasher.update(snapshot.acc_share_at_close.to_le_bytes());
        hasher.update(snapshot.payout_rate_per_second.to_le_bytes());
        hasher.update(snapshot.start_time.0.to_le_bytes());
        hasher.update(snapshot.end_time.0.to_le_bytes());
        hasher.update(snapshot.total_reward_funded.to_le_bytes());
        hasher.update(snapshot.reward_emitted.to_le_bytes());
        hasher.update(snapshot.closed_at.0.to_le_bytes());
        hasher.update(snapshot.prev_hash);

        let result = hasher.finalize();
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result);
        hash
    }

    /// Verify ids are contiguous from 1, every snapshot matches its epoch,
    /// accumulator values never decrease, and every hash links correctly.
    pub fn verify_chain(&self) -> Result<()> {
        let mut prev_hash = [0u8; 32];
        let mut prev_acc = 0u128;

        for (idx, snap) in self.snapshots.iter().enumerate() {
            let expected = EpochId(idx as u64 + 1);
            let broken = |reason: String| StakeError::SnapshotChainBroken {
                epoch_id: expected,
                reason,
            };

            if snap.epoch_id != expected {
                return Err(broken(format!("found {} in slot", snap.epoch_id)));
            }
            let epoch = self
                .epochs
                .get(idx)
                .ok_or_else(|| broken("snapshot without epoch".into()))?;
            if snap.end_time != epoch.end_time || snap.total_reward_funded != epoch.funded_reward
            {
                return Err(broken("snapshot does not match its epoch".into()));
            }
            if snap.acc_share_at_close < prev_acc {
                return Err(broken("accumulator decreased".into()));
            }
            if snap.prev_hash != prev_hash {
                return Err(broken("prev_hash does not link".into()));
            }
            if Self::compute_snapshot_hash(snap) != snap.snapshot_hash {
                return Err(broken(format!("hash mismatch {}", hex::encode(snap.snapshot_hash))));
            }

            prev_hash = snap.snapshot_hash;
            prev_acc = snap.acc_share_at_close;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: WindowLimits = WindowLimits {
        max_epoch_duration_secs: 10_000,
        max_lock_duration_secs: 1_000,
    };

    fn window(start: u64, end: u64) -> EpochWindow {
        EpochWindow::new(1000, Timestamp(start), Timestamp(end), 10)
    }

    fn open_and_close(ledger: &mut EpochLedger, start: u64, end: u64, acc: u128) {
        ledger.open(&window(start, end)).unwrap();
        ledger.record_close(acc, 900, Timestamp(end)).unwrap();
    }

    #[test]
    fn first_epoch_is_one() {
        let mut ledger = EpochLedger::new();
        assert_eq!(ledger.current_epoch_id(), EpochId::NONE);
        assert!(!ledger.is_active());
        let epoch = ledger.open(&window(0, 100)).unwrap();
        assert_eq!(epoch.id, EpochId(1));
        assert!(ledger.is_active());
    }

    #[test]
    fn rejects_inverted_and_past_windows() {
        let ledger = EpochLedger::new();
        let err = ledger
            .validate_window(&window(100, 100), Timestamp(0), LIMITS)
            .unwrap_err();
        assert!(matches!(err, StakeError::InvalidWindow { .. }));

        let err = ledger
            .validate_window(&window(50, 100), Timestamp(60), LIMITS)
            .unwrap_err();
        assert!(matches!(err, StakeError::InvalidWindow { .. }));

        assert!(
            ledger
                .validate_window(&window(60, 100), Timestamp(60), LIMITS)
                .is_ok()
        );
    }

    #[test]
    fn rejects_limits_and_oversized_reward() {
        let ledger = EpochLedger::new();
        let err = ledger
            .validate_window(&window(0, 20_000), Timestamp(0), LIMITS)
            .unwrap_err();
        assert!(matches!(err, StakeError::InvalidWindow { .. }));

        let mut long_lock = window(0, 100);
        long_lock.lock_duration_secs = 5_000;
        assert!(ledger.validate_window(&long_lock, Timestamp(0), LIMITS).is_err());

        let mut huge = window(0, 100);
        huge.funded_reward = u128::MAX / 2;
        let err = ledger.validate_window(&huge, Timestamp(0), LIMITS).unwrap_err();
        assert!(matches!(err, StakeError::RewardTooLarge { .. }));
    }

    #[test]
    fn reward_capacity_is_cumulative_across_epochs() {
        let capacity = u128::MAX / ACC_SHARE_SCALE;
        let mut ledger = EpochLedger::new();

        let mut first = window(0, 100);
        first.funded_reward = capacity / 2;
        ledger.validate_window(&first, Timestamp(0), LIMITS).unwrap();
        ledger.open(&first).unwrap();
        ledger.record_close(0, 0, Timestamp(100)).unwrap();

        // Fits on its own, but not on top of what is already funded.
        let mut second = window(200, 300);
        second.funded_reward = capacity / 2 + 2;
        let err = ledger
            .validate_window(&second, Timestamp(200), LIMITS)
            .unwrap_err();
        assert!(matches!(err, StakeError::RewardTooLarge { .. }));

        second.funded_reward = capacity - capacity / 2;
        ledger.validate_window(&second, Timestamp(200), LIMITS).unwrap();
    }

    #[test]
    fn cannot_open_while_active() {
        let mut ledger = EpochLedger::new();
        ledger.open(&window(0, 100)).unwrap();
        let err = ledger
            .validate_window(&window(200, 300), Timestamp(50), LIMITS)
            .unwrap_err();
        assert!(matches!(
            err,
            StakeError::EpochStillActive { epoch_id: EpochId(1), .. }
        ));
        assert!(ledger.open(&window(200, 300)).is_err());
    }

    #[test]
    fn close_records_snapshot_once() {
        let mut ledger = EpochLedger::new();
        ledger.open(&window(0, 100)).unwrap();
        assert!(ledger.elapsed_epoch(Timestamp(99)).is_none());
        assert!(ledger.elapsed_epoch(Timestamp(100)).is_some());

        let snap = ledger.record_close(42, 900, Timestamp(130)).unwrap();
        assert_eq!(snap.epoch_id, EpochId(1));
        assert_eq!(snap.acc_share_at_close, 42);
        assert_eq!(snap.reward_forfeited(), 100);
        assert!(!ledger.is_active());

        // No second snapshot without a new epoch.
        let err = ledger.record_close(43, 0, Timestamp(140)).unwrap_err();
        assert!(matches!(err, StakeError::NoActiveEpoch));
        assert_eq!(ledger.snapshot(EpochId(1)).unwrap().acc_share_at_close, 42);
    }

    #[test]
    fn snapshots_are_gapless_and_chained() {
        let mut ledger = EpochLedger::new();
        open_and_close(&mut ledger, 0, 100, 10);
        open_and_close(&mut ledger, 200, 300, 20);
        open_and_close(&mut ledger, 400, 500, 30);

        for id in 1..=3 {
            assert!(ledger.snapshot(EpochId(id)).is_some());
        }
        assert!(ledger.snapshot(EpochId(0)).is_none());
        assert!(ledger.snapshot(EpochId(4)).is_none());
        assert_eq!(
            ledger.snapshot(EpochId(2)).unwrap().prev_hash,
            ledger.snapshot(EpochId(1)).unwrap().snapshot_hash
        );
        ledger.verify_chain().unwrap();
        assert_eq!(ledger.total_funded(), 3000);
    }

    #[test]
    fn tampered_snapshot_detected() {
        let mut ledger = EpochLedger::new();
        open_and_close(&mut ledger, 0, 100, 10);
        open_and_close(&mut ledger, 200, 300, 20);

        let mut epochs = ledger.epochs().to_vec();
        let mut snapshots = ledger.snapshots().to_vec();
        snapshots[0].reward_emitted = 1;
        let err = EpochLedger::from_parts(epochs.clone(), snapshots).unwrap_err();
        assert!(matches!(err, StakeError::SnapshotChainBroken { .. }));

        // A missing intermediate snapshot is a gap.
        let mut gapped = ledger.snapshots().to_vec();
        gapped.remove(0);
        assert!(EpochLedger::from_parts(epochs.clone(), gapped).is_err());

        epochs.push(Epoch::from_window(EpochId(3), &window(400, 500)));
        let restored = EpochLedger::from_parts(epochs, ledger.snapshots().to_vec()).unwrap();
        assert!(restored.is_active());
        assert_eq!(restored.current_epoch_id(), EpochId(3));
    }

    #[test]
    fn snapshot_serde_roundtrip() {
        let mut ledger = EpochLedger::new();
        open_and_close(&mut ledger, 0, 100, 10);
        let snap = ledger.snapshot(EpochId(1)).unwrap();
        let json = serde_json::to_string(snap).unwrap();
        let back: ClosedEpochSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, snap);
    }
}
