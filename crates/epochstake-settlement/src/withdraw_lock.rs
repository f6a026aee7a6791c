//! Epoch-aware withdraw lock.
//!
//! A deposit or renew locks the position for the current epoch's
//! `lock_duration_secs`. The lock only binds while the position is still in
//! the epoch it was locked in: once that epoch closes without further
//! action from the participant, the principal is free.

use epochstake_types::{Epoch, ParticipantPosition, Result, StakeError, Timestamp};

/// Lock rule evaluated against the open epoch.
pub struct WithdrawLock<'a> {
    epoch: &'a Epoch,
}

impl<'a> WithdrawLock<'a> {
    #[must_use]
    pub fn new(epoch: &'a Epoch) -> Self {
        Self { epoch }
    }

    /// When the position's lock expires, if it is locked in this epoch.
    #[must_use]
    pub fn unlocks_at(&self, position: &ParticipantPosition) -> Option<Timestamp> {
        (position.lock_epoch_id == self.epoch.id).then(|| {
            position
                .last_deposit_time
                .saturating_add(self.epoch.lock_duration_secs)
        })
    }

    /// Returns [`StakeError::LockActive`] while the lock holds.
    pub fn check_withdraw(&self, position: &ParticipantPosition, now: Timestamp) -> Result<()> {
        match self.unlocks_at(position) {
            Some(unlocks_at) if now < unlocks_at => Err(StakeError::LockActive { unlocks_at }),
            _ => Ok(()),
        }
    }
}
