//! Thread-safe handle to a settlement engine.
//!
//! Every operation takes the pool lock for its full duration, so
//! accumulator advancement and the position update it feeds are never
//! interleaved with another participant's operation.

use std::sync::Arc;

use epochstake_ledger::Clock;
use epochstake_types::{EpochId, ParticipantId, PoolRow, Result, Settlement, Timestamp};
use parking_lot::Mutex;

use crate::engine::SettlementEngine;
use crate::transfer::ValueTransfer;

pub struct SharedEngine<C, T> {
    inner: Arc<Mutex<SettlementEngine<C, T>>>,
}

impl<C, T> Clone for SharedEngine<C, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Clock, T: ValueTransfer> SharedEngine<C, T> {
    #[must_use]
    pub fn new(engine: SettlementEngine<C, T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    pub fn open_epoch(
        &self,
        funded_reward: u128,
        start_time: Timestamp,
        end_time: Timestamp,
        lock_duration_secs: u64,
    ) -> Result<EpochId> {
        self.inner
            .lock()
            .open_epoch(funded_reward, start_time, end_time, lock_duration_secs)
    }

    pub fn deposit(&self, participant: ParticipantId, amount: u128) -> Result<Settlement> {
        self.inner.lock().deposit(participant, amount)
    }

    pub fn withdraw(&self, participant: ParticipantId, amount: u128) -> Result<Settlement> {
        self.inner.lock().withdraw(participant, amount)
    }

    pub fn renew(&self, participant: ParticipantId) -> Result<Settlement> {
        self.inner.lock().renew(participant)
    }

    pub fn claim(&self, participant: ParticipantId) -> Result<Settlement> {
        self.inner.lock().claim(participant)
    }

    pub fn pending_reward(&self, participant: ParticipantId) -> Result<u128> {
        self.inner.lock().pending_reward(participant)
    }

    #[must_use]
    pub fn pool_row(&self) -> PoolRow {
        self.inner.lock().pool_row()
    }

    /// Run `f` against the engine under the lock.
    pub fn with<R>(&self, f: impl FnOnce(&SettlementEngine<C, T>) -> R) -> R {
        f(&self.inner.lock())
    }
}
