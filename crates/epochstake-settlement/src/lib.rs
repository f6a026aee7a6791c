//! # epochstake-settlement
//!
//! **Settlement plane**: the participant-facing operations of a staking
//! pool and the checks that keep its books balanced.
//!
//! ## Architecture
//!
//! [`SettlementEngine`] composes the ledger components and, for every
//! deposit, withdraw, renew or claim:
//! 1. Closes the open epoch if its end has passed
//! 2. Advances the accumulator to `min(now, epoch.end)`
//! 3. Checks stale-position and withdraw-lock rules
//! 4. Moves value through the [`ValueTransfer`] collaborator
//! 5. Commits the position and records conservation totals
//!
//! ## Multi-epoch catch-up
//!
//! A participant who sat out any number of epochs settles in O(1): the
//! accumulator is pool-wide and never resets, so the difference from the
//! position's checkpoint already spans every epoch in between.

pub mod engine;
pub mod reward_conservation;
pub mod shared;
pub mod state;
pub mod transfer;
pub mod withdraw_lock;

pub use engine::SettlementEngine;
pub use reward_conservation::RewardConservation;
pub use shared::SharedEngine;
pub use state::PersistedState;
pub use transfer::{InMemoryBank, ValueTransfer};
pub use withdraw_lock::WithdrawLock;
