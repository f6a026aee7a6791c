//! # epochstake-ledger
//!
//! **Ledger state**: the components that own the pool's mutable state.
//!
//! ## Architecture
//!
//! 1. **Clock**: injectable monotonic time source
//! 2. **AccrualEngine**: running reward-per-unit-principal accumulator,
//!    advanced lazily to `min(now, epoch.end)`
//! 3. **EpochLedger**: open/closed epoch lifecycle and the append-only,
//!    hash-chained snapshot arena
//! 4. **ParticipantRegistry**: participant identity → position
//!
//! None of these components call each other; the settlement engine
//! composes them and is the only place that decides ordering.

pub mod accrual;
pub mod clock;
pub mod epoch_ledger;
pub mod registry;

pub use accrual::{AccrualEngine, AccrualStep};
pub use clock::{Clock, ManualClock, SystemClock};
pub use epoch_ledger::{EpochLedger, WindowLimits};
pub use registry::ParticipantRegistry;
