//! System-wide constants for the EpochStake ledger.

/// Fixed-point scale applied to the reward-per-unit-principal accumulator.
///
/// The reward funded across all epochs, times this scale, must fit in a
/// `u128`; `open_epoch` rejects budgets that would not.
pub const ACC_SHARE_SCALE: u128 = 1_000_000_000_000;

/// Default minimum deposit, in the smallest principal unit.
pub const DEFAULT_MIN_DEPOSIT: u128 = 1;

/// Seconds in one (non-leap) year.
pub const SECONDS_PER_YEAR: u64 = 365 * 24 * 60 * 60;

/// Default upper bound for an epoch's lock duration.
pub const DEFAULT_MAX_LOCK_DURATION_SECS: u64 = SECONDS_PER_YEAR;

/// Default upper bound for an epoch's length.
pub const DEFAULT_MAX_EPOCH_DURATION_SECS: u64 = SECONDS_PER_YEAR;

/// Domain separator for the closed-epoch snapshot hash chain.
pub const SNAPSHOT_HASH_DOMAIN: &[u8] = b"epochstake:snapshot:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "EpochStake";
