//! Error types for the EpochStake ledger.
//!
//! All errors use the `ES_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Epoch errors
//! - 2xx: Position errors
//! - 3xx: Value transfer errors
//! - 8xx: Invariant / arithmetic errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{Asset, EpochId, ParticipantId, Timestamp};

/// Failure reported by the value-transfer collaborator.
///
/// A failed transfer has moved nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// The debited account does not hold enough of the asset.
    #[error("insufficient {asset} funds for {participant}: need {needed}, have {available}")]
    InsufficientFunds {
        participant: ParticipantId,
        asset: Asset,
        needed: u128,
        available: u128,
    },

    /// The transfer was refused by the backing ledger.
    #[error("transfer rejected: {reason}")]
    Rejected { reason: String },
}

/// Central error enum for all EpochStake operations.
#[derive(Debug, Error)]
pub enum StakeError {
    // =================================================================
    // Epoch Errors (1xx)
    // =================================================================
    /// The requested epoch window or parameters are unusable.
    #[error("ES_ERR_100: Invalid epoch window: {reason}")]
    InvalidWindow { reason: String },

    /// A new epoch was requested before the current one ended.
    #[error("ES_ERR_101: {epoch_id} still active until {ends_at}")]
    EpochStillActive { epoch_id: EpochId, ends_at: Timestamp },

    /// No epoch is currently accepting this operation.
    #[error("ES_ERR_102: No active epoch")]
    NoActiveEpoch,

    /// The funded reward is too large for the fixed-point accumulator.
    #[error("ES_ERR_103: Funded reward {funded} exceeds accumulator capacity")]
    RewardTooLarge { funded: u128 },

    // =================================================================
    // Position Errors (2xx)
    // =================================================================
    /// The position carries principal from a closed epoch and must be
    /// renewed or withdrawn before new principal is added.
    #[error("ES_ERR_200: Stale position: checkpoint {checkpoint}, current {current}")]
    StalePosition {
        checkpoint: EpochId,
        current: EpochId,
    },

    /// Renew was called on a position without principal.
    #[error("ES_ERR_201: Nothing to renew")]
    NothingToRenew,

    /// Withdrawal larger than the staked principal.
    #[error("ES_ERR_202: Insufficient principal: requested {requested}, staked {staked}")]
    InsufficientPrincipal { requested: u128, staked: u128 },

    /// The position is still inside its lock window.
    #[error("ES_ERR_203: Position locked until {unlocks_at}")]
    LockActive { unlocks_at: Timestamp },

    /// Zero or below-minimum amount.
    #[error("ES_ERR_204: Invalid amount {amount}: {reason}")]
    InvalidAmount { amount: u128, reason: String },

    // =================================================================
    // Transfer Errors (3xx)
    // =================================================================
    /// The value-transfer collaborator refused the operation.
    #[error("ES_ERR_300: Transfer failed: {0}")]
    Transfer(#[from] TransferError),

    // =================================================================
    // Invariant / Arithmetic Errors (8xx)
    // =================================================================
    /// Checked arithmetic overflowed.
    #[error("ES_ERR_800: Arithmetic overflow in {context}")]
    ArithmeticOverflow { context: &'static str },

    /// Reward conservation violated — critical safety alert.
    #[error("ES_ERR_801: Reward invariant violation: {reason}")]
    RewardInvariantViolation { reason: String },

    /// Principal custody does not match recorded deposits and withdrawals.
    #[error("ES_ERR_802: Principal invariant violation: {reason}")]
    PrincipalInvariantViolation { reason: String },

    /// The closed-epoch snapshot chain has a gap, a duplicate or a bad hash.
    #[error("ES_ERR_803: Snapshot chain broken at {epoch_id}: {reason}")]
    SnapshotChainBroken { epoch_id: EpochId, reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("ES_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("ES_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("ES_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, StakeError>;

impl From<serde_json::Error> for StakeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
