//! Settlement outcomes returned by the participant operations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{EpochId, ParticipantId, Timestamp};

/// Which operation produced a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettlementKind {
    Deposit,
    Withdraw,
    Renew,
    Claim,
}

impl fmt::Display for SettlementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deposit => write!(f, "DEPOSIT"),
            Self::Withdraw => write!(f, "WITHDRAW"),
            Self::Renew => write!(f, "RENEW"),
            Self::Claim => write!(f, "CLAIM"),
        }
    }
}

/// What a committed operation moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub kind: SettlementKind,
    pub participant: ParticipantId,
    /// The epoch the position is checkpointed in after the operation.
    pub epoch_id: EpochId,
    /// Reward credited to the participant.
    pub reward_paid: u128,
    /// Principal debited (deposit) or credited (withdraw).
    pub principal_moved: u128,
    /// Principal remaining in the position.
    pub principal_after: u128,
    pub settled_at: Timestamp,
}
