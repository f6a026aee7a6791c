//! The two assets a pool moves: staked principal and paid-out reward.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Asset class handled by the value-transfer collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Asset {
    /// The staked asset.
    Principal,
    /// The asset paid out as reward.
    Reward,
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Principal => write!(f, "PRINCIPAL"),
            Self::Reward => write!(f, "REWARD"),
        }
    }
}
