//! Persisted pool layout.
//!
//! One pool row, the epoch table, the append-only snapshot table and the
//! position table keyed by participant. Serialized as JSON; positions use
//! a `BTreeMap` so the same state always encodes to the same bytes.

use std::collections::BTreeMap;

use epochstake_types::{ClosedEpochSnapshot, Epoch, ParticipantId, ParticipantPosition, PoolRow, Result};
use serde::{Deserialize, Serialize};

use crate::reward_conservation::RewardConservation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub pool: PoolRow,
    pub epochs: Vec<Epoch>,
    pub snapshots: Vec<ClosedEpochSnapshot>,
    pub positions: BTreeMap<ParticipantId, ParticipantPosition>,
    /// Reward emitted so far in the open epoch.
    pub reward_emitted_in_epoch: u128,
    pub reward_emitted_total: u128,
    pub totals: RewardConservation,
}

impl PersistedState {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
