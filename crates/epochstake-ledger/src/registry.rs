//! Participant registry.
//!
//! A plain map from participant identity to position. Unseen identities
//! read as the default position (principal 0, checkpoint epoch 0). No
//! business logic lives here.

use std::collections::HashMap;

use epochstake_types::{ParticipantId, ParticipantPosition};

/// Stores every position ever written. Positions are never removed.
#[derive(Debug, Clone, Default)]
pub struct ParticipantRegistry {
    positions: HashMap<ParticipantId, ParticipantPosition>,
}

impl ParticipantRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored position, or the default for an unseen participant.
    #[must_use]
    pub fn position(&self, participant: ParticipantId) -> ParticipantPosition {
        self.positions
            .get(&participant)
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn contains(&self, participant: ParticipantId) -> bool {
        self.positions.contains_key(&participant)
    }

    /// Insert or replace a position.
    pub fn upsert(&mut self, participant: ParticipantId, position: ParticipantPosition) {
        self.positions.insert(participant, position);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantId, &ParticipantPosition)> {
        self.positions.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Sum of principal across all positions.
    #[must_use]
    pub fn total_principal(&self) -> u128 {
        self.positions
            .values()
            .fold(0u128, |acc, p| acc.saturating_add(p.principal))
    }
}

impl FromIterator<(ParticipantId, ParticipantPosition)> for ParticipantRegistry {
    fn from_iter<I: IntoIterator<Item = (ParticipantId, ParticipantPosition)>>(iter: I) -> Self {
        Self {
            positions: iter.into_iter().collect(),
        }
    }
}
