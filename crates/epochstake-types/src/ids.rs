//! Identifiers and time values used throughout EpochStake.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// ParticipantId
// ---------------------------------------------------------------------------

/// Unique identifier for a staking participant. Uses UUIDv7 for
/// time-ordered sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ParticipantId(pub Uuid);

impl ParticipantId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for ParticipantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EpochId
// ---------------------------------------------------------------------------

/// Monotonically increasing identifier for a funded epoch.
///
/// `EpochId(0)` means "no epoch has ever been opened"; the first epoch
/// opened is `EpochId(1)`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
pub struct EpochId(pub u64);

impl EpochId {
    /// Sentinel for "unset".
    pub const NONE: Self = Self(0);

    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    #[must_use]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for EpochId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

/// A point in time, in whole seconds since the UNIX epoch.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// `self + secs`, clamped at `u64::MAX`.
    #[must_use]
    pub fn saturating_add(self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// Seconds elapsed from `earlier` to `self` (zero if `earlier` is later).
    #[must_use]
    pub fn secs_since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Convert to a UTC date-time, if representable.
    #[must_use]
    pub fn as_datetime(self) -> Option<DateTime<Utc>> {
        i64::try_from(self.0)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "{}s", self.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_id_uniqueness() {
        let a = ParticipantId::new();
        let b = ParticipantId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn epoch_id_next_and_none() {
        assert!(EpochId::NONE.is_none());
        assert_eq!(EpochId::NONE.next(), EpochId(1));
        assert!(!EpochId(1).is_none());
        assert_eq!(format!("{}", EpochId(7)), "epoch:7");
    }

    #[test]
    fn timestamp_arithmetic() {
        let t = Timestamp(100);
        assert_eq!(t.saturating_add(50), Timestamp(150));
        assert_eq!(Timestamp(150).secs_since(t), 50);
        assert_eq!(t.secs_since(Timestamp(150)), 0);
        assert_eq!(Timestamp(u64::MAX).saturating_add(1), Timestamp(u64::MAX));
    }

    #[test]
    fn timestamp_display_is_rfc3339() {
        let t = Timestamp(0);
        assert_eq!(format!("{t}"), "1970-01-01T00:00:00+00:00");
        assert_eq!(format!("{}", Timestamp(u64::MAX)), format!("{}s", u64::MAX));
    }

    #[test]
    fn participant_id_serde() {
        let id = ParticipantId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: ParticipantId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
