//! Injectable monotonic clocks.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use chrono::Utc;
use epochstake_types::Timestamp;

/// Monotonic time source consulted by every time comparison.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time in whole seconds, never running backwards.
///
/// If the system clock steps back, the last reading is repeated until the
/// wall clock catches up.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: AtomicU64,
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let wall = u64::try_from(Utc::now().timestamp()).unwrap_or(0);
        let prev = self.last.fetch_max(wall, Ordering::AcqRel);
        Timestamp(prev.max(wall))
    }
}

/// Manually driven clock for simulations and tests. Clones share the same
/// underlying time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    secs: Arc<AtomicU64>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: Timestamp) -> Self {
        Self {
            secs: Arc::new(AtomicU64::new(start.0)),
        }
    }

    /// Move forward by `secs`.
    pub fn advance(&self, secs: u64) -> Timestamp {
        let prev = self.secs.fetch_add(secs, Ordering::AcqRel);
        Timestamp(prev + secs)
    }

    /// Jump to `at`. Earlier instants are ignored.
    pub fn set(&self, at: Timestamp) {
        self.secs.fetch_max(at.0, Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.secs.load(Ordering::Acquire))
    }
}
