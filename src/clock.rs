//! Wall-clock sources for the engine.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use stopwatch_core::Timestamp;

/// Source of "now". Instants must be absolute so a persisted session can be
/// resumed by a later process.
pub trait Clock: Send {
    fn now(&self) -> Timestamp;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        // Millisecond granularity keeps persisted instants exact.
        // A system clock set before 1970 reads as the epoch.
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Timestamp::from_epoch_millis(since_epoch.as_millis() as u64)
    }
}

/// Manually driven clock. Clones share the same reading, so a test can keep
/// one handle while the engine owns another.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Arc<Mutex<Timestamp>>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, now: Timestamp) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now = *now + by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Timestamp::EPOCH)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::default();
        let handle = clock.clone();
        handle.advance(Duration::from_millis(1500));
        assert_eq!(clock.now().since_epoch(), Duration::from_millis(1500));

        handle.set(Timestamp::from_epoch(Duration::from_secs(10)));
        assert_eq!(clock.now().since_epoch(), Duration::from_secs(10));
    }

    #[test]
    fn test_system_clock_is_after_epoch() {
        let now = SystemClock.now();
        assert!(now > Timestamp::EPOCH);
        assert_eq!(now.since_epoch().subsec_nanos() % 1_000_000, 0);
    }
}
