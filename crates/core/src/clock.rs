// SPDX-License-Identifier: MIT

//! Clock abstraction for testable time handling.
//!
//! Session records store `last_active`/`created_at` as whole seconds since
//! the Unix epoch (§3), while the Gateway's long-poll loop and the Reaper's
//! tick loop need a monotonic clock for deadlines. [`Clock`] provides both
//! so that state-machine tests can advance time deterministically instead
//! of sleeping in real time.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// A clock that provides the current time.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Monotonic instant, used for measuring elapsed durations (long-poll
    /// and watch deadlines).
    fn now(&self) -> Instant;

    /// Whole seconds since the Unix epoch, used for `last_active`/
    /// `created_at` fields persisted to the session record.
    fn unix_time_secs(&self) -> u64;
}

/// Real system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn unix_time_secs(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
    }
}

/// Fake clock for testing with controllable time.
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone)]
pub struct FakeClock {
    current: std::sync::Arc<parking_lot::Mutex<Instant>>,
    unix_secs: std::sync::Arc<parking_lot::Mutex<u64>>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeClock {
    pub fn new() -> Self {
        Self {
            current: std::sync::Arc::new(parking_lot::Mutex::new(Instant::now())),
            unix_secs: std::sync::Arc::new(parking_lot::Mutex::new(1_700_000_000)),
        }
    }

    /// Advance the clock by the given duration.
    pub fn advance(&self, duration: Duration) {
        *self.current.lock() += duration;
        *self.unix_secs.lock() += duration.as_secs();
    }

    /// Set the Unix-epoch-seconds value directly (e.g. to simulate a record
    /// written far in the past).
    pub fn set_unix_time_secs(&self, secs: u64) {
        *self.unix_secs.lock() = secs;
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.current.lock()
    }

    fn unix_time_secs(&self) -> u64 {
        *self.unix_secs.lock()
    }
}
