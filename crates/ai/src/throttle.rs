//! Request throttling between batch items.
//!
//! The interval between item starts is `max(100ms, 60s / rpm)`. The wait
//! actually applied after an item is the interval minus the time the item's
//! own service calls took, so slow calls shrink the next wait instead of
//! stacking delay on top of it.

use std::num::NonZeroU32;
use std::time::Duration;

/// Lower bound on the throttle interval, however high the configured rate.
pub const MIN_THROTTLE_INTERVAL: Duration = Duration::from_millis(100);

/// Interval between consecutive item starts for `rpm` requests per minute.
pub fn throttle_interval(rpm: NonZeroU32) -> Duration {
    (Duration::from_secs(60) / rpm.get()).max(MIN_THROTTLE_INTERVAL)
}

/// Per-run throttle, fixed for the duration of a batch.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Throttle {
    interval: Duration,
}

impl Throttle {
    pub fn new(rpm: NonZeroU32) -> Self {
        Self {
            interval: throttle_interval(rpm),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Remaining wait after an item whose service calls took `elapsed`.
    ///
    /// Always within `[0, interval]`.
    pub fn wait_after(&self, elapsed: Duration) -> Duration {
        self.interval.saturating_sub(elapsed)
    }
}
