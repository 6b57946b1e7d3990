//! Common time/period helpers for teleop_core.

use std::time::Duration;

/// Number of microseconds in one second.
pub const MICROS_PER_SEC: u64 = 1_000_000;

/// Compute the period in microseconds for a given tick rate in Hz.
/// - Clamps `hz` to at least 1 to avoid division by zero.
/// - Ensures result is at least 1 microsecond.
#[inline]
pub fn period_us(hz: u32) -> u64 {
    (MICROS_PER_SEC / u64::from(hz.max(1))).max(1)
}

/// Tick period as a `Duration`.
#[inline]
pub fn tick_period(hz: u32) -> Duration {
    Duration::from_micros(period_us(hz))
}
