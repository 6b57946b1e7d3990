//! Runtime configuration for the run controller.
//!
//! Separate from the TOML schema in `teleop_config`; see `conversions`.

use std::time::Duration;

use crate::poller::DEFAULT_POLL_TIMEOUT;

/// Smoothing and dispatch pacing.
#[derive(Debug, Clone, Copy)]
pub struct LoopCfg {
    /// Exponential smoothing gain, (0.0, 1.0].
    pub alpha: f32,
    /// Dispatch rate.
    pub tick_hz: u32,
    /// Upper bound on one wait for input.
    pub poll_timeout: Duration,
    /// Query `Robot::get_state` after each dispatch.
    pub observe_state: bool,
}

impl Default for LoopCfg {
    fn default() -> Self {
        Self {
            alpha: 0.15,
            tick_hz: 50,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            observe_state: true,
        }
    }
}

/// Shutdown flush: zero-target ticks dispatched before `stop()`.
#[derive(Debug, Clone, Copy)]
pub struct ShutdownCfg {
    pub flush_ticks: u32,
    pub flush_interval: Duration,
}

impl Default for ShutdownCfg {
    fn default() -> Self {
        Self {
            flush_ticks: 10,
            flush_interval: Duration::from_millis(20),
        }
    }
}
