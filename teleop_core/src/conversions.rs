//! `From` implementations bridging `teleop_config` types to `teleop_core` types.

use std::time::Duration;

use crate::bindings::KeyMap;
use crate::config::{LoopCfg, ShutdownCfg};
use crate::types::Scales;

// ── Scales ───────────────────────────────────────────────────────────────────

impl From<&teleop_config::Scales> for Scales {
    fn from(c: &teleop_config::Scales) -> Self {
        Self {
            vx: c.vx,
            vy: c.vy,
            wz: c.wz,
        }
    }
}

// ── LoopCfg ──────────────────────────────────────────────────────────────────

impl From<&teleop_config::Config> for LoopCfg {
    fn from(c: &teleop_config::Config) -> Self {
        Self {
            alpha: c.smoothing.alpha,
            tick_hz: c.control_loop.tick_hz,
            poll_timeout: Duration::from_millis(c.control_loop.poll_timeout_ms),
            observe_state: c.control_loop.observe_state,
        }
    }
}

// ── ShutdownCfg ──────────────────────────────────────────────────────────────

impl From<&teleop_config::ShutdownCfg> for ShutdownCfg {
    fn from(c: &teleop_config::ShutdownCfg) -> Self {
        Self {
            flush_ticks: c.flush_ticks,
            flush_interval: Duration::from_millis(c.flush_interval_ms),
        }
    }
}

// ── KeyMap ───────────────────────────────────────────────────────────────────

impl From<&teleop_config::KeysCfg> for KeyMap {
    fn from(c: &teleop_config::KeysCfg) -> Self {
        Self {
            forward: c.forward,
            back: c.back,
            yaw_left: c.yaw_left,
            yaw_right: c.yaw_right,
            strafe_left: c.strafe_left,
            strafe_right: c.strafe_right,
            halt: c.halt,
        }
        .normalized()
    }
}
