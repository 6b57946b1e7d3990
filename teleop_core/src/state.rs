//! Shared target/current velocity record and the session context that owns it.
//!
//! Both triplets live behind one mutex so a reader never observes a
//! half-updated command: every write to the target and every smoothing step
//! happens as a single guarded unit.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::flag::RunFlag;
use crate::types::{Axis, VelocityCommand, clamp_unit};

#[derive(Debug, Default, Clone, Copy)]
struct Inner {
    target: VelocityCommand,
    current: VelocityCommand,
}

#[derive(Debug, Default)]
pub struct VelocityState {
    inner: Mutex<Inner>,
}

impl VelocityState {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn guard(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the guard cannot leave a torn triplet: every
        // critical section writes plain copies.
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Set one axis target, clamped to [-1, 1].
    pub fn set_target(&self, axis: Axis, value: f32) {
        let v = clamp_unit(value);
        self.guard().target.set(axis, v);
        tracing::debug!(%axis, value = v, "target set");
    }

    /// Replace all three targets at once.
    pub fn set_targets(&self, cmd: VelocityCommand) {
        let cmd = cmd.clamped();
        self.guard().target = cmd;
        tracing::debug!(vx = cmd.vx, vy = cmd.vy, wz = cmd.wz, "targets set");
    }

    pub fn zero_targets(&self) {
        self.set_targets(VelocityCommand::ZERO);
    }

    /// One low-pass step of `current` toward `target`; returns the new current.
    ///
    /// `current' = clamp(current + (target - current) * alpha)` per axis.
    pub fn read_and_advance(&self, alpha: f32) -> VelocityCommand {
        let mut g = self.guard();
        let target = g.target;
        let mut next = g.current;
        for axis in Axis::ALL {
            let cur = next.get(axis);
            next.set(axis, smooth(cur, target.get(axis), alpha));
        }
        g.current = next;
        next
    }

    /// Guarded copy of `(target, current)`.
    pub fn snapshot(&self) -> (VelocityCommand, VelocityCommand) {
        let g = self.guard();
        (g.target, g.current)
    }

    pub fn target(&self) -> VelocityCommand {
        self.guard().target
    }

    pub fn current(&self) -> VelocityCommand {
        self.guard().current
    }
}

/// Exponential smoothing step, clamped to the command range.
#[inline]
pub fn smooth(current: f32, target: f32, alpha: f32) -> f32 {
    clamp_unit(current + (target - current) * alpha)
}

/// Per-run context: the velocity record and the run flag, shared by every
/// component of one teleop session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub state: Arc<VelocityState>,
    pub flag: Arc<RunFlag>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_matches_reference_scenario() {
        let s = VelocityState::new();
        s.set_target(Axis::Vx, 0.7);
        let c = s.read_and_advance(0.15);
        assert!((c.vx - 0.105).abs() < 1e-6, "vx = {}", c.vx);
        assert_eq!(c.vy, 0.0);
        assert_eq!(c.wz, 0.0);
    }

    #[test]
    fn set_target_clamps() {
        let s = VelocityState::new();
        s.set_target(Axis::Wz, -4.0);
        s.set_target(Axis::Vy, f32::NAN);
        let (t, c) = s.snapshot();
        assert_eq!(t.wz, -1.0);
        assert_eq!(t.vy, 0.0);
        assert!(c.is_zero());
    }

    #[test]
    fn session_clones_share_state() {
        let a = Session::new();
        let b = a.clone();
        a.state.set_target(Axis::Vx, 0.3);
        assert_eq!(b.state.target().vx, 0.3);
    }
}
