//! The single consumer of `VelocityState`: one smoothing step and one
//! dispatch per tick.

use teleop_traits::Robot;

use crate::error::TeleopError;
use crate::hw_error::{Seam, map_hw_error};
use crate::state::VelocityState;
use crate::types::VelocityCommand;

#[derive(Debug, Clone)]
pub struct SmoothingLoop {
    alpha: f32,
    observe_state: bool,
    ticks: u64,
}

impl SmoothingLoop {
    pub fn new(alpha: f32, observe_state: bool) -> Self {
        Self {
            alpha,
            observe_state,
            ticks: 0,
        }
    }

    /// Ticks dispatched so far (successful or not).
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advance `current` toward `target` once and send the result.
    pub fn tick<R: Robot + ?Sized>(
        &mut self,
        state: &VelocityState,
        robot: &mut R,
    ) -> Result<VelocityCommand, TeleopError> {
        let cmd = state.read_and_advance(self.alpha).clamped();
        self.ticks += 1;
        robot
            .set_velocity(cmd.vx, cmd.vy, cmd.wz)
            .map_err(|e| map_hw_error(Seam::Robot, e.as_ref()))?;
        tracing::trace!(tick = self.ticks, vx = cmd.vx, vy = cmd.vy, wz = cmd.wz, "dispatch");
        if self.observe_state {
            match robot.get_state() {
                Ok(s) => tracing::trace!(cmd_vel_normalized = ?s.cmd_vel_normalized, moving = s.moving, "robot state"),
                Err(e) => tracing::debug!(error = %e, "robot state query failed"),
            }
        }
        Ok(cmd)
    }
}
