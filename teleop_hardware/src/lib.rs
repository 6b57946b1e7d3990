pub mod error;
pub mod keys;
#[cfg(unix)]
pub mod terminal;

pub use keys::CrosstermKeys;
#[cfg(unix)]
pub use terminal::{StdinChars, StdinTerminal, TermiosSnapshot};

use teleop_traits::{BoxError, Robot, RobotState};

use crate::error::HwError;

/// Simulated motion controller.
///
/// Accepts commands, reports them back through `get_state`, and refuses
/// commands after `stop()`. It does not model robot dynamics.
#[derive(Debug, Default)]
pub struct SimulatedRobot {
    cmd: [f32; 3],
    stopped: bool,
    accepted: u64,
    fail_after: Option<u64>,
}

impl SimulatedRobot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `set_velocity` fail once `n` commands have been accepted.
    pub fn fail_after(mut self, n: u64) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Number of commands accepted so far.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl Robot for SimulatedRobot {
    fn set_velocity(&mut self, vx: f32, vy: f32, wz: f32) -> Result<(), BoxError> {
        if self.stopped {
            return Err(Box::new(HwError::Robot("command after stop".into())));
        }
        if self.fail_after.is_some_and(|n| self.accepted >= n) {
            tracing::error!(accepted = self.accepted, "simulated controller fault");
            return Err(Box::new(HwError::Robot("simulated controller fault".into())));
        }
        self.cmd = [vx, vy, wz];
        self.accepted += 1;
        tracing::trace!(vx, vy, wz, "sim robot command");
        Ok(())
    }

    fn get_state(&self) -> Result<RobotState, BoxError> {
        Ok(RobotState {
            cmd_vel_normalized: self.cmd,
            moving: !self.stopped && self.cmd.iter().any(|v| *v != 0.0),
        })
    }

    fn stop(&mut self) -> Result<(), BoxError> {
        if !self.stopped {
            tracing::info!(accepted = self.accepted, "sim robot stopped");
        }
        self.stopped = true;
        self.cmd = [0.0; 3];
        Ok(())
    }
}
