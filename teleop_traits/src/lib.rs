pub mod clock;
pub mod input;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use input::{ByteRead, CharStream, Key, KeyEdge, KeyEventService, Terminal};

/// Boxed error used at every hardware seam.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Read-only view of the motion controller, as reported by `Robot::get_state`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RobotState {
    /// Last command accepted by the controller, normalized to [-1, 1] per axis.
    pub cmd_vel_normalized: [f32; 3],
    /// Whether the controller is currently executing motion.
    pub moving: bool,
}

/// Motion controller consumed by the teleop loop.
///
/// Arguments to `set_velocity` are pre-clamped to [-1, 1]. Implementations
/// must not block longer than one control tick under normal operation.
pub trait Robot {
    fn set_velocity(&mut self, vx: f32, vy: f32, wz: f32) -> Result<(), BoxError>;
    fn get_state(&self) -> Result<RobotState, BoxError>;
    fn stop(&mut self) -> Result<(), BoxError>;
}

impl<R: Robot + ?Sized> Robot for Box<R> {
    fn set_velocity(&mut self, vx: f32, vy: f32, wz: f32) -> Result<(), BoxError> {
        (**self).set_velocity(vx, vy, wz)
    }
    fn get_state(&self) -> Result<RobotState, BoxError> {
        (**self).get_state()
    }
    fn stop(&mut self) -> Result<(), BoxError> {
        (**self).stop()
    }
}
