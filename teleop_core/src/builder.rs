//! Type-state builder for `RunController`.
//!
//! The builder enforces at compile time that a Robot is provided before
//! `build()` is available. `try_build()` is always available for dynamic checks.

use std::marker::PhantomData;

use teleop_traits::Robot;
use teleop_traits::clock::{Clock, MonotonicClock};

use crate::config::{LoopCfg, ShutdownCfg};
use crate::error::{BuildError, Result};
use crate::runner::RunController;
use crate::smoothing::SmoothingLoop;
use crate::state::Session;
use crate::status::Phase;
use crate::types::VelocityCommand;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `RunController`. All fields are validated on `build()`.
pub struct RunBuilder<R> {
    robot: Option<Box<dyn Robot>>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    session: Option<Session>,
    loop_cfg: Option<LoopCfg>,
    shutdown: Option<ShutdownCfg>,
    _r: PhantomData<R>,
}

impl Default for RunBuilder<Missing> {
    fn default() -> Self {
        Self {
            robot: None,
            clock: None,
            session: None,
            loop_cfg: None,
            shutdown: None,
            _r: PhantomData,
        }
    }
}

/// Reject loop and shutdown settings the controller cannot run with.
fn validate(loop_cfg: &LoopCfg, shutdown: &ShutdownCfg) -> Result<()> {
    if !(loop_cfg.alpha > 0.0 && loop_cfg.alpha <= 1.0) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "alpha must be in (0, 1]",
        )));
    }
    if loop_cfg.tick_hz == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "tick_hz must be > 0",
        )));
    }
    if loop_cfg.poll_timeout.is_zero() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "poll_timeout must be > 0",
        )));
    }
    if shutdown.flush_ticks > 0 && shutdown.flush_interval.is_zero() {
        tracing::debug!("flush ticks are not spaced apart");
    }
    Ok(())
}

impl<R> RunBuilder<R> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<RunController> {
        let robot = self
            .robot
            .ok_or_else(|| eyre::Report::new(BuildError::MissingRobot))?;
        let loop_cfg = self.loop_cfg.unwrap_or_default();
        let shutdown = self.shutdown.unwrap_or_default();
        validate(&loop_cfg, &shutdown)?;

        let clock = self
            .clock
            .unwrap_or_else(|| Box::new(MonotonicClock::new()));

        Ok(RunController {
            robot,
            clock,
            session: self.session.unwrap_or_default(),
            smoothing: SmoothingLoop::new(loop_cfg.alpha, loop_cfg.observe_state),
            loop_cfg,
            shutdown,
            phase: Phase::Init,
            last_command: VelocityCommand::ZERO,
        })
    }
}

/// Chainable setters that do not affect type-state.
impl<R> RunBuilder<R> {
    pub fn with_loop(mut self, cfg: LoopCfg) -> Self {
        self.loop_cfg = Some(cfg);
        self
    }
    /// Override only the smoothing gain.
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        let mut cfg = self.loop_cfg.unwrap_or_default();
        cfg.alpha = alpha;
        self.loop_cfg = Some(cfg);
        self
    }
    pub fn with_shutdown(mut self, cfg: ShutdownCfg) -> Self {
        self.shutdown = Some(cfg);
        self
    }
    /// Share an existing session (e.g. one a signal handler already holds).
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }
    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
}

// Setter that advances type-state
impl RunBuilder<Missing> {
    pub fn with_robot(self, robot: impl Robot + 'static) -> RunBuilder<Set> {
        RunBuilder {
            robot: Some(Box::new(robot)),
            clock: self.clock,
            session: self.session,
            loop_cfg: self.loop_cfg,
            shutdown: self.shutdown,
            _r: PhantomData,
        }
    }
}

impl RunBuilder<Set> {
    /// Validate and build the controller. Only available once a Robot is set.
    pub fn build(self) -> Result<RunController> {
        self.try_build()
    }
}
