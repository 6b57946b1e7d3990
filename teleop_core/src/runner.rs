use std::time::{Duration, Instant};

use teleop_traits::{Clock, Robot};

use crate::bindings::Command;
use crate::builder::{Missing, RunBuilder};
use crate::config::{LoopCfg, ShutdownCfg};
use crate::error::{Result, TeleopError};
use crate::flag::StopCause;
use crate::hw_error::{Seam, map_hw_error};
use crate::input::{InputSource, Poll};
use crate::smoothing::SmoothingLoop;
use crate::state::Session;
use crate::status::Phase;
use crate::types::VelocityCommand;
use crate::util::tick_period;

/// Summary of a session that reached `Stopped` without error.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Backend that produced input.
    pub backend: &'static str,
    /// Why the session stopped running.
    pub cause: StopCause,
    /// Ticks dispatched while running.
    pub ticks: u64,
    /// Zero-target ticks dispatched while draining.
    pub flush_ticks: u32,
    /// A new interrupt cut the flush short.
    pub flush_interrupted: bool,
    /// Last command sent to the robot.
    pub last_command: VelocityCommand,
}

#[derive(Debug, Default)]
struct Flush {
    ticks: u32,
    interrupted: bool,
}

/// Apply one input command to the session.
pub fn apply_command(session: &Session, cmd: Command) {
    let state = &session.state;
    match cmd {
        Command::SetAxis(axis, v) => state.set_target(axis, v),
        Command::Halt => state.zero_targets(),
        Command::Quit => {
            state.zero_targets();
            session.flag.request_stop(StopCause::Quit);
        }
        Command::Interrupt => session.flag.interrupt(),
    }
}

/// Drives one teleop session: fixed-rate smoothing ticks while running, a
/// bounded zero-target flush while draining, then exactly one `stop()`.
pub struct RunController {
    pub(crate) robot: Box<dyn Robot>,
    pub(crate) clock: Box<dyn Clock + Send + Sync>,
    pub(crate) session: Session,
    pub(crate) smoothing: SmoothingLoop,
    pub(crate) loop_cfg: LoopCfg,
    pub(crate) shutdown: ShutdownCfg,
    pub(crate) phase: Phase,
    pub(crate) last_command: VelocityCommand,
}

impl core::fmt::Debug for RunController {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RunController")
            .field("phase", &self.phase)
            .field("loop_cfg", &self.loop_cfg)
            .field("shutdown", &self.shutdown)
            .field("ticks", &self.smoothing.ticks())
            .finish()
    }
}

impl RunController {
    /// Start building a controller.
    pub fn builder() -> RunBuilder<Missing> {
        RunBuilder::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Shared state and run flag; clone it into signal handlers.
    pub fn session(&self) -> &Session {
        &self.session
    }

    fn enter(&mut self, next: Phase) {
        debug_assert!(
            self.phase.can_enter(next),
            "illegal phase transition {:?} -> {:?}",
            self.phase,
            next
        );
        tracing::info!(from = self.phase.name(), to = next.name(), "phase");
        self.phase = next;
    }

    /// Run the session to completion.
    ///
    /// `Robot::stop` is called exactly once on every path that reaches
    /// `Draining`. Errors, by precedence: robot fault while running, robot
    /// stop failure, input backend release failure.
    pub fn run<I: InputSource>(&mut self, mut input: I) -> Result<RunReport> {
        if self.phase != Phase::Init {
            return Err(TeleopError::State(format!(
                "session already {}",
                self.phase.name()
            ))
            .into());
        }
        let backend = input.name();
        self.enter(Phase::Running);
        tracing::info!(
            backend,
            alpha = self.loop_cfg.alpha,
            tick_hz = self.loop_cfg.tick_hz,
            "teleop running"
        );

        let fault = self.run_loop(&mut input);
        let ticks = self.smoothing.ticks();
        let cause = self.session.flag.cause().unwrap_or(StopCause::InputClosed);

        self.enter(Phase::Draining);
        // Interrupts counted from here on cut the flush short, including
        // ones that land while the backend is being released.
        let mark = self.session.flag.interrupts();
        let released = input.finish();
        if let Err(e) = &released {
            tracing::error!(error = %e, "input backend release failed");
        }
        drop(input);
        let flush = self.flush(mark);

        self.enter(Phase::Stopped);
        let stopped = self
            .robot
            .stop()
            .map_err(|e| map_hw_error(Seam::Robot, e.as_ref()));
        match &stopped {
            Ok(()) => tracing::info!(
                cause = cause.name(),
                ticks,
                flush_ticks = flush.ticks,
                "robot stopped"
            ),
            Err(e) => tracing::error!(error = %e, "robot stop failed"),
        }

        if let Some(e) = fault {
            return Err(e.into());
        }
        stopped?;
        released?;
        Ok(RunReport {
            backend,
            cause,
            ticks,
            flush_ticks: flush.ticks,
            flush_interrupted: flush.interrupted,
            last_command: self.last_command,
        })
    }

    /// End a session that never got an input source: no ticks, no flush,
    /// one `stop()`.
    pub fn abort(&mut self) -> Result<()> {
        if self.phase != Phase::Init {
            return Err(TeleopError::State(format!(
                "cannot abort a session that is {}",
                self.phase.name()
            ))
            .into());
        }
        self.enter(Phase::Stopped);
        self.robot
            .stop()
            .map_err(|e| map_hw_error(Seam::Robot, e.as_ref()))?;
        tracing::info!("robot stopped before input was ready");
        Ok(())
    }

    /// Tick at `tick_hz` and apply input in between, until the flag clears.
    /// Returns the robot fault that ended the loop, if any.
    fn run_loop<I: InputSource>(&mut self, input: &mut I) -> Option<TeleopError> {
        let period = tick_period(self.loop_cfg.tick_hz);
        let flag = self.session.flag.clone();
        let mut next_tick = self.clock.now();

        while flag.is_running() {
            let now = self.clock.now();
            if now >= next_tick {
                match self
                    .smoothing
                    .tick(&self.session.state, self.robot.as_mut())
                {
                    Ok(cmd) => self.last_command = cmd,
                    Err(e) => {
                        tracing::error!(error = %e, "dispatch failed; ending session");
                        flag.request_stop(StopCause::RobotFault);
                        return Some(e);
                    }
                }
                next_tick = advance_deadline(next_tick, now, period);
            }

            let wait = next_tick
                .saturating_duration_since(self.clock.now())
                .min(self.loop_cfg.poll_timeout);
            match input.poll_next(wait) {
                Ok(Poll::Command(cmd)) => apply_command(&self.session, cmd),
                Ok(Poll::Idle) => {}
                Ok(Poll::Closed) => {
                    flag.request_stop(StopCause::InputClosed);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "input failed; treating as end of input");
                    flag.request_stop(StopCause::InputClosed);
                }
            }
        }
        None
    }

    /// Zero the targets and decay toward rest over a bounded number of ticks.
    /// Stops early once the interrupt count rises above `mark`.
    fn flush(&mut self, mark: u32) -> Flush {
        let flag = self.session.flag.clone();
        self.session.state.zero_targets();
        let n = self.shutdown.flush_ticks;
        let mut out = Flush::default();

        for i in 0..n {
            if flag.interrupts() > mark {
                tracing::warn!(remaining = n - i, "flush interrupted");
                out.interrupted = true;
                break;
            }
            match self
                .smoothing
                .tick(&self.session.state, self.robot.as_mut())
            {
                Ok(cmd) => {
                    self.last_command = cmd;
                    out.ticks += 1;
                }
                Err(e) => {
                    tracing::warn!(error = %e, remaining = n - i, "flush dispatch failed; skipping to stop");
                    break;
                }
            }
            if i + 1 < n {
                self.clock.sleep(self.shutdown.flush_interval);
            }
        }
        out
    }
}

/// Next tick deadline. A deadline that has already passed again (overrun)
/// is re-anchored on `now`, so missed ticks are skipped rather than burst.
#[inline]
fn advance_deadline(deadline: Instant, now: Instant, period: Duration) -> Instant {
    let next = deadline + period;
    if next <= now {
        tracing::debug!(
            behind_us = now.saturating_duration_since(next).as_micros() as u64,
            "tick overrun"
        );
        now + period
    } else {
        next
    }
}
