//! Test and helper mocks for teleop_core
//!
//! Every mock keeps its observable record behind an `Arc`, so a test can hand
//! a clone to the code under test and inspect the original afterwards.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use teleop_traits::{
    BoxError, ByteRead, CharStream, Clock, KeyEdge, KeyEventService, Robot, RobotState, Terminal,
};

use crate::bindings::Command;
use crate::error::Result;
use crate::input::{InputSource, Poll};
use crate::types::VelocityCommand;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}

// ── Robot ────────────────────────────────────────────────────────────────────

/// Everything a `RecordingRobot` has been asked to do.
#[derive(Debug, Default, Clone)]
pub struct RobotLog {
    /// Accepted `set_velocity` arguments, in order.
    pub commands: Vec<VelocityCommand>,
    /// `set_velocity` calls, accepted or rejected.
    pub calls: usize,
    pub stops: u32,
    /// `set_velocity` calls that arrived after `stop`.
    pub after_stop: u32,
}

type Hook = Box<dyn FnMut(usize) + Send>;

/// Robot that records every call. Optionally rejects commands from the Nth
/// call on, and runs a hook after each call (index is 0-based).
#[derive(Clone, Default)]
pub struct RecordingRobot {
    log: Arc<Mutex<RobotLog>>,
    fail_from: Option<usize>,
    fail_stop: bool,
    hook: Arc<Mutex<Option<Hook>>>,
}

impl RecordingRobot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every `set_velocity` call with index >= `n`.
    pub fn failing_from(mut self, n: usize) -> Self {
        self.fail_from = Some(n);
        self
    }

    /// Make `stop` return an error (it is still recorded).
    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    pub fn on_command(self, f: impl FnMut(usize) + Send + 'static) -> Self {
        *lock(&self.hook) = Some(Box::new(f));
        self
    }

    pub fn log(&self) -> RobotLog {
        lock(&self.log).clone()
    }
}

impl Robot for RecordingRobot {
    fn set_velocity(&mut self, vx: f32, vy: f32, wz: f32) -> std::result::Result<(), BoxError> {
        let (idx, rejected) = {
            let mut log = lock(&self.log);
            let idx = log.calls;
            log.calls += 1;
            if log.stops > 0 {
                log.after_stop += 1;
            }
            let rejected = self.fail_from.is_some_and(|n| idx >= n);
            if !rejected {
                log.commands.push(VelocityCommand::new(vx, vy, wz));
            }
            (idx, rejected)
        };
        if let Some(hook) = lock(&self.hook).as_mut() {
            hook(idx);
        }
        if rejected {
            return Err(Box::new(std::io::Error::other("recording robot: rejected")));
        }
        Ok(())
    }

    fn get_state(&self) -> std::result::Result<RobotState, BoxError> {
        let log = lock(&self.log);
        let last = log.commands.last().copied().unwrap_or_default();
        Ok(RobotState {
            cmd_vel_normalized: [last.vx, last.vy, last.wz],
            moving: log.stops == 0 && !last.is_zero(),
        })
    }

    fn stop(&mut self) -> std::result::Result<(), BoxError> {
        lock(&self.log).stops += 1;
        if self.fail_stop {
            return Err(Box::new(std::io::Error::other("recording robot: stop failed")));
        }
        Ok(())
    }
}

// ── InputSource ──────────────────────────────────────────────────────────────

/// One scripted answer from `ScriptedInput::poll_next`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Command(Command),
    /// Nothing arrives; the full timeout elapses on the clock.
    Idle,
    Closed,
    /// `poll_next` returns an error.
    Fail,
}

/// Input source replaying a script against a (usually manual) clock. Once
/// the script runs out it reports `Closed`.
pub struct ScriptedInput<C: Clock> {
    steps: VecDeque<Step>,
    clock: C,
    finished: Arc<AtomicU32>,
    fail_finish: bool,
}

impl<C: Clock> ScriptedInput<C> {
    pub fn new(clock: C, steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            clock,
            finished: Arc::new(AtomicU32::new(0)),
            fail_finish: false,
        }
    }

    /// Make `finish` report a terminal restore failure.
    pub fn failing_finish(mut self) -> Self {
        self.fail_finish = true;
        self
    }

    /// Counter of `finish` calls, shared with the source.
    pub fn finish_count(&self) -> Arc<AtomicU32> {
        self.finished.clone()
    }
}

impl<C: Clock> InputSource for ScriptedInput<C> {
    fn poll_next(&mut self, timeout: Duration) -> Result<Poll> {
        match self.steps.pop_front() {
            Some(Step::Command(cmd)) => Ok(Poll::Command(cmd)),
            Some(Step::Idle) => {
                self.clock.sleep(timeout);
                Ok(Poll::Idle)
            }
            Some(Step::Fail) => Err(crate::error::TeleopError::Input("scripted failure".into()).into()),
            Some(Step::Closed) | None => Ok(Poll::Closed),
        }
    }

    fn finish(&mut self) -> Result<()> {
        self.finished.fetch_add(1, Ordering::AcqRel);
        if self.fail_finish {
            return Err(crate::error::TeleopError::Terminal("scripted restore failure".into()).into());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }

    fn supports_strafe(&self) -> bool {
        true
    }
}

// ── Terminal ─────────────────────────────────────────────────────────────────

/// Configuration value a `FakeTerminal` holds while in raw mode.
pub const RAW_CONFIG: u32 = 0xFFFF;

/// Terminal whose "configuration" is a shared integer.
#[derive(Debug, Clone)]
pub struct FakeTerminal {
    config: Arc<Mutex<u32>>,
    restores: Arc<AtomicU32>,
    fail_enter: bool,
    fail_restore: bool,
}

impl FakeTerminal {
    pub fn new(initial: u32) -> Self {
        Self {
            config: Arc::new(Mutex::new(initial)),
            restores: Arc::new(AtomicU32::new(0)),
            fail_enter: false,
            fail_restore: false,
        }
    }

    pub fn failing_enter(mut self) -> Self {
        self.fail_enter = true;
        self
    }

    pub fn failing_restore(mut self) -> Self {
        self.fail_restore = true;
        self
    }

    pub fn config(&self) -> u32 {
        *lock(&self.config)
    }

    /// Successful or attempted `restore` calls.
    pub fn restores(&self) -> u32 {
        self.restores.load(Ordering::Acquire)
    }
}

impl Terminal for FakeTerminal {
    type Snapshot = u32;

    fn enter_raw_mode(&mut self) -> std::result::Result<u32, BoxError> {
        if self.fail_enter {
            return Err(Box::new(std::io::Error::other("not a terminal")));
        }
        let mut cfg = lock(&self.config);
        let previous = *cfg;
        *cfg = RAW_CONFIG;
        Ok(previous)
    }

    fn restore(&mut self, previous: &u32) -> std::result::Result<(), BoxError> {
        self.restores.fetch_add(1, Ordering::AcqRel);
        if self.fail_restore {
            return Err(Box::new(std::io::Error::other("restore refused")));
        }
        *lock(&self.config) = *previous;
        Ok(())
    }
}

// ── CharStream ───────────────────────────────────────────────────────────────

/// Byte stream replaying a script; `Timeout` entries advance the clock by
/// the requested wait. Reports `Eof` once exhausted.
pub struct ScriptedChars<C: Clock> {
    reads: VecDeque<ByteRead>,
    clock: C,
}

impl<C: Clock> ScriptedChars<C> {
    pub fn new(clock: C, reads: impl IntoIterator<Item = ByteRead>) -> Self {
        Self {
            reads: reads.into_iter().collect(),
            clock,
        }
    }

    /// Script that yields `bytes` one at a time, then `Eof`.
    pub fn bytes(clock: C, bytes: &[u8]) -> Self {
        Self::new(clock, bytes.iter().map(|b| ByteRead::Byte(*b)))
    }
}

impl<C: Clock> CharStream for ScriptedChars<C> {
    fn read_byte(&mut self, timeout: Duration) -> std::result::Result<ByteRead, BoxError> {
        let next = self.reads.pop_front().unwrap_or(ByteRead::Eof);
        if next == ByteRead::Timeout {
            self.clock.sleep(timeout);
        }
        Ok(next)
    }
}

// ── KeyEventService ──────────────────────────────────────────────────────────

/// Key event service replaying a list of edges.
///
/// After the list, `new` ends the stream with an error; `endless` keeps
/// reporting nothing (sleeping for real) until the listener shuts it down.
pub struct ScriptedKeys {
    edges: VecDeque<KeyEdge>,
    endless: bool,
    closed: Arc<AtomicBool>,
}

impl ScriptedKeys {
    pub fn new(edges: impl IntoIterator<Item = KeyEdge>) -> Self {
        Self {
            edges: edges.into_iter().collect(),
            endless: false,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn endless(edges: impl IntoIterator<Item = KeyEdge>) -> Self {
        Self {
            endless: true,
            ..Self::new(edges)
        }
    }

    /// Set once `close` has been called.
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        self.closed.clone()
    }
}

impl KeyEventService for ScriptedKeys {
    fn next_edge(&mut self, timeout: Duration) -> std::result::Result<Option<KeyEdge>, BoxError> {
        if let Some(edge) = self.edges.pop_front() {
            return Ok(Some(edge));
        }
        if self.endless {
            std::thread::sleep(timeout.min(Duration::from_millis(5)));
            return Ok(None);
        }
        Err(Box::new(std::io::Error::other("end of scripted events")))
    }

    fn close(&mut self) -> std::result::Result<(), BoxError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
