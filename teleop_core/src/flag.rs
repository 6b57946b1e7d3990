//! Process-wide run flag: the single cancellation signal of a session.
//!
//! Cleared at most once; there is no way to set it back. The first caller to
//! clear it records why the session is ending. Interrupts are also counted so
//! the shutdown flush can notice a repeated Ctrl-C.

use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};

/// Why a session left the running phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
    /// Quit key
    Quit,
    /// External interrupt (SIGINT / Ctrl-C)
    Interrupt,
    /// Input stream ended
    InputClosed,
    /// Robot rejected a command
    RobotFault,
}

impl StopCause {
    fn to_u8(self) -> u8 {
        match self {
            StopCause::Quit => 1,
            StopCause::Interrupt => 2,
            StopCause::InputClosed => 3,
            StopCause::RobotFault => 4,
        }
    }

    fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(StopCause::Quit),
            2 => Some(StopCause::Interrupt),
            3 => Some(StopCause::InputClosed),
            4 => Some(StopCause::RobotFault),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StopCause::Quit => "quit",
            StopCause::Interrupt => "interrupt",
            StopCause::InputClosed => "input_closed",
            StopCause::RobotFault => "robot_fault",
        }
    }
}

#[derive(Debug)]
pub struct RunFlag {
    /// 0 while running, otherwise the encoded `StopCause`.
    state: AtomicU8,
    interrupts: AtomicU32,
}

const RUNNING: u8 = 0;

impl Default for RunFlag {
    fn default() -> Self {
        Self {
            state: AtomicU8::new(RUNNING),
            interrupts: AtomicU32::new(0),
        }
    }
}

impl RunFlag {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) == RUNNING
    }

    /// Clear the flag. Returns true if this call was the one that cleared it.
    pub fn request_stop(&self, cause: StopCause) -> bool {
        let won = self
            .state
            .compare_exchange(RUNNING, cause.to_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            tracing::info!(cause = cause.name(), "stop requested");
        }
        won
    }

    /// Record an external interrupt and clear the flag.
    pub fn interrupt(&self) {
        let n = self.interrupts.fetch_add(1, Ordering::AcqRel) + 1;
        if !self.request_stop(StopCause::Interrupt) {
            tracing::warn!(count = n, "interrupt while stopping");
        }
    }

    /// Number of interrupts observed so far.
    pub fn interrupts(&self) -> u32 {
        self.interrupts.load(Ordering::Acquire)
    }

    /// Cause recorded by the call that cleared the flag, if any.
    pub fn cause(&self) -> Option<StopCause> {
        StopCause::from_u8(self.state.load(Ordering::Acquire))
    }
}
