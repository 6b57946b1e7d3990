//! Polled input: single-byte reads from a character stream with a bounded
//! wait, the terminal held in raw mode for the poller's whole lifetime.

use std::time::Duration;

use teleop_traits::{ByteRead, CharStream, Terminal};

use crate::bindings::Bindings;
use crate::error::Result;
use crate::hw_error::{Seam, map_hw_error};
use crate::input::{InputSource, Poll};
use crate::raw_mode::RawModeGuard;

/// Reference wait per read; bounds input latency and flag reaction time.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(50);

pub struct RawPoller<S: CharStream, T: Terminal> {
    stream: S,
    guard: RawModeGuard<T>,
    bindings: Bindings,
    eof: bool,
}

impl<S: CharStream, T: Terminal> RawPoller<S, T> {
    /// Enter raw mode and start polling `stream`.
    pub fn new(stream: S, terminal: T, bindings: Bindings) -> Result<Self> {
        let guard = RawModeGuard::acquire(terminal)?;
        Ok(Self {
            stream,
            guard,
            bindings,
            eof: false,
        })
    }
}

impl<S: CharStream, T: Terminal> InputSource for RawPoller<S, T> {
    fn poll_next(&mut self, timeout: Duration) -> Result<Poll> {
        if self.eof {
            return Ok(Poll::Closed);
        }
        let read = self
            .stream
            .read_byte(timeout)
            .map_err(|e| map_hw_error(Seam::Input, e.as_ref()))?;
        match read {
            ByteRead::Byte(b) => match self.bindings.on_byte(b) {
                Some(cmd) => {
                    tracing::debug!(byte = b, ?cmd, "keystroke");
                    Ok(Poll::Command(cmd))
                }
                None => Ok(Poll::Idle),
            },
            ByteRead::Timeout => Ok(Poll::Idle),
            ByteRead::Eof => {
                tracing::info!("input stream ended");
                self.eof = true;
                Ok(Poll::Closed)
            }
        }
    }

    fn finish(&mut self) -> Result<()> {
        self.guard.release()
    }

    fn name(&self) -> &'static str {
        "raw"
    }

    fn supports_strafe(&self) -> bool {
        true
    }
}
