//! The one capability the run loop needs from an input backend.

use std::time::Duration;

use crate::bindings::Command;
use crate::error::Result;

/// Result of one bounded wait on an input source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Poll {
    /// A key mapped to a command.
    Command(Command),
    /// Nothing actionable arrived within the timeout.
    Idle,
    /// The input stream has ended; no further commands will arrive.
    Closed,
}

/// Either input variant, seen from the run loop.
pub trait InputSource {
    /// Wait at most `timeout` for the next command.
    fn poll_next(&mut self, timeout: Duration) -> Result<Poll>;

    /// Release the backend (terminal mode, threads). Called once when the
    /// session starts draining. Errors here must reach the operator.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }

    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Whether the strafe keys do anything with this backend.
    fn supports_strafe(&self) -> bool;
}

impl<I: InputSource + ?Sized> InputSource for Box<I> {
    fn poll_next(&mut self, timeout: Duration) -> Result<Poll> {
        (**self).poll_next(timeout)
    }
    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
    fn name(&self) -> &'static str {
        (**self).name()
    }
    fn supports_strafe(&self) -> bool {
        (**self).supports_strafe()
    }
}
