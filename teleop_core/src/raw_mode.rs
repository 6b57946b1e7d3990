//! Scoped ownership of the terminal's raw mode.

use teleop_traits::Terminal;

use crate::error::{Result, TeleopError};
use crate::hw_error::{Seam, map_hw_error};

/// Holds the terminal in raw mode and puts the previous configuration back
/// exactly once: through `release` (error returned) or, if that never ran,
/// on drop (error logged). Drop also runs while unwinding from a panic.
pub struct RawModeGuard<T: Terminal> {
    terminal: T,
    previous: Option<T::Snapshot>,
}

impl<T: Terminal> RawModeGuard<T> {
    pub fn acquire(mut terminal: T) -> Result<Self> {
        let previous = terminal
            .enter_raw_mode()
            .map_err(|e| map_hw_error(Seam::Terminal, e.as_ref()))?;
        tracing::debug!("raw mode acquired");
        Ok(Self {
            terminal,
            previous: Some(previous),
        })
    }

    pub fn is_held(&self) -> bool {
        self.previous.is_some()
    }

    /// Restore the saved configuration. A second call is a no-op.
    pub fn release(&mut self) -> Result<()> {
        let Some(previous) = self.previous.take() else {
            return Ok(());
        };
        self.terminal.restore(&previous).map_err(|e| {
            let err = map_hw_error(Seam::Terminal, e.as_ref());
            // Restore failures are always terminal errors, whatever the backend said.
            match err {
                TeleopError::Terminal(_) => err,
                other => TeleopError::Terminal(other.to_string()),
            }
        })?;
        tracing::debug!("raw mode released");
        Ok(())
    }
}

impl<T: Terminal> Drop for RawModeGuard<T> {
    fn drop(&mut self) {
        if self.previous.is_none() {
            return;
        }
        if let Err(e) = self.release() {
            tracing::error!(error = %e, "failed to restore terminal");
        }
    }
}
