//! Stdin terminal backend: termios line discipline and bounded single-byte reads.
//!
//! Raw mode here is "cbreak": canonical mode and echo are turned off, signal
//! generation stays on so Ctrl-C still raises SIGINT.

use std::time::Duration;

use teleop_traits::{BoxError, ByteRead, CharStream, Terminal};

use crate::error::HwError;

const STDIN_FD: libc::c_int = libc::STDIN_FILENO;

/// Terminal configuration captured before raw mode. Empty when stdin is not a tty.
#[derive(Clone, Copy)]
pub struct TermiosSnapshot(Option<libc::termios>);

impl TermiosSnapshot {
    /// Whether a terminal configuration was actually captured.
    pub fn is_tty(&self) -> bool {
        self.0.is_some()
    }
}

impl std::fmt::Debug for TermiosSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TermiosSnapshot")
            .field("tty", &self.is_tty())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct StdinTerminal;

impl StdinTerminal {
    pub fn new() -> Self {
        Self
    }

    pub fn is_tty() -> bool {
        // SAFETY: isatty only inspects the descriptor.
        unsafe { libc::isatty(STDIN_FD) == 1 }
    }
}

fn last_os_error(what: &str) -> HwError {
    HwError::Terminal(format!("{what}: {}", std::io::Error::last_os_error()))
}

impl Terminal for StdinTerminal {
    type Snapshot = TermiosSnapshot;

    fn enter_raw_mode(&mut self) -> Result<TermiosSnapshot, BoxError> {
        if !Self::is_tty() {
            tracing::debug!("stdin is not a tty; leaving line discipline untouched");
            return Ok(TermiosSnapshot(None));
        }
        let mut previous = std::mem::MaybeUninit::<libc::termios>::uninit();
        // SAFETY: tcgetattr fully initializes the struct when it returns 0.
        let previous = unsafe {
            if libc::tcgetattr(STDIN_FD, previous.as_mut_ptr()) != 0 {
                return Err(Box::new(last_os_error("tcgetattr")));
            }
            previous.assume_init()
        };
        let mut raw = previous;
        raw.c_lflag &= !(libc::ICANON | libc::ECHO);
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;
        // SAFETY: `raw` is a valid termios derived from the current settings.
        if unsafe { libc::tcsetattr(STDIN_FD, libc::TCSAFLUSH, &raw) } != 0 {
            return Err(Box::new(last_os_error("tcsetattr(raw)")));
        }
        tracing::debug!("terminal switched to cbreak mode");
        Ok(TermiosSnapshot(Some(previous)))
    }

    fn restore(&mut self, previous: &TermiosSnapshot) -> Result<(), BoxError> {
        let Some(t) = previous.0.as_ref() else {
            return Ok(());
        };
        // SAFETY: `t` came from tcgetattr on the same descriptor.
        if unsafe { libc::tcsetattr(STDIN_FD, libc::TCSADRAIN, t) } != 0 {
            return Err(Box::new(last_os_error("tcsetattr(restore)")));
        }
        tracing::debug!("terminal configuration restored");
        Ok(())
    }
}

/// Stdin read one byte at a time, waiting at most the given timeout in poll(2).
#[derive(Debug, Default)]
pub struct StdinChars;

impl StdinChars {
    pub fn new() -> Self {
        Self
    }
}

#[inline]
fn timeout_ms(timeout: Duration) -> libc::c_int {
    // Round up so a sub-millisecond wait does not become a busy poll.
    let ms = timeout.as_micros().div_ceil(1000);
    ms.min(libc::c_int::MAX as u128) as libc::c_int
}

impl CharStream for StdinChars {
    fn read_byte(&mut self, timeout: Duration) -> Result<ByteRead, BoxError> {
        let mut fds = libc::pollfd {
            fd: STDIN_FD,
            events: libc::POLLIN,
            revents: 0,
        };
        // SAFETY: one valid pollfd, count 1.
        let rc = unsafe { libc::poll(&mut fds, 1, timeout_ms(timeout)) };
        if rc < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                return Ok(ByteRead::Timeout);
            }
            return Err(Box::new(HwError::Io(err)));
        }
        if rc == 0 {
            return Ok(ByteRead::Timeout);
        }
        if fds.revents & (libc::POLLIN | libc::POLLHUP) == 0 {
            return Err(Box::new(HwError::Io(std::io::Error::other(format!(
                "stdin poll revents={:#x}",
                fds.revents
            )))));
        }
        let mut byte = 0u8;
        // SAFETY: reading at most one byte into a one-byte buffer.
        let n = unsafe { libc::read(STDIN_FD, (&mut byte as *mut u8).cast(), 1) };
        match n {
            1 => Ok(ByteRead::Byte(byte)),
            0 => Ok(ByteRead::Eof),
            _ => {
                let err = std::io::Error::last_os_error();
                if err.kind() == std::io::ErrorKind::Interrupted {
                    Ok(ByteRead::Timeout)
                } else {
                    Err(Box::new(HwError::Io(err)))
                }
            }
        }
    }
}
