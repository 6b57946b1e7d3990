//! Input-side seams: terminal mode, raw character stream, key edge events.

use crate::BoxError;
use std::time::Duration;

/// Terminal whose line discipline can be switched to raw (unbuffered, no echo)
/// and back.
pub trait Terminal {
    /// Opaque configuration captured before raw mode was entered.
    type Snapshot;

    /// Switch to raw mode, returning the configuration in effect before.
    fn enter_raw_mode(&mut self) -> Result<Self::Snapshot, BoxError>;

    /// Put back a configuration previously returned by `enter_raw_mode`.
    fn restore(&mut self, previous: &Self::Snapshot) -> Result<(), BoxError>;
}

/// Outcome of a bounded wait on a character stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRead {
    Byte(u8),
    Timeout,
    Eof,
}

/// Character stream read one byte at a time with a bounded wait.
pub trait CharStream {
    fn read_byte(&mut self, timeout: Duration) -> Result<ByteRead, BoxError>;
}

/// Key identity as reported by an event-capable input service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Escape,
    /// Ctrl-C delivered as a key event (terminal signals disabled).
    Interrupt,
    Other,
}

/// A key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEdge {
    Down(Key),
    Up(Key),
}

/// External service delivering key-down/key-up events.
///
/// `next_edge` blocks for at most `timeout` and returns `Ok(None)` when nothing
/// arrived. An `Err` ends the event stream.
pub trait KeyEventService {
    fn next_edge(&mut self, timeout: Duration) -> Result<Option<KeyEdge>, BoxError>;

    /// Release whatever the service holds (terminal modes, handles).
    fn close(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}
