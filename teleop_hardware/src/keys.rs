//! Key press/release events from the controlling terminal via crossterm.
//!
//! Requires a terminal that implements the keyboard enhancement protocol;
//! plain terminals only ever report presses, so `open` refuses them.

use std::io::IsTerminal;
use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::{execute, terminal};
use teleop_traits::{BoxError, Key, KeyEdge, KeyEventService};

use crate::error::HwError;

#[derive(Debug)]
pub struct CrosstermKeys {
    active: bool,
}

impl CrosstermKeys {
    /// Take over the terminal and start reporting key releases.
    pub fn open() -> Result<Self, HwError> {
        if !std::io::stdin().is_terminal() {
            return Err(HwError::Unavailable("stdin is not a terminal".into()));
        }
        match terminal::supports_keyboard_enhancement() {
            Ok(true) => {}
            Ok(false) => {
                return Err(HwError::Unavailable(
                    "terminal does not report key releases".into(),
                ));
            }
            Err(e) => {
                return Err(HwError::Unavailable(format!(
                    "keyboard enhancement query failed: {e}"
                )));
            }
        }
        terminal::enable_raw_mode().map_err(|e| HwError::Terminal(e.to_string()))?;
        if let Err(e) = execute!(
            std::io::stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        ) {
            let _ = terminal::disable_raw_mode();
            return Err(HwError::Terminal(e.to_string()));
        }
        tracing::debug!("key event reporting enabled");
        Ok(Self { active: true })
    }
}

fn map_key(code: KeyCode, modifiers: KeyModifiers) -> Key {
    match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Key::Interrupt,
        KeyCode::Char(c) => Key::Char(c.to_ascii_lowercase()),
        KeyCode::Esc => Key::Escape,
        _ => Key::Other,
    }
}

fn map_event(ev: KeyEvent) -> KeyEdge {
    let key = map_key(ev.code, ev.modifiers);
    match ev.kind {
        KeyEventKind::Press | KeyEventKind::Repeat => KeyEdge::Down(key),
        KeyEventKind::Release => KeyEdge::Up(key),
    }
}

impl KeyEventService for CrosstermKeys {
    fn next_edge(&mut self, timeout: Duration) -> Result<Option<KeyEdge>, BoxError> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(ev) => Ok(Some(map_event(ev))),
            _ => Ok(None),
        }
    }

    fn close(&mut self) -> Result<(), BoxError> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        let popped = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        terminal::disable_raw_mode().map_err(|e| HwError::Terminal(e.to_string()))?;
        popped.map_err(|e| HwError::Terminal(e.to_string()))?;
        tracing::debug!("key event reporting disabled");
        Ok(())
    }
}

impl Drop for CrosstermKeys {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::error!(error = %e, "failed to restore terminal");
        }
    }
}
