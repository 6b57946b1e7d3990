//! Key bindings and the pure reducers that turn input into commands.
//!
//! Two reducers exist because the two input backends see different things:
//! - `on_edge` gets key-down/key-up transitions. A release resets its axis to
//!   zero regardless of what else is held (last key wins).
//! - `on_byte` gets raw keystrokes with no release information, so each byte
//!   sets its target directly.

use teleop_traits::{Key, KeyEdge};

use crate::types::{Axis, Scales};

/// ESC byte; quits in the raw backend.
pub const ESC: u8 = 0x1b;
/// ETX (Ctrl-C) byte; only reaches the raw backend when the terminal does not
/// generate signals.
pub const ETX: u8 = 0x03;

/// A single effect of one input on the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Set one axis target.
    SetAxis(Axis, f32),
    /// Zero all targets.
    Halt,
    /// Zero all targets and end the session.
    Quit,
    /// External interrupt requested from the keyboard.
    Interrupt,
}

/// Characters bound to each motion. Stored lowercase; Esc always quits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMap {
    pub forward: char,
    pub back: char,
    pub yaw_left: char,
    pub yaw_right: char,
    pub strafe_left: char,
    pub strafe_right: char,
    pub halt: char,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            forward: 'w',
            back: 's',
            yaw_left: 'a',
            yaw_right: 'd',
            strafe_left: 'q',
            strafe_right: 'e',
            halt: 'x',
        }
    }
}

impl KeyMap {
    /// Lowercase every binding.
    pub fn normalized(self) -> Self {
        Self {
            forward: self.forward.to_ascii_lowercase(),
            back: self.back.to_ascii_lowercase(),
            yaw_left: self.yaw_left.to_ascii_lowercase(),
            yaw_right: self.yaw_right.to_ascii_lowercase(),
            strafe_left: self.strafe_left.to_ascii_lowercase(),
            strafe_right: self.strafe_right.to_ascii_lowercase(),
            halt: self.halt.to_ascii_lowercase(),
        }
    }

    /// One-line help text for the operator.
    pub fn help(&self, strafe: bool) -> String {
        let mut s = format!(
            "{}/{} forward/back, {}/{} yaw left/right",
            self.forward.to_ascii_uppercase(),
            self.back.to_ascii_uppercase(),
            self.yaw_left.to_ascii_uppercase(),
            self.yaw_right.to_ascii_uppercase(),
        );
        if strafe {
            s.push_str(&format!(
                ", {}/{} strafe left/right, {} halt",
                self.strafe_left.to_ascii_uppercase(),
                self.strafe_right.to_ascii_uppercase(),
                self.halt.to_ascii_uppercase(),
            ));
        }
        s.push_str(", Esc quit");
        s
    }
}

/// Key map plus the per-axis magnitudes a key press asserts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bindings {
    pub keys: KeyMap,
    pub scales: Scales,
}

impl Bindings {
    pub fn new(keys: KeyMap, scales: Scales) -> Self {
        Self {
            keys: keys.normalized(),
            scales,
        }
    }

    /// Axis and signed magnitude for a motion character, if bound.
    fn motion(&self, c: char, strafe: bool) -> Option<(Axis, f32)> {
        let k = &self.keys;
        let s = &self.scales;
        if c == k.forward {
            Some((Axis::Vx, s.vx))
        } else if c == k.back {
            Some((Axis::Vx, -s.vx))
        } else if c == k.yaw_left {
            Some((Axis::Wz, s.wz))
        } else if c == k.yaw_right {
            Some((Axis::Wz, -s.wz))
        } else if strafe && c == k.strafe_left {
            Some((Axis::Vy, s.vy))
        } else if strafe && c == k.strafe_right {
            Some((Axis::Vy, -s.vy))
        } else {
            None
        }
    }

    /// Reducer for key-down/key-up transitions.
    ///
    /// Strafe and halt keys are not handled here.
    pub fn on_edge(&self, edge: KeyEdge) -> Option<Command> {
        match edge {
            KeyEdge::Down(Key::Escape) => Some(Command::Quit),
            KeyEdge::Down(Key::Interrupt) => Some(Command::Interrupt),
            KeyEdge::Down(Key::Char(c)) => self
                .motion(c.to_ascii_lowercase(), false)
                .map(|(axis, v)| Command::SetAxis(axis, v)),
            KeyEdge::Up(Key::Char(c)) => self
                .motion(c.to_ascii_lowercase(), false)
                .map(|(axis, _)| Command::SetAxis(axis, 0.0)),
            _ => None,
        }
    }

    /// Reducer for raw keystrokes.
    pub fn on_byte(&self, b: u8) -> Option<Command> {
        match b {
            ESC => Some(Command::Quit),
            ETX => Some(Command::Interrupt),
            _ if b.is_ascii() => {
                let c = char::from(b).to_ascii_lowercase();
                if c == self.keys.halt {
                    return Some(Command::Halt);
                }
                self.motion(c, true)
                    .map(|(axis, v)| Command::SetAxis(axis, v))
            }
            _ => None,
        }
    }
}
