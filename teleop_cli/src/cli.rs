//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

/// Config path used when `--config` is not given; may be absent.
pub const DEFAULT_CONFIG: &str = "etc/teleop.toml";

#[derive(Parser, Debug)]
#[command(name = "teleop", version, about = "Keyboard teleoperation CLI")]
pub struct Cli {
    /// Path to config TOML (typed); built-in defaults apply if the default file is absent
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Input backend selection.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum InputArg {
    /// Key press/release events when the terminal supports them, raw keystrokes otherwise
    Auto,
    /// Prefer key press/release events (falls back to raw with a warning)
    Events,
    /// Raw keystrokes from stdin
    Raw,
}

impl From<InputArg> for teleop_config::InputBackend {
    fn from(a: InputArg) -> Self {
        match a {
            InputArg::Auto => teleop_config::InputBackend::Auto,
            InputArg::Events => teleop_config::InputBackend::Events,
            InputArg::Raw => teleop_config::InputBackend::Raw,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drive the (simulated) robot from the keyboard
    Drive {
        /// Input backend (overrides [input].backend)
        #[arg(long, value_enum, value_name = "BACKEND")]
        input: Option<InputArg>,
        /// Smoothing gain in (0, 1] (overrides [smoothing].alpha)
        #[arg(long, value_name = "A")]
        alpha: Option<f32>,
        /// Dispatch rate in Hz (overrides [loop].tick_hz)
        #[arg(long, value_name = "HZ")]
        tick_hz: Option<u32>,
        /// Zero-target ticks sent before stop (overrides [shutdown].flush_ticks)
        #[arg(long, value_name = "N")]
        flush_ticks: Option<u32>,
        /// Do not query robot state after each dispatch
        #[arg(long, action = ArgAction::SetTrue)]
        quiet_state: bool,
    },
    /// Print the active key bindings
    Keys,
    /// Validate config and report which input backend would be used
    SelfCheck,
}
