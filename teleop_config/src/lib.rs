#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the teleop pipeline.
//!
//! - `Config` and its sections are deserialized from TOML; every section is
//!   optional and falls back to the reference values.
//! - `Config::validate` rejects values the control loop cannot run with.
use serde::Deserialize;
use std::path::Path;

/// Per-axis maximum command magnitude applied to key presses.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Scales {
    /// Forward/back magnitude (0..=1)
    pub vx: f32,
    /// Strafe magnitude (0..=1)
    pub vy: f32,
    /// Yaw-rate magnitude (0..=1)
    pub wz: f32,
}

impl Default for Scales {
    fn default() -> Self {
        Self {
            vx: 0.7,
            vy: 0.6,
            wz: 0.7,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct SmoothingCfg {
    /// Exponential smoothing gain in (0.0, 1.0]; higher tracks the target faster.
    pub alpha: f32,
}

impl Default for SmoothingCfg {
    fn default() -> Self {
        Self { alpha: 0.15 }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct LoopCfg {
    /// Command dispatch rate
    pub tick_hz: u32,
    /// Upper bound on a single wait for input (ms)
    pub poll_timeout_ms: u64,
    /// Query the robot state after each dispatch and log it at trace level
    pub observe_state: bool,
}

impl Default for LoopCfg {
    fn default() -> Self {
        Self {
            tick_hz: 50,
            poll_timeout_ms: 50,
            observe_state: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct ShutdownCfg {
    /// Zero-target ticks dispatched before `stop()`
    pub flush_ticks: u32,
    /// Spacing between flush ticks (ms)
    pub flush_interval_ms: u64,
}

impl Default for ShutdownCfg {
    fn default() -> Self {
        Self {
            flush_ticks: 10,
            flush_interval_ms: 20,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InputBackend {
    /// Key press/release events when the terminal supports them, else raw polling
    #[default]
    Auto,
    Events,
    Raw,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct InputCfg {
    pub backend: InputBackend,
    /// Bounded queue between the event thread and the control loop
    pub channel_capacity: usize,
}

impl Default for InputCfg {
    fn default() -> Self {
        Self {
            backend: InputBackend::Auto,
            channel_capacity: 32,
        }
    }
}

/// Key bindings. Esc always quits.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct KeysCfg {
    pub forward: char,
    pub back: char,
    pub yaw_left: char,
    pub yaw_right: char,
    pub strafe_left: char,
    pub strafe_right: char,
    pub halt: char,
}

impl Default for KeysCfg {
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

impl KeysCfg {
    fn all(&self) -> [(&'static str, char); 7] {
        [
            ("forward", self.forward),
            ("back", self.back),
            ("yaw_left", self.yaw_left),
            ("yaw_right", self.yaw_right),
            ("strafe_left", self.strafe_left),
            ("strafe_right", self.strafe_right),
            ("halt", self.halt),
        ]
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub scales: Scales,
    pub smoothing: SmoothingCfg,
    #[serde(rename = "loop")]
    pub control_loop: LoopCfg,
    pub shutdown: ShutdownCfg,
    pub input: InputCfg,
    pub keys: KeysCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_path(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {}: {}", path.display(), e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {}: {}", path.display(), e))?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Scales
        for (name, v) in [
            ("scales.vx", self.scales.vx),
            ("scales.vy", self.scales.vy),
            ("scales.wz", self.scales.wz),
        ] {
            if !(v > 0.0 && v <= 1.0) {
                eyre::bail!("{name} must be in (0.0, 1.0]");
            }
        }

        // Smoothing
        let alpha = self.smoothing.alpha;
        if !(alpha > 0.0 && alpha <= 1.0) {
            eyre::bail!("smoothing.alpha must be in (0.0, 1.0]");
        }

        // Loop
        if self.control_loop.tick_hz == 0 {
            eyre::bail!("loop.tick_hz must be > 0");
        }
        if self.control_loop.tick_hz > 1000 {
            eyre::bail!("loop.tick_hz is unreasonably large (>1000)");
        }
        if self.control_loop.poll_timeout_ms == 0 {
            eyre::bail!("loop.poll_timeout_ms must be >= 1");
        }
        if self.control_loop.poll_timeout_ms > 1000 {
            eyre::bail!("loop.poll_timeout_ms is unreasonably large (>1s)");
        }

        // Shutdown
        if self.shutdown.flush_ticks > 1000 {
            eyre::bail!("shutdown.flush_ticks is unreasonably large (>1000)");
        }
        if self.shutdown.flush_interval_ms > 1000 {
            eyre::bail!("shutdown.flush_interval_ms is unreasonably large (>1s)");
        }

        // Input
        if self.input.channel_capacity == 0 {
            eyre::bail!("input.channel_capacity must be >= 1");
        }

        // Keys: printable and unique (case-insensitive)
        let keys = self.keys.all();
        for (i, (name, c)) in keys.iter().enumerate() {
            if !c.is_ascii_graphic() {
                eyre::bail!("keys.{name} must be a printable ASCII character");
            }
            for (other, d) in &keys[..i] {
                if c.eq_ignore_ascii_case(d) {
                    eyre::bail!("keys.{name} duplicates keys.{other} ('{c}')");
                }
            }
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
