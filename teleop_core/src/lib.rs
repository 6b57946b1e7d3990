#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core teleop logic (hardware-agnostic).
//!
//! This crate provides the command pipeline between a keyboard and a
//! velocity-controlled base. All hardware interactions go through the
//! `teleop_traits::Robot`, `Terminal`, `CharStream` and `KeyEventService`
//! traits.
//!
//! ## Architecture
//!
//! - **State**: target/current velocity record behind one lock (`state`)
//! - **Input**: key bindings (`bindings`), an event listener thread
//!   (`listener`) and a raw-mode byte poller (`poller`), both behind
//!   `input::InputSource`
//! - **Smoothing**: exponential low-pass toward the target, one dispatch per
//!   tick (`smoothing`)
//! - **Run control**: `Init → Running → Draining → Stopped` with a bounded
//!   zero-target flush and exactly one `Robot::stop` (`runner`)
//!
//! Every session shares one `Session` (velocity state plus `RunFlag`); the
//! flag is the only cancellation signal.

pub mod bindings;
pub mod builder;
pub mod config;
pub mod conversions;
pub mod error;
pub mod flag;
pub mod hw_error;
pub mod input;
pub mod listener;
pub mod mocks;
pub mod poller;
pub mod raw_mode;
pub mod runner;
pub mod smoothing;
pub mod state;
pub mod status;
pub mod types;
pub mod util;

pub use bindings::{Bindings, Command, KeyMap};
pub use builder::RunBuilder;
pub use config::{LoopCfg, ShutdownCfg};
pub use error::{BuildError, Report, Result, TeleopError};
pub use flag::{RunFlag, StopCause};
pub use input::{InputSource, Poll};
pub use listener::EventListener;
pub use poller::RawPoller;
pub use raw_mode::RawModeGuard;
pub use runner::{RunController, RunReport, apply_command};
pub use smoothing::SmoothingLoop;
pub use state::{Session, VelocityState};
pub use status::Phase;
pub use types::{Axis, Scales, VelocityCommand};
