//! Human-readable error descriptions and structured JSON error formatting.

use teleop_core::error::{BuildError, TeleopError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingRobot => {
                "What happened: No robot was provided to the run controller.\nLikely causes: The robot backend failed to initialize or was not wired into the builder.\nHow to fix: Ensure the robot is created successfully and passed via with_robot(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML or on the command line.\nHow to fix: Edit the config file or the flag, then rerun. See README for a sample."
            ),
        };
    }

    if let Some(te) = err.downcast_ref::<TeleopError>() {
        return match te {
            TeleopError::Robot(m) => format!(
                "What happened: The robot rejected a command ({m}).\nLikely causes: Controller fault, lost connection, or the controller was stopped externally.\nHow to fix: Check the controller; the session was brought to rest and stopped before exiting."
            ),
            TeleopError::Terminal(m) => format!(
                "What happened: The terminal could not be configured ({m}).\nLikely causes: stdin is not a usable terminal, or its settings were changed underneath us.\nHow to fix: Run from an interactive terminal; if the terminal misbehaves now, run `reset` or `stty sane`."
            ),
            TeleopError::Input(m) => format!(
                "What happened: Keyboard input failed ({m}).\nLikely causes: The input device went away or stdin was closed.\nHow to fix: Re-run with --input raw, or with --log-level=debug for details."
            ),
            TeleopError::Config(m) => format!(
                "What happened: Invalid configuration ({m}).\nLikely causes: Missing file, TOML syntax error, or out-of-range values.\nHow to fix: Edit the config file and try again."
            ),
            TeleopError::State(m) => format!(
                "What happened: {m}.\nLikely causes: Internal sequencing error.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable reason name used in JSON output.
pub fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingRobot => "MissingRobot",
            BuildError::InvalidConfig(_) => "InvalidConfig",
        };
    }
    match err.downcast_ref::<TeleopError>() {
        Some(TeleopError::Robot(_)) => "RobotFault",
        Some(TeleopError::Terminal(_)) => "Terminal",
        Some(TeleopError::Input(_)) => "Input",
        Some(TeleopError::Config(_)) => "InvalidConfig",
        Some(TeleopError::State(_)) => "State",
        None => "Error",
    }
}

/// Map typed errors to stable exit codes; anything else returns 1.
/// (2 is reserved for usage errors reported by clap.)
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(BuildError::InvalidConfig(_)) = err.downcast_ref::<BuildError>() {
        return 5;
    }
    match err.downcast_ref::<TeleopError>() {
        Some(TeleopError::Robot(_)) => 3,
        Some(TeleopError::Terminal(_)) => 4,
        Some(TeleopError::Config(_)) => 5,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
