//! Wiring for one teleop session: robot, input backend, controller, signals.

use eyre::{Result, WrapErr};
use std::io::Write;

use teleop_config::{Config, InputBackend};
use teleop_core::error::TeleopError;
use teleop_core::{
    Bindings, EventListener, InputSource, KeyMap, LoopCfg, RunController, RunReport, Scales,
    Session, ShutdownCfg,
};
use teleop_hardware::{CrosstermKeys, SimulatedRobot};

/// Test hook: make the simulated robot fault after N accepted commands.
pub const SIM_FAIL_AFTER_ENV: &str = "TELEOP_SIM_FAIL_AFTER";

/// Command-line overrides for `drive`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DriveOverrides {
    pub input: Option<InputBackend>,
    pub alpha: Option<f32>,
    pub tick_hz: Option<u32>,
    pub flush_ticks: Option<u32>,
    pub quiet_state: bool,
}

fn config_error(e: eyre::Report) -> eyre::Report {
    eyre::Report::new(TeleopError::Config(format!("{e:#}")))
}

/// Runtime settings after applying overrides to the config. Overrides are
/// held to the same bounds as the file.
pub fn effective(
    cfg: &Config,
    o: &DriveOverrides,
) -> Result<(LoopCfg, ShutdownCfg, InputBackend)> {
    let mut merged = cfg.clone();
    if let Some(a) = o.alpha {
        merged.smoothing.alpha = a;
    }
    if let Some(hz) = o.tick_hz {
        merged.control_loop.tick_hz = hz;
    }
    if let Some(n) = o.flush_ticks {
        merged.shutdown.flush_ticks = n;
    }
    if o.quiet_state {
        merged.control_loop.observe_state = false;
    }
    if let Some(b) = o.input {
        merged.input.backend = b;
    }
    merged.validate().map_err(config_error)?;
    Ok((
        LoopCfg::from(&merged),
        ShutdownCfg::from(&merged.shutdown),
        merged.input.backend,
    ))
}

pub fn bindings(cfg: &Config) -> Bindings {
    Bindings::new(KeyMap::from(&cfg.keys), Scales::from(&cfg.scales))
}

fn sim_robot() -> SimulatedRobot {
    let robot = SimulatedRobot::new();
    match std::env::var(SIM_FAIL_AFTER_ENV) {
        Ok(v) => match v.trim().parse::<u64>() {
            Ok(n) => robot.fail_after(n),
            Err(e) => {
                tracing::warn!(value = %v, error = %e, "ignoring {SIM_FAIL_AFTER_ENV}");
                robot
            }
        },
        Err(_) => robot,
    }
}

/// Backend `select_input` would try first, without opening anything.
pub fn probe_backend(backend: InputBackend) -> &'static str {
    match backend {
        InputBackend::Raw => "raw",
        InputBackend::Auto | InputBackend::Events => match CrosstermKeys::open() {
            // Dropping closes it again.
            Ok(_keys) => "events",
            Err(e) => {
                tracing::info!(error = %e, "event backend unavailable");
                "raw"
            }
        },
    }
}

#[cfg(unix)]
fn open_raw(bindings: Bindings) -> Result<Box<dyn InputSource>> {
    use teleop_core::RawPoller;
    use teleop_hardware::{StdinChars, StdinTerminal};
    let poller = RawPoller::new(StdinChars::new(), StdinTerminal::new(), bindings)?;
    Ok(Box::new(poller))
}

#[cfg(not(unix))]
fn open_raw(_bindings: Bindings) -> Result<Box<dyn InputSource>> {
    Err(TeleopError::Terminal("raw keyboard input requires a unix terminal".into()).into())
}

/// Open the requested backend. The event backend falls back to raw input
/// when it is unavailable; that is never fatal.
pub fn select_input(
    backend: InputBackend,
    bindings: Bindings,
    capacity: usize,
) -> Result<Box<dyn InputSource>> {
    match backend {
        InputBackend::Raw => open_raw(bindings),
        InputBackend::Auto | InputBackend::Events => match CrosstermKeys::open() {
            Ok(keys) => Ok(Box::new(EventListener::spawn(keys, bindings, capacity))),
            Err(e) => {
                tracing::warn!(error = %e, "key event backend unavailable; using raw keystrokes");
                open_raw(bindings)
            }
        },
    }
}

/// Hand over the opened backend. When none could be opened the session
/// never runs, but the robot is still stopped and the stop reported.
fn input_or_abort(
    ctl: &mut RunController,
    opened: Result<Box<dyn InputSource>>,
) -> Result<Box<dyn InputSource>> {
    match opened {
        Ok(input) => Ok(input),
        Err(e) => {
            tracing::error!(error = %e, "no input backend; stopping robot");
            if let Err(stop) = ctl.abort() {
                tracing::error!(error = %stop, "robot stop failed");
            }
            println!("Robot stopped.");
            Err(e)
        }
    }
}

/// Run one session against the simulated robot.
///
/// Prints the key help once input is live and `Robot stopped.` once the
/// robot has been stopped, whatever the outcome.
pub fn run_drive(cfg: &Config, o: &DriveOverrides, json: bool) -> Result<RunReport> {
    let (loop_cfg, shutdown, backend) = effective(cfg, o)?;
    let session = Session::new();

    {
        let flag = session.flag.clone();
        ctrlc::set_handler(move || flag.interrupt())
            .wrap_err("failed to install Ctrl-C handler")?;
    }

    let mut ctl = RunController::builder()
        .with_robot(sim_robot())
        .with_loop(loop_cfg)
        .with_shutdown(shutdown)
        .with_session(session.clone())
        .build()?;

    let bindings = bindings(cfg);
    let opened = select_input(backend, bindings, cfg.input.channel_capacity);
    let input = input_or_abort(&mut ctl, opened)?;
    tracing::info!(backend = input.name(), "input ready");
    if !json {
        // Raw mode may have disabled output post-processing; emit CR explicitly.
        print!("{}\r\n", bindings.keys.help(input.supports_strafe()));
        let _ = std::io::stdout().flush();
    }

    let result = ctl.run(input);
    println!("Robot stopped.");

    let report = result?;
    if json {
        println!("{}", report_json(&report));
    } else {
        println!(
            "Session ended: {} ({} ticks, {} flush ticks{})",
            report.cause.name(),
            report.ticks,
            report.flush_ticks,
            if report.flush_interrupted {
                ", flush interrupted"
            } else {
                ""
            }
        );
    }
    Ok(report)
}

pub fn report_json(r: &RunReport) -> String {
    serde_json::json!({
        "backend": r.backend,
        "cause": r.cause.name(),
        "ticks": r.ticks,
        "flush_ticks": r.flush_ticks,
        "flush_interrupted": r.flush_interrupted,
        "last_cmd": [r.last_command.vx, r.last_command.vy, r.last_command.wz],
    })
    .to_string()
}

/// Load the config: an explicit path must exist; the default path may not.
pub fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (std::path::PathBuf::from(crate::cli::DEFAULT_CONFIG), false),
    };
    if !explicit && !path.exists() {
        return Ok(Config::default());
    }
    teleop_config::load_path(&path).map_err(config_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_take_precedence_over_config() {
        let cfg = teleop_config::load_toml(
            "[smoothing]\nalpha = 0.4\n[loop]\ntick_hz = 20\n[input]\nbackend = \"events\"\n",
        )
        .unwrap();
        let o = DriveOverrides {
            input: Some(InputBackend::Raw),
            alpha: Some(0.9),
            flush_ticks: Some(3),
            quiet_state: true,
            ..DriveOverrides::default()
        };
        let (lp, sd, backend) = effective(&cfg, &o).unwrap();
        assert_eq!(lp.alpha, 0.9);
        assert_eq!(lp.tick_hz, 20);
        assert!(!lp.observe_state);
        assert_eq!(sd.flush_ticks, 3);
        assert_eq!(backend, InputBackend::Raw);
    }

    #[test]
    fn missing_default_config_uses_defaults() {
        // Relative to the crate dir under `cargo test`; no etc/teleop.toml there.
        let cfg = load_config(None).unwrap();
        assert_eq!(cfg.control_loop.tick_hz, 50);
    }

    #[test]
    fn missing_explicit_config_is_a_config_error() {
        let err = load_config(Some(std::path::Path::new("/nonexistent/teleop.toml"))).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TeleopError>(),
            Some(TeleopError::Config(_))
        ));
    }

    #[test]
    fn overrides_outside_config_bounds_are_rejected() {
        let cfg = Config::default();
        for o in [
            DriveOverrides {
                tick_hz: Some(100_000),
                ..DriveOverrides::default()
            },
            DriveOverrides {
                flush_ticks: Some(5_000),
                ..DriveOverrides::default()
            },
            DriveOverrides {
                alpha: Some(f32::NAN),
                ..DriveOverrides::default()
            },
        ] {
            let err = effective(&cfg, &o).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<TeleopError>(),
                Some(TeleopError::Config(_))
            ));
        }
    }

    #[test]
    fn failed_backend_still_stops_the_robot() {
        use teleop_core::mocks::{FakeTerminal, RecordingRobot, ScriptedChars};
        use teleop_core::{Phase, RawPoller};
        use teleop_traits::ManualClock;

        let robot = RecordingRobot::new();
        let mut ctl = RunController::builder()
            .with_robot(robot.clone())
            .with_clock(Box::new(ManualClock::new()))
            .build()
            .unwrap();
        let opened = RawPoller::new(
            ScriptedChars::bytes(ManualClock::new(), b"w"),
            FakeTerminal::new(7).failing_enter(),
            Bindings::default(),
        )
        .map(|p| Box::new(p) as Box<dyn InputSource>);

        let err = input_or_abort(&mut ctl, opened).err().expect("no backend");
        assert!(matches!(
            err.downcast_ref::<TeleopError>(),
            Some(TeleopError::Terminal(_))
        ));
        assert_eq!(ctl.phase(), Phase::Stopped);
        assert_eq!(robot.log().stops, 1);
        assert!(robot.log().commands.is_empty());
    }
}
