//! teleop: drive a velocity-controlled base from the keyboard.

mod cli;
mod drive;
mod error_fmt;

use clap::Parser;
use std::path::Path;
use std::process::ExitCode;

use cli::{Cli, Commands, JSON_MODE};
use drive::DriveOverrides;
use error_fmt::{exit_code_for_error, format_error_json, humanize};
use teleop_config::Config;
use tracing_appender::non_blocking::WorkerGuard;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    // Config first: it carries the logging section.
    let loaded = drive::load_config(cli.config.as_deref());
    let logging = loaded
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    let _guard = init_tracing(cli.log_level.as_deref(), cli.json, &logging);
    if !cli.json {
        let _ = color_eyre::install();
    }

    let result = loaded.and_then(|cfg| dispatch(&cli, &cfg));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            if JSON_MODE.get().copied().unwrap_or(false) {
                eprintln!("{}", format_error_json(&e));
            } else {
                eprintln!("{}", humanize(&e));
            }
            let code = exit_code_for_error(&e);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn dispatch(cli: &Cli, cfg: &Config) -> eyre::Result<()> {
    match &cli.cmd {
        Commands::Drive {
            input,
            alpha,
            tick_hz,
            flush_ticks,
            quiet_state,
        } => {
            let o = DriveOverrides {
                input: input.map(Into::into),
                alpha: *alpha,
                tick_hz: *tick_hz,
                flush_ticks: *flush_ticks,
                quiet_state: *quiet_state,
            };
            drive::run_drive(cfg, &o, cli.json).map(|_| ())
        }
        Commands::Keys => {
            print_keys(cfg, cli.json);
            Ok(())
        }
        Commands::SelfCheck => self_check(cfg, cli.json),
    }
}

fn print_keys(cfg: &Config, json: bool) {
    let b = drive::bindings(cfg);
    let k = &b.keys;
    if json {
        println!(
            "{}",
            serde_json::json!({
                "forward": k.forward.to_string(),
                "back": k.back.to_string(),
                "yaw_left": k.yaw_left.to_string(),
                "yaw_right": k.yaw_right.to_string(),
                "strafe_left": k.strafe_left.to_string(),
                "strafe_right": k.strafe_right.to_string(),
                "halt": k.halt.to_string(),
                "quit": "esc",
                "scales": { "vx": b.scales.vx, "vy": b.scales.vy, "wz": b.scales.wz },
            })
        );
        return;
    }
    let up = |c: char| c.to_ascii_uppercase();
    println!("forward       {}  (vx +{})", up(k.forward), b.scales.vx);
    println!("back          {}  (vx -{})", up(k.back), b.scales.vx);
    println!("yaw left      {}  (wz +{})", up(k.yaw_left), b.scales.wz);
    println!("yaw right     {}  (wz -{})", up(k.yaw_right), b.scales.wz);
    println!("strafe left   {}  (vy +{}, raw input only)", up(k.strafe_left), b.scales.vy);
    println!("strafe right  {}  (vy -{}, raw input only)", up(k.strafe_right), b.scales.vy);
    println!("halt          {}  (raw input only)", up(k.halt));
    println!("quit          Esc");
}

fn self_check(cfg: &Config, json: bool) -> eyre::Result<()> {
    let (loop_cfg, shutdown, backend) = drive::effective(cfg, &DriveOverrides::default())?;
    // Same validation a drive session would hit.
    teleop_core::RunController::builder()
        .with_robot(teleop_hardware::SimulatedRobot::new())
        .with_loop(loop_cfg)
        .with_shutdown(shutdown)
        .build()?;
    let selected = drive::probe_backend(backend);
    if json {
        println!(
            "{}",
            serde_json::json!({
                "ok": true,
                "input_backend": selected,
                "tick_hz": loop_cfg.tick_hz,
                "alpha": loop_cfg.alpha,
                "flush_ticks": shutdown.flush_ticks,
            })
        );
    } else {
        println!("OK: config valid; input backend: {selected}");
    }
    Ok(())
}

/// Console layer on stderr (pretty or JSON), plus an optional JSON file sink.
/// `RUST_LOG` wins over `--log-level`, which wins over `[logging].level`.
fn init_tracing(
    cli_level: Option<&str>,
    json: bool,
    logging: &teleop_config::Logging,
) -> Option<WorkerGuard> {
    use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let level = cli_level
        .or(logging.level.as_deref())
        .unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let mut guard = None;
    let file_layer = logging.file.as_deref().and_then(|file| {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path.file_name()?;
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("warning: cannot create log dir {}: {e}", dir.display());
            return None;
        }
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, g) = tracing_appender::non_blocking(appender);
        guard = Some(g);
        Some(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .boxed(),
        )
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init();
    guard
}
