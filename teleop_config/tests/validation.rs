use rstest::rstest;
use std::io::Write;
use teleop_config::{load_path, load_toml};

const FULL: &str = r#"
[scales]
vx = 0.7
vy = 0.6
wz = 0.7

[smoothing]
alpha = 0.15

[loop]
tick_hz = 50
poll_timeout_ms = 50
observe_state = false

[shutdown]
flush_ticks = 10
flush_interval_ms = 20

[input]
backend = "events"
channel_capacity = 8

[keys]
forward = "i"
back = "k"
yaw_left = "j"
yaw_right = "l"
strafe_left = "u"
strafe_right = "o"
halt = "m"

[logging]
rotation = "daily"
"#;

#[test]
fn accepts_full_config() {
    let cfg = load_toml(FULL).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.keys.forward, 'i');
    assert!(!cfg.control_loop.observe_state);
    assert_eq!(cfg.input.channel_capacity, 8);
}

#[rstest]
#[case("[smoothing]\nalpha = 0.0\n", "smoothing.alpha must be in (0.0, 1.0]")]
#[case("[smoothing]\nalpha = 1.5\n", "smoothing.alpha must be in (0.0, 1.0]")]
#[case("[loop]\ntick_hz = 0\n", "loop.tick_hz must be > 0")]
#[case("[loop]\npoll_timeout_ms = 0\n", "loop.poll_timeout_ms must be >= 1")]
#[case("[scales]\nvy = 0.0\n", "scales.vy must be in (0.0, 1.0]")]
#[case("[scales]\nwz = 1.2\n", "scales.wz must be in (0.0, 1.0]")]
#[case("[input]\nchannel_capacity = 0\n", "input.channel_capacity must be >= 1")]
#[case("[keys]\nhalt = \"W\"\n", "keys.halt duplicates keys.forward")]
#[case("[keys]\nforward = \" \"\n", "keys.forward must be a printable")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation must be one of")]
fn rejects_out_of_range(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    assert!(
        format!("{err}").contains(needle),
        "expected '{needle}' in '{err}'"
    );
}

#[test]
fn alpha_of_one_is_allowed() {
    let cfg = load_toml("[smoothing]\nalpha = 1.0\n").expect("parse TOML");
    cfg.validate().expect("alpha = 1 disables filtering but is valid");
}

#[test]
fn unknown_backend_is_a_parse_error() {
    assert!(load_toml("[input]\nbackend = \"joystick\"\n").is_err());
}

#[test]
fn load_path_reads_and_validates() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("teleop.toml");
    let mut f = std::fs::File::create(&path).expect("create");
    writeln!(f, "[loop]\ntick_hz = 0").expect("write");
    let err = load_path(&path).expect_err("invalid file");
    assert!(format!("{err}").contains("tick_hz"));

    let missing = dir.path().join("nope.toml");
    let err = load_path(&missing).expect_err("missing file");
    assert!(format!("{err}").contains("read config"));
}
