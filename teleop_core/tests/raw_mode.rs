//! The terminal leaves raw mode on every exit path of the raw poller.

use std::sync::{Arc, Mutex};

use rstest::rstest;
use teleop_core::bindings::{ESC, ETX};
use teleop_core::mocks::{FakeTerminal, RAW_CONFIG, RecordingRobot, ScriptedChars};
use teleop_core::{
    Axis, Bindings, Command, InputSource, Poll, RawModeGuard, RawPoller, RunController, StopCause,
    TeleopError,
};
use teleop_traits::{ByteRead, ManualClock};

const COOKED: u32 = 7;

fn poller(
    term: &FakeTerminal,
    bytes: &[u8],
) -> RawPoller<ScriptedChars<ManualClock>, FakeTerminal> {
    RawPoller::new(
        ScriptedChars::bytes(ManualClock::new(), bytes),
        term.clone(),
        Bindings::default(),
    )
    .expect("enter raw mode")
}

#[rstest]
fn poller_holds_raw_mode_until_finished() {
    let term = FakeTerminal::new(COOKED);
    let mut p = poller(&term, b"w");
    assert_eq!(term.config(), RAW_CONFIG);

    let first = p.poll_next(std::time::Duration::from_millis(50)).unwrap();
    assert_eq!(first, Poll::Command(Command::SetAxis(Axis::Vx, 0.7)));
    assert_eq!(
        p.poll_next(std::time::Duration::from_millis(50)).unwrap(),
        Poll::Closed
    );
    assert_eq!(term.config(), RAW_CONFIG);

    p.finish().unwrap();
    assert_eq!(term.config(), COOKED);
    drop(p);
    assert_eq!(term.restores(), 1, "release and drop restore exactly once");
}

#[rstest]
fn drop_restores_without_finish() {
    let term = FakeTerminal::new(COOKED);
    drop(poller(&term, b""));
    assert_eq!(term.config(), COOKED);
    assert_eq!(term.restores(), 1);
}

#[rstest]
fn panic_while_polling_restores_terminal() {
    let term = FakeTerminal::new(COOKED);
    let t = term.clone();
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
        let _p = poller(&t, b"ww");
        panic!("operator code panicked");
    }));
    assert!(outcome.is_err());
    assert_eq!(term.config(), COOKED);
}

#[rstest]
fn timeouts_and_unbound_bytes_are_idle() {
    let term = FakeTerminal::new(COOKED);
    let clock = ManualClock::new();
    let chars = ScriptedChars::new(
        clock.clone(),
        [ByteRead::Timeout, ByteRead::Byte(b'z'), ByteRead::Byte(ESC)],
    );
    let mut p = RawPoller::new(chars, term.clone(), Bindings::default()).unwrap();
    let wait = std::time::Duration::from_millis(50);
    assert_eq!(p.poll_next(wait).unwrap(), Poll::Idle);
    assert_eq!(clock.elapsed(), wait);
    assert_eq!(p.poll_next(wait).unwrap(), Poll::Idle);
    assert_eq!(p.poll_next(wait).unwrap(), Poll::Command(Command::Quit));
}

#[rstest]
fn enter_failure_is_a_terminal_error() {
    let term = FakeTerminal::new(COOKED).failing_enter();
    let err = RawPoller::new(
        ScriptedChars::bytes(ManualClock::new(), b""),
        term.clone(),
        Bindings::default(),
    )
    .err()
    .expect("raw mode must fail");
    assert!(matches!(
        err.downcast_ref::<TeleopError>(),
        Some(TeleopError::Terminal(_))
    ));
    assert_eq!(term.config(), COOKED);
}

#[rstest]
fn restore_failure_surfaces_once() {
    let term = FakeTerminal::new(COOKED).failing_restore();
    let mut guard = RawModeGuard::acquire(term.clone()).unwrap();
    assert!(guard.is_held());
    let err = guard.release().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TeleopError>(),
        Some(TeleopError::Terminal(_))
    ));
    assert!(!guard.is_held());
    guard.release().unwrap();
    drop(guard);
    assert_eq!(term.restores(), 1);
}

#[rstest]
fn interrupt_restores_terminal_before_flush() {
    let term = FakeTerminal::new(COOKED);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (t, s) = (term.clone(), seen.clone());
    let robot = RecordingRobot::new().on_command(move |_| s.lock().unwrap().push(t.config()));
    let clock = ManualClock::new();
    let mut ctl = RunController::builder()
        .with_robot(robot.clone())
        .with_clock(Box::new(clock.clone()))
        .build()
        .unwrap();

    let chars = ScriptedChars::bytes(clock, &[b'w', ETX]);
    let input = RawPoller::new(chars, term.clone(), Bindings::default()).unwrap();
    let report = ctl.run(input).unwrap();

    assert_eq!(report.cause, StopCause::Interrupt);
    assert_eq!(term.config(), COOKED);
    let seen = seen.lock().unwrap();
    let run_ticks = report.ticks as usize;
    assert!(seen[..run_ticks].iter().all(|c| *c == RAW_CONFIG));
    assert!(seen[run_ticks..].iter().all(|c| *c == COOKED));
    assert_eq!(robot.log().stops, 1);
}
