//! Drain/flush/stop behavior of the run controller, driven by a manual clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rstest::rstest;
use teleop_core::mocks::{FakeTerminal, RecordingRobot, ScriptedChars, ScriptedInput, Step};
use teleop_core::{
    Axis, Bindings, Command, InputSource, Phase, Poll, RawPoller, RunController, RunFlag,
    Session, ShutdownCfg, StopCause, TeleopError,
};
use teleop_traits::ManualClock;

fn controller(robot: RecordingRobot, clock: &ManualClock, session: Session) -> RunController {
    RunController::builder()
        .with_robot(robot)
        .with_clock(Box::new(clock.clone()))
        .with_session(session)
        .build()
        .expect("build controller")
}

fn no_input() -> Vec<Step> {
    Vec::new()
}

fn forward_then(last: Step) -> Vec<Step> {
    vec![
        Step::Command(Command::SetAxis(Axis::Vx, 0.7)),
        Step::Idle,
        Step::Idle,
        Step::Idle,
        last,
    ]
}

#[rstest]
fn flush_decays_monotonically_then_stops_once() {
    let clock = ManualClock::new();
    let robot = RecordingRobot::new();
    let mut ctl = controller(robot.clone(), &clock, Session::new());

    let input = ScriptedInput::new(clock.clone(), forward_then(Step::Command(Command::Quit)));
    let report = ctl.run(input).expect("clean run");

    assert_eq!(report.cause, StopCause::Quit);
    assert_eq!(report.flush_ticks, 10);
    assert!(!report.flush_interrupted);
    assert_eq!(ctl.phase(), Phase::Stopped);

    let log = robot.log();
    assert_eq!(log.stops, 1);
    assert_eq!(log.after_stop, 0);
    let run_ticks = report.ticks as usize;
    assert_eq!(log.commands.len(), run_ticks + 10);

    // Second dispatch is the first one that saw the forward target.
    assert!((log.commands[1].vx - 0.105).abs() < 1e-6);

    let mut prev = log.commands[run_ticks - 1].vx.abs();
    for cmd in &log.commands[run_ticks..] {
        assert!(cmd.vx.abs() < prev, "flush must strictly decay: {prev} -> {}", cmd.vx);
        assert_eq!(cmd.vy, 0.0);
        assert_eq!(cmd.wz, 0.0);
        prev = cmd.vx.abs();
    }
    assert!(prev < 0.7 * 0.85_f32.powi(10));
    assert_eq!(ctl.session().state.target().vx, 0.0);
}

#[rstest]
fn flush_ticks_are_spaced_by_the_interval() {
    let clock = ManualClock::new();
    let stamps = Arc::new(Mutex::new(Vec::new()));
    let (c, s) = (clock.clone(), stamps.clone());
    let robot = RecordingRobot::new().on_command(move |_| s.lock().unwrap().push(c.elapsed()));
    let mut ctl = RunController::builder()
        .with_robot(robot)
        .with_clock(Box::new(clock.clone()))
        .with_shutdown(ShutdownCfg {
            flush_ticks: 4,
            flush_interval: Duration::from_millis(20),
        })
        .build()
        .unwrap();

    let report = ctl
        .run(ScriptedInput::new(clock.clone(), [Step::Closed]))
        .unwrap();
    assert_eq!(report.cause, StopCause::InputClosed);

    let stamps = stamps.lock().unwrap();
    let flush = &stamps[report.ticks as usize..];
    assert_eq!(flush.len(), 4);
    for pair in flush.windows(2) {
        assert_eq!(pair[1] - pair[0], Duration::from_millis(20));
    }
}

#[rstest]
fn zero_flush_ticks_still_stops() {
    let clock = ManualClock::new();
    let robot = RecordingRobot::new();
    let mut ctl = RunController::builder()
        .with_robot(robot.clone())
        .with_clock(Box::new(clock.clone()))
        .with_shutdown(ShutdownCfg {
            flush_ticks: 0,
            flush_interval: Duration::from_millis(20),
        })
        .build()
        .unwrap();
    let report = ctl.run(ScriptedInput::new(clock, no_input())).unwrap();
    assert_eq!(report.flush_ticks, 0);
    assert_eq!(robot.log().stops, 1);
}

#[rstest]
fn second_interrupt_cuts_flush_short() {
    let clock = ManualClock::new();
    let session = Session::new();
    let flag = session.flag.clone();
    // Run tick is call 0; flush calls start at 1. Interrupt again after call 3.
    let robot = RecordingRobot::new().on_command(move |idx| {
        if idx == 3 {
            flag.interrupt();
        }
    });
    let mut ctl = controller(robot.clone(), &clock, session);

    let input = ScriptedInput::new(clock.clone(), [Step::Command(Command::Interrupt)]);
    let report = ctl.run(input).unwrap();

    assert_eq!(report.cause, StopCause::Interrupt);
    assert!(report.flush_interrupted);
    assert_eq!(report.flush_ticks, 3);
    assert_eq!(robot.log().stops, 1);
    assert_eq!(ctl.session().flag.interrupts(), 2);
}

#[rstest]
fn interrupt_before_run_skips_straight_to_drain() {
    let clock = ManualClock::new();
    let session = Session::new();
    session.flag.interrupt();
    let robot = RecordingRobot::new();
    let mut ctl = controller(robot.clone(), &clock, session);

    let report = ctl.run(ScriptedInput::new(clock, no_input())).unwrap();
    assert_eq!(report.ticks, 0);
    assert_eq!(report.cause, StopCause::Interrupt);
    // The interrupt was counted before draining began, so it does not cut the flush.
    assert_eq!(report.flush_ticks, 10);
    assert_eq!(robot.log().stops, 1);
}

#[rstest]
fn robot_fault_ends_session_and_is_reported() {
    let clock = ManualClock::new();
    let robot = RecordingRobot::new().failing_from(2);
    let mut ctl = controller(robot.clone(), &clock, Session::new());

    let err = ctl
        .run(ScriptedInput::new(clock.clone(), vec![Step::Idle; 10]))
        .expect_err("robot fault must surface");
    assert!(matches!(
        err.downcast_ref::<TeleopError>(),
        Some(TeleopError::Robot(_))
    ));

    let log = robot.log();
    // Calls 0 and 1 accepted, call 2 faulted, one flush attempt faulted.
    assert_eq!(log.commands.len(), 2);
    assert_eq!(log.calls, 4);
    assert_eq!(log.stops, 1);
    assert_eq!(ctl.session().flag.cause(), Some(StopCause::RobotFault));
    assert_eq!(ctl.phase(), Phase::Stopped);
}

#[rstest]
fn robot_fault_outranks_terminal_restore_failure() {
    let clock = ManualClock::new();
    let robot = RecordingRobot::new().failing_from(0);
    let mut ctl = controller(robot, &clock, Session::new());
    let input = ScriptedInput::new(clock.clone(), no_input()).failing_finish();
    let finished = input.finish_count();

    let err = ctl.run(input).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TeleopError>(),
        Some(TeleopError::Robot(_))
    ));
    assert_eq!(finished.load(std::sync::atomic::Ordering::Acquire), 1);
}

#[rstest]
fn stop_failure_is_reported() {
    let clock = ManualClock::new();
    let robot = RecordingRobot::new().failing_stop();
    let mut ctl = controller(robot.clone(), &clock, Session::new());
    let err = ctl.run(ScriptedInput::new(clock, no_input())).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TeleopError>(),
        Some(TeleopError::Robot(_))
    ));
    assert_eq!(robot.log().stops, 1);
}

#[rstest]
fn restore_failure_is_reported_after_stop() {
    let clock = ManualClock::new();
    let robot = RecordingRobot::new();
    let mut ctl = controller(robot.clone(), &clock, Session::new());
    let err = ctl
        .run(ScriptedInput::new(clock, no_input()).failing_finish())
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TeleopError>(),
        Some(TeleopError::Terminal(_))
    ));
    assert_eq!(robot.log().stops, 1);
}

#[rstest]
fn input_failure_is_treated_as_end_of_input() {
    let clock = ManualClock::new();
    let robot = RecordingRobot::new();
    let mut ctl = controller(robot.clone(), &clock, Session::new());
    let report = ctl
        .run(ScriptedInput::new(clock, [Step::Idle, Step::Fail]))
        .unwrap();
    assert_eq!(report.cause, StopCause::InputClosed);
    assert_eq!(robot.log().stops, 1);
}

#[rstest]
fn controller_runs_only_once() {
    let clock = ManualClock::new();
    let robot = RecordingRobot::new();
    let mut ctl = controller(robot.clone(), &clock, Session::new());
    ctl.run(ScriptedInput::new(clock.clone(), no_input())).unwrap();
    let err = ctl.run(ScriptedInput::new(clock, no_input())).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TeleopError>(),
        Some(TeleopError::State(_))
    ));
    assert_eq!(robot.log().stops, 1);
}

/// Ctrl-C ends the session, then a second Ctrl-C lands while the backend is
/// still being released.
struct InterruptedTwice {
    flag: Arc<RunFlag>,
}

impl InputSource for InterruptedTwice {
    fn poll_next(&mut self, _timeout: Duration) -> teleop_core::Result<Poll> {
        Ok(Poll::Command(Command::Interrupt))
    }

    fn finish(&mut self) -> teleop_core::Result<()> {
        self.flag.interrupt();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "interrupted-twice"
    }

    fn supports_strafe(&self) -> bool {
        false
    }
}

#[rstest]
fn interrupt_during_backend_release_cuts_flush() {
    let clock = ManualClock::new();
    let session = Session::new();
    let robot = RecordingRobot::new();
    let mut ctl = controller(robot.clone(), &clock, session.clone());

    let input = InterruptedTwice {
        flag: session.flag.clone(),
    };
    let report = ctl.run(input).unwrap();

    assert_eq!(report.cause, StopCause::Interrupt);
    assert_eq!(session.flag.interrupts(), 2);
    assert!(report.flush_interrupted);
    assert_eq!(report.flush_ticks, 0);
    assert_eq!(robot.log().stops, 1);
    assert_eq!(ctl.phase(), Phase::Stopped);
}

#[rstest]
fn abort_when_terminal_setup_fails_stops_robot_once() {
    let clock = ManualClock::new();
    let robot = RecordingRobot::new();
    let mut ctl = controller(robot.clone(), &clock, Session::new());

    let term = FakeTerminal::new(7).failing_enter();
    let opened = RawPoller::new(ScriptedChars::bytes(clock, b"w"), term, Bindings::default());
    let err = opened.err().expect("raw mode must fail");
    assert!(matches!(
        err.downcast_ref::<TeleopError>(),
        Some(TeleopError::Terminal(_))
    ));

    ctl.abort().unwrap();
    assert_eq!(ctl.phase(), Phase::Stopped);
    let log = robot.log();
    assert_eq!(log.stops, 1);
    assert!(log.commands.is_empty());
}

#[rstest]
fn abort_after_run_is_rejected() {
    let clock = ManualClock::new();
    let robot = RecordingRobot::new();
    let mut ctl = controller(robot.clone(), &clock, Session::new());
    ctl.run(ScriptedInput::new(clock, no_input())).unwrap();
    let err = ctl.abort().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TeleopError>(),
        Some(TeleopError::State(_))
    ));
    assert_eq!(robot.log().stops, 1);
}

#[rstest]
fn abort_surfaces_stop_failure() {
    let clock = ManualClock::new();
    let robot = RecordingRobot::new().failing_stop();
    let mut ctl = controller(robot.clone(), &clock, Session::new());
    let err = ctl.abort().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TeleopError>(),
        Some(TeleopError::Robot(_))
    ));
    assert_eq!(ctl.phase(), Phase::Stopped);
}
