//! Algebraic laws of the velocity record and the smoothing step.

use proptest::prelude::*;
use teleop_core::state::smooth;
use teleop_core::{Axis, VelocityCommand, VelocityState};

fn unit() -> impl Strategy<Value = f32> {
    -1.0f32..=1.0
}

fn alpha() -> impl Strategy<Value = f32> {
    0.01f32..=1.0
}

proptest! {
    #[test]
    fn step_follows_exponential_formula(cur in unit(), target in unit(), a in alpha()) {
        let next = smooth(cur, target, a);
        let expected = cur + (target - cur) * a;
        prop_assert!((next - expected).abs() <= 1e-6);
    }

    #[test]
    fn dispatched_values_stay_in_range(
        targets in proptest::collection::vec(-5.0f32..5.0, 1..40),
        a in alpha(),
    ) {
        let s = VelocityState::new();
        for t in targets {
            s.set_target(Axis::Vy, t);
            let c = s.read_and_advance(a);
            prop_assert!((-1.0..=1.0).contains(&c.vy));
        }
    }

    #[test]
    fn out_of_range_targets_store_exactly_unit(m in 1.0f32..1e6) {
        let s = VelocityState::new();
        s.set_target(Axis::Vx, m);
        prop_assert_eq!(s.target().vx, 1.0);
        s.set_target(Axis::Vx, -m);
        prop_assert_eq!(s.target().vx, -1.0);
    }

    #[test]
    fn target_is_a_fixed_point(t in unit(), a in alpha()) {
        prop_assert_eq!(smooth(t, t, a), t);
    }

    #[test]
    fn each_step_closes_the_gap(cur in unit(), target in unit(), a in 0.01f32..1.0) {
        let next = smooth(cur, target, a);
        prop_assert!((target - next).abs() <= (target - cur).abs() + 1e-6);
    }
}

#[test]
fn one_tick_from_rest_reaches_0_105() {
    let s = VelocityState::new();
    s.set_targets(VelocityCommand::new(0.7, 0.0, 0.0));
    let c = s.read_and_advance(0.15);
    assert!((c.vx - 0.105).abs() < 1e-6);
    assert_eq!(s.current(), c);
}

#[test]
fn zero_target_decays_strictly_for_ten_ticks() {
    let s = VelocityState::new();
    s.set_target(Axis::Vx, 0.7);
    s.read_and_advance(0.15);
    s.zero_targets();
    let mut prev = s.current().vx.abs();
    for _ in 0..10 {
        let c = s.read_and_advance(0.15);
        assert!(c.vx.abs() < prev);
        prev = c.vx.abs();
    }
    assert!(prev < 0.7 * 0.85_f32.powi(10));
}

#[test]
fn alpha_one_jumps_to_target() {
    let s = VelocityState::new();
    s.set_targets(VelocityCommand::new(0.5, -0.25, 1.0));
    assert_eq!(s.read_and_advance(1.0), VelocityCommand::new(0.5, -0.25, 1.0));
}
