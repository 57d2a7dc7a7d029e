use rate_governor::controller::RateController;
use rate_governor::host::{HostClock, ScalarClock};
use rate_governor::preset::{Direction, PresetSet};
use rate_governor::settings::{AdjustMode, OwnershipPolicy, Settings};

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}

fn controller_on(clock: &ScalarClock, settings: &Settings) -> RateController {
    RateController::new(settings, clock.get())
}

fn preset_settings(list: &str, initial: f32) -> Settings {
    Settings {
        adjust: AdjustMode::Presets,
        presets: PresetSet::parse(list),
        initial_percent: initial,
        ..Settings::default()
    }
}

#[test]
fn activation_applies_multiplier_to_observed_baseline() {
    let mut clock = ScalarClock::new(2.0);
    let mut c = controller_on(&clock, &Settings::default());

    c.on_toggle_pressed(&mut clock);

    assert!(c.is_active());
    assert!(approx(c.state().baseline, 2.0));
    assert!(approx(clock.get(), 0.6), "got {}", clock.get());
    assert!(approx(c.state().last_applied, clock.get()));
}

#[test]
fn second_reconcile_is_a_no_op() {
    let mut clock = ScalarClock::new(1.0);
    let mut c = controller_on(&clock, &Settings::default());
    c.on_toggle_pressed(&mut clock);

    let first = c.reconcile(&mut clock);
    let writes = clock.writes();
    let applied = c.state().last_applied;
    let second = c.reconcile(&mut clock);

    assert!(first.written.is_none());
    assert!(second.written.is_none());
    assert!(second.interference.is_none());
    assert_eq!(clock.writes(), writes);
    assert_eq!(c.state().last_applied, applied);
}

#[test]
fn external_change_is_absorbed_while_inactive() {
    let mut clock = ScalarClock::new(1.0);
    let mut c = controller_on(&clock, &Settings::default());

    clock.set(0.0);
    let outcome = c.reconcile(&mut clock);

    let event = outcome.interference.expect("pause should be seen as external");
    assert!(approx(event.observed, 0.0));
    assert!(approx(event.expected, 1.0));
    assert!(outcome.written.is_none(), "inactive controller must not fight the host");
    assert!(approx(c.state().baseline, 0.0));
    assert!(approx(clock.get(), 0.0));
    assert_eq!(c.interference_count(), 1);
}

#[test]
fn external_change_while_active_becomes_new_baseline() {
    let mut clock = ScalarClock::new(1.0);
    let mut c = controller_on(&clock, &Settings::default());
    c.on_toggle_pressed(&mut clock);

    clock.set(0.5);
    let outcome = c.reconcile(&mut clock);

    assert!(outcome.interference.is_some());
    assert!(approx(c.state().baseline, 0.5));
    assert!(approx(clock.get(), 0.15), "got {}", clock.get());

    c.on_toggle_pressed(&mut clock);
    assert!(!c.is_active());
    assert!(approx(clock.get(), 0.5), "release restores the absorbed baseline");
}

#[test]
fn host_pause_while_active_is_left_at_zero() {
    let mut clock = ScalarClock::new(1.0);
    let mut c = controller_on(&clock, &Settings::default());
    c.on_toggle_pressed(&mut clock);

    clock.set(0.0);
    c.reconcile(&mut clock);
    assert!(approx(clock.get(), 0.0));

    clock.set(1.0);
    c.reconcile(&mut clock);
    assert!(approx(clock.get(), 0.3));
}

#[test]
fn release_writes_baseline_back() {
    let mut clock = ScalarClock::new(1.25);
    let mut c = controller_on(&clock, &Settings::default());

    c.on_toggle_pressed(&mut clock);
    assert!(approx(clock.get(), 0.375));
    c.on_toggle_pressed(&mut clock);

    assert!(!c.is_active());
    assert!(approx(clock.get(), 1.25));
    assert!(approx(c.state().last_applied, 1.25));
}

#[test]
fn activation_near_slowed_value_falls_back_to_neutral_baseline() {
    let mut clock = ScalarClock::new(0.31);
    let mut c = controller_on(&clock, &Settings::default());

    c.on_toggle_pressed(&mut clock);

    assert!(approx(c.state().baseline, 1.0));
    assert!(approx(clock.get(), 0.3));
}

#[test]
fn set_active_is_idempotent() {
    let mut clock = ScalarClock::new(1.0);
    let mut c = controller_on(&clock, &Settings::default());

    assert!(!c.set_active(false, &mut clock));
    assert!(c.set_active(true, &mut clock));
    let writes = clock.writes();
    assert!(!c.set_active(true, &mut clock));
    assert_eq!(clock.writes(), writes);
}

#[test]
fn adjust_while_inactive_only_previews() {
    let mut clock = ScalarClock::new(1.0);
    let mut c = controller_on(&clock, &Settings::default());

    assert!(c.on_adjust_pressed(Direction::Decrease, &mut clock));

    assert_eq!(clock.writes(), 0);
    assert!(approx(clock.get(), 1.0));
    let snap = c.snapshot();
    assert!(!snap.active);
    assert!(approx(snap.preview_fraction, 1.0));
    assert!((snap.current_percentage - 25.2269).abs() < 1e-3);

    c.advance(0.75);
    assert!(approx(c.snapshot().preview_fraction, 0.5));
}

#[test]
fn adjust_while_active_reapplies_immediately() {
    let mut clock = ScalarClock::new(1.0);
    let mut c = controller_on(&clock, &Settings::default());
    c.on_toggle_pressed(&mut clock);

    c.on_adjust_pressed(Direction::Decrease, &mut clock);

    let expected = 0.3 * 0.840_896_4;
    assert!(approx(clock.get(), expected), "got {}", clock.get());
    assert!(approx(c.snapshot().preview_fraction, 0.0));
}

#[test]
fn scale_increase_saturates_at_full_rate() {
    let mut clock = ScalarClock::new(1.0);
    let settings = Settings {
        initial_percent: 50.0,
        ..Settings::default()
    };
    let mut c = controller_on(&clock, &settings);

    let mut prev = c.multiplier();
    for _ in 0..20 {
        c.on_adjust_pressed(Direction::Increase, &mut clock);
        let m = c.multiplier();
        assert!(m >= prev);
        assert!(m <= 1.0);
        prev = m;
    }
    assert_eq!(c.multiplier(), 1.0);
    assert!(!c.on_adjust_pressed(Direction::Increase, &mut clock));
}

#[test]
fn scale_decrease_never_goes_negative() {
    let mut clock = ScalarClock::new(1.0);
    let mut c = controller_on(&clock, &Settings::default());
    c.on_toggle_pressed(&mut clock);

    for _ in 0..60 {
        c.on_adjust_pressed(Direction::Decrease, &mut clock);
        assert!(c.multiplier() >= 0.0);
        assert!(clock.get() >= 0.0);
    }
    assert!(c.multiplier() < 0.001);
}

#[test]
fn preset_mode_steps_through_list() {
    let mut clock = ScalarClock::new(1.0);
    let mut c = controller_on(&clock, &preset_settings("50,65,80", 50.0));

    assert!(c.on_adjust_pressed(Direction::Increase, &mut clock));
    assert!(approx(c.multiplier(), 0.65));
    assert!(c.on_adjust_pressed(Direction::Increase, &mut clock));
    assert!(approx(c.multiplier(), 0.80));
    assert!(!c.on_adjust_pressed(Direction::Increase, &mut clock));
    assert!(approx(c.multiplier(), 0.80));
    assert!(c.on_adjust_pressed(Direction::Decrease, &mut clock));
    assert!(approx(c.multiplier(), 0.65));
}

#[test]
fn preset_mode_with_empty_list_is_inert() {
    let mut clock = ScalarClock::new(1.0);
    let mut c = controller_on(&clock, &preset_settings("", 40.0));

    assert!(!c.on_adjust_pressed(Direction::Increase, &mut clock));
    assert!(!c.on_adjust_pressed(Direction::Decrease, &mut clock));
    assert!(approx(c.multiplier(), 0.40));
    assert!(!c.preview().is_active());
}

#[test]
fn preset_mode_allows_speeding_up() {
    let mut clock = ScalarClock::new(1.0);
    let mut c = controller_on(&clock, &preset_settings("100,150,200", 100.0));
    c.on_toggle_pressed(&mut clock);

    c.on_adjust_pressed(Direction::Increase, &mut clock);

    assert!(approx(clock.get(), 1.5));
}

#[test]
fn in_charge_never_raises_a_paused_host() {
    let mut clock = ScalarClock::new(1.0);
    let settings = Settings {
        policy: OwnershipPolicy::InCharge,
        ..Settings::default()
    };
    let mut c = controller_on(&clock, &settings);
    c.on_toggle_pressed(&mut clock);

    clock.set(0.0);
    let outcome = c.reconcile(&mut clock);
    assert!(outcome.interference.is_some());
    assert!(outcome.written.is_none());
    assert!(approx(c.state().baseline, 1.0), "in-charge keeps its baseline");

    c.on_adjust_pressed(Direction::Increase, &mut clock);
    c.reconcile(&mut clock);
    assert!(approx(clock.get(), 0.0));
    assert_eq!(c.interference_count(), 1);
}

#[test]
fn in_charge_clamps_values_above_target() {
    let mut clock = ScalarClock::new(1.0);
    let settings = Settings {
        policy: OwnershipPolicy::InCharge,
        ..Settings::default()
    };
    let mut c = controller_on(&clock, &settings);
    c.on_toggle_pressed(&mut clock);

    clock.set(0.0);
    c.reconcile(&mut clock);
    clock.set(2.0);
    let outcome = c.reconcile(&mut clock);

    assert_eq!(outcome.written, Some(c.target()));
    assert!(approx(clock.get(), 0.3));
}

#[test]
fn in_charge_release_during_pause_keeps_host_value() {
    let mut clock = ScalarClock::new(1.0);
    let settings = Settings {
        policy: OwnershipPolicy::InCharge,
        ..Settings::default()
    };
    let mut c = controller_on(&clock, &settings);
    c.on_toggle_pressed(&mut clock);
    clock.set(0.0);
    c.reconcile(&mut clock);

    c.on_toggle_pressed(&mut clock);

    assert!(!c.is_active());
    assert!(approx(clock.get(), 0.0));
}

#[test]
fn overwrite_keeps_activation_baseline() {
    let mut clock = ScalarClock::new(1.0);
    let settings = Settings {
        policy: OwnershipPolicy::Overwrite,
        ..Settings::default()
    };
    let mut c = controller_on(&clock, &settings);
    c.on_toggle_pressed(&mut clock);

    clock.set(2.0);
    let outcome = c.reconcile(&mut clock);

    assert!(outcome.interference.is_some());
    assert!(approx(c.state().baseline, 1.0));
    assert!(approx(clock.get(), 0.3));

    c.on_toggle_pressed(&mut clock);
    assert!(approx(clock.get(), 1.0));
}

#[test]
fn non_finite_host_value_is_replaced() {
    let mut clock = ScalarClock::new(1.0);
    let mut c = controller_on(&clock, &Settings::default());

    clock.set(f32::NAN);
    let outcome = c.reconcile(&mut clock);

    assert!(outcome.interference.is_some());
    assert_eq!(outcome.written, Some(1.0));
    assert!(approx(clock.get(), 1.0));
}

#[test]
fn negative_host_value_is_clamped_to_zero() {
    let mut clock = ScalarClock::new(1.0);
    let mut c = controller_on(&clock, &Settings::default());

    clock.set(-2.0);
    c.reconcile(&mut clock);

    assert!(approx(clock.get(), 0.0));
    assert!(approx(c.state().baseline, 0.0));
}

#[test]
fn interference_is_queued_until_taken() {
    let mut clock = ScalarClock::new(1.0);
    let mut c = controller_on(&clock, &Settings::default());
    c.on_toggle_pressed(&mut clock);

    clock.set(0.5);
    c.on_adjust_pressed(Direction::Decrease, &mut clock);
    clock.set(0.8);
    c.on_toggle_pressed(&mut clock);

    let events = c.take_interference();
    assert_eq!(events.len(), 2);
    assert!(approx(events[0].observed, 0.5));
    assert!(approx(events[0].expected, 0.3));
    assert!(approx(events[1].observed, 0.8));
    assert!(c.take_interference().is_empty());
    assert_eq!(c.interference_count(), 2);
}
