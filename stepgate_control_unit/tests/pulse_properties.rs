//! Property tests for the pulse sequencer, the mapper and the gate.

use proptest::prelude::*;

use stepgate_common::prelude::*;
use stepgate_control_unit::gate::StepDriverGate;
use stepgate_control_unit::mapper::target_for_voltage;
use stepgate_control_unit::sequencer::{Effects, PulseSequencer, SequencerState, transition};
use stepgate_control_unit::tracker::PositionTracker;
use stepgate_hal::{SimAnalogInput, SimClock, SimOutputBank};

// -- Strategy helpers --

fn arb_timing() -> impl Strategy<Value = PulseTimingConfig> {
    (1_000u32..=50_000, 1u32..=50, 1u32..=50).prop_map(|(frequency_hz, high, low)| {
        PulseTimingConfig {
            frequency_hz,
            high_time_us: high,
            low_time_us: low,
        }
    })
}

fn arb_request() -> impl Strategy<Value = Option<Direction>> {
    prop_oneof![
        3 => Just(Some(Direction::Forward)),
        3 => Just(Some(Direction::Reverse)),
        1 => Just(None),
    ]
}

/// Runs of one request held for a number of ticks, each tick `dt` µs apart.
fn arb_schedule() -> impl Strategy<Value = Vec<(Option<Direction>, Vec<u32>)>> {
    prop::collection::vec(
        (arb_request(), prop::collection::vec(1u32..=100, 1..200)),
        1..20,
    )
}

fn arb_band() -> impl Strategy<Value = AnalogConfig> {
    (0.0f32..2000.0, 1.0f32..5000.0).prop_map(|(min_mv, span)| AnalogConfig {
        min_mv,
        max_mv: min_mv + span,
        ..AnalogConfig::default()
    })
}

proptest! {
    /// The stateful sequencer is exactly the pure transition, and every
    /// emitted pulse has the configured shape.
    #[test]
    fn pulse_shape_and_settle(
        timing in arb_timing(),
        max_steps in 1u32..50,
        start in any::<u32>(),
        schedule in arb_schedule(),
    ) {
        let mut now = Micros(start);
        let mut seq = PulseSequencer::new(timing, now).unwrap();
        let mut tracker = PositionTracker::new(max_steps).unwrap();
        let mut state = SequencerState::new(now);

        let mut last_low = now;
        let mut last_reset = now;
        let mut last_rise: Option<Micros> = None;
        let mut rose = false;
        let mut fell = false;
        let mut committed = false;

        for (request, gaps) in schedule {
            for dt in gaps {
                now = now.wrapping_add(dt);
                let before = tracker.current();

                let (next, effects) = match request {
                    Some(direction) => transition(state, direction, now, &timing),
                    None => (state, Effects::default()),
                };
                let levels = seq.advance(request, now, &mut tracker);
                prop_assert_eq!(seq.state(), next);
                prop_assert_eq!(levels, next.levels());

                // Bounds, and at most one step per tick.
                prop_assert!(tracker.current() <= max_steps);
                prop_assert!(tracker.current().abs_diff(before) <= 1);

                if effects.reversed {
                    // Immediate reset, line dropped in the same tick.
                    prop_assert_eq!(next.phase, PulsePhase::Active);
                    prop_assert!(!next.signal);
                    prop_assert_eq!(effects.edge.is_some(), state.signal);
                    prop_assert_eq!(Some(next.direction), request);
                    last_reset = now;
                    last_low = now;
                    rose = false;
                    fell = false;
                    committed = false;
                }

                match effects.edge {
                    Some(Edge::Rising) => {
                        if committed {
                            prop_assert!(now.since(last_low) >= timing.low_time_us);
                        }
                        prop_assert!(now.since(last_reset) >= timing.period_us());
                        if let Some(prev) = last_rise {
                            prop_assert!(now.since(prev) >= timing.period_us());
                        }
                        last_rise = Some(now);
                        rose = true;
                        fell = false;
                    }
                    Some(Edge::Falling) if !effects.reversed => {
                        let rise = last_rise.unwrap();
                        prop_assert!(now.since(rise) >= timing.high_time_us);
                        last_low = now;
                        fell = rose;
                    }
                    _ => {}
                }

                if let Some(direction) = effects.commit {
                    // A commit needs its own full cycle since the last reset.
                    prop_assert!(rose && fell);
                    prop_assert!(now.since(last_low) >= timing.low_time_us);
                    prop_assert_eq!(Some(direction), request);
                    rose = false;
                    fell = false;
                    committed = true;
                } else {
                    prop_assert_eq!(tracker.current(), before);
                }

                state = next;
            }
        }
    }

    /// Inside the band the target never decreases with voltage and never
    /// exceeds the range.
    #[test]
    fn mapping_is_monotonic_inside_band(
        analog in arb_band(),
        max_steps in 1u32..1000,
        a in 0.0f32..=1.0,
        b in 0.0f32..=1.0,
    ) {
        let span = analog.max_mv - analog.min_mv;
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let v1 = (analog.min_mv + span * lo).clamp(analog.min_mv, analog.max_mv);
        let v2 = (analog.min_mv + span * hi).clamp(analog.min_mv, analog.max_mv);

        let t1 = target_for_voltage(v1, &analog, max_steps);
        let t2 = target_for_voltage(v2, &analog, max_steps);
        prop_assert!(t1 <= t2);
        prop_assert!(t2 <= max_steps);
    }

    #[test]
    fn mapping_outside_band_is_zero(
        analog in arb_band(),
        max_steps in 1u32..1000,
        below in 0.01f32..1000.0,
        above in 0.01f32..1000.0,
    ) {
        prop_assert_eq!(target_for_voltage(analog.min_mv - below, &analog, max_steps), 0);
        prop_assert_eq!(target_for_voltage(analog.max_mv + above, &analog, max_steps), 0);
    }

    /// Whatever the input does, the gate keeps its position in range.
    #[test]
    fn gate_position_stays_in_range(
        raws in prop::collection::vec(0u16..=1023, 1..30),
        max_steps in 1u32..300,
        homing in any::<bool>(),
        dt in 1u32..2_000,
    ) {
        let mut config = GateConfig::default();
        config.pulse = PulseTimingConfig::new(10_000, 5, 5).unwrap();
        config.motor.max_steps = max_steps;
        config.motor.homing = homing;

        let mut gate = StepDriverGate::new(
            config,
            SimAnalogInput::raw(&config.analog, 0),
            SimOutputBank::new(),
            SimClock::default(),
        )
        .unwrap();

        for raw in raws {
            gate.analog_mut().set_raw(raw);
            for _ in 0..50 {
                gate.clock().advance(dt);
                let report = gate.tick();
                prop_assert!(report.position <= max_steps);
                prop_assert!(report.target <= max_steps);
            }
        }
    }

    /// From any input, homing only ever moves towards 0 and ends there.
    #[test]
    fn homing_is_monotonic(raw in 0u16..=1023, max_steps in 1u32..200) {
        let mut config = GateConfig::default();
        config.pulse = PulseTimingConfig::new(50_000, 5, 5).unwrap();
        config.motor.max_steps = max_steps;

        let mut gate = StepDriverGate::new(
            config,
            SimAnalogInput::raw(&config.analog, raw),
            SimOutputBank::new(),
            SimClock::default(),
        )
        .unwrap();

        let mut last = gate.position();
        let mut ticks = 0u32;
        while gate.is_homing() {
            gate.clock().advance(10);
            let report = gate.tick();
            prop_assert!(report.position <= last);
            last = report.position;
            ticks += 1;
            prop_assert!(ticks < 100_000);
        }
        prop_assert_eq!(gate.position(), 0);
    }
}
