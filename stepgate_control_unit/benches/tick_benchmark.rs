//! Tick benchmark: cost of one full gate tick (sample, map, sequence,
//! publish) and of the bare sequencer transition.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use stepgate_common::prelude::*;
use stepgate_control_unit::gate::StepDriverGate;
use stepgate_control_unit::sequencer::{SequencerState, transition};
use stepgate_hal::{AnalogWaveform, SimAnalogInput, SimClock, SimOutputBank};

fn bench_gate_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("gate_tick");

    for frequency_hz in [50u32, 1_000, 20_000] {
        let config = GateConfig {
            pulse: PulseTimingConfig {
                frequency_hz,
                ..PulseTimingConfig::default()
            },
            motor: MotorConfig {
                homing: false,
                ..MotorConfig::default()
            },
            ..GateConfig::default()
        };
        let analog = SimAnalogInput::new(
            &config.analog,
            AnalogWaveform::Triangle {
                low_mv: 0.0,
                high_mv: 5000.0,
                period_samples: 100_000,
            },
        );
        let Ok(mut gate) = StepDriverGate::new(config, analog, SimOutputBank::new(), SimClock::default())
        else {
            continue;
        };

        group.bench_with_input(
            BenchmarkId::from_parameter(frequency_hz),
            &frequency_hz,
            |b, _| {
                b.iter(|| {
                    gate.clock().advance(10);
                    black_box(gate.tick())
                })
            },
        );
    }

    group.finish();
}

fn bench_transition(c: &mut Criterion) {
    let timing = PulseTimingConfig::default();
    let mut state = SequencerState::new(Micros::ZERO);
    let mut now = Micros::ZERO;

    c.bench_function("sequencer_transition", |b| {
        b.iter(|| {
            now = now.wrapping_add(10);
            let (next, effects) = transition(state, Direction::Forward, now, &timing);
            state = next;
            black_box(effects)
        })
    });
}

criterion_group!(benches, bench_gate_tick, bench_transition);
criterion_main!(benches);
