//! # StepGate
//!
//! Runs a step-driver gate against the simulation collaborators: a
//! constant or swept analog input, a recording output bank with a stepper
//! driver model, and the system microsecond clock.

use clap::Parser;
use stepgate_common::config::{ConfigError, LogLevel, StepGateConfig, load_config};
use stepgate_common::consts::DEFAULT_CONFIG_PATH;
use stepgate_control_unit::cycle::{CycleRunner, rt_setup};
use stepgate_control_unit::gate::StepDriverGate;
use stepgate_hal::{AnalogWaveform, SimAnalogInput, SimOutputBank, StepperModel, SystemClock};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::Ordering;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// StepGate: analog position follower for step/direction drivers
#[derive(Parser, Debug)]
#[command(name = "stepgate")]
#[command(version)]
#[command(about = "Non-blocking step pulse sequencer following an analog input")]
struct Args {
    /// Path to the configuration TOML. Defaults apply when the file is missing.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Stop after this many ticks (default: run until Ctrl-C).
    #[arg(long)]
    ticks: Option<u64>,

    /// Constant simulated input voltage [mV].
    #[arg(long, default_value_t = 2750.0)]
    input_mv: f32,

    /// Sweep the input across the analog band with this period [ms]
    /// instead of holding `--input-mv`.
    #[arg(long, value_name = "MS")]
    sweep_period_ms: Option<u32>,

    /// CPU core to pin the loop to (rt feature only).
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority (rt feature only).
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let (config, load_error) = match load_config(&args.config) {
        Ok(config) => (config, None),
        Err(e) => (StepGateConfig::default(), Some(e)),
    };
    setup_tracing(&args, config.shared.log_level);

    info!("StepGate v{} starting...", env!("CARGO_PKG_VERSION"));

    match load_error {
        None => info!("Loaded config from {}", args.config.display()),
        Some(ConfigError::FileNotFound) => warn!(
            "Config '{}' not found, using defaults",
            args.config.display()
        ),
        Some(e) => {
            error!("FATAL: {e}");
            process::exit(1);
        }
    }

    if let Err(e) = run(&args, &config) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("StepGate shutdown complete");
}

fn run(args: &Args, config: &StepGateConfig) -> Result<(), Box<dyn std::error::Error>> {
    let gate_config = config.gate();
    info!(
        "Config OK: service={}, max_steps={}, {} Hz, tick={}µs",
        config.shared.service_name,
        gate_config.motor.max_steps,
        gate_config.pulse.frequency_hz,
        config.runner.tick_period_us,
    );

    let waveform = match args.sweep_period_ms {
        Some(ms) => AnalogWaveform::Triangle {
            low_mv: gate_config.analog.min_mv,
            high_mv: gate_config.analog.max_mv,
            period_samples: (ms.saturating_mul(1_000) / config.runner.tick_period_us).max(2),
        },
        None => AnalogWaveform::Constant { mv: args.input_mv },
    };
    let analog = SimAnalogInput::new(&gate_config.analog, waveform);
    let driver = StepperModel::new(gate_config.lines, i64::from(gate_config.motor.max_steps));
    let outputs = SimOutputBank::with_stepper(driver);

    let gate = StepDriverGate::new(gate_config, analog, outputs, SystemClock::new())?;

    rt_setup(args.cpu_core, args.rt_priority)?;
    info!(
        "RT setup complete (cpu_core={}, priority={})",
        args.cpu_core, args.rt_priority
    );

    let mut runner = CycleRunner::new(gate, &config.runner)?.with_tick_limit(args.ticks);

    let running = runner.running_flag();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    runner.run()?;

    let gate = runner.gate();
    match gate.outputs().stepper() {
        Some(driver) => info!(
            "Final position: tracked={} driver={} ({} steps, {} ignored edges)",
            gate.position(),
            driver.position(),
            driver.steps(),
            driver.ignored_edges()
        ),
        None => info!("Final position: tracked={}", gate.position()),
    }

    Ok(())
}

/// Setup tracing subscriber from CLI arguments and the configured level.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        LogLevel::Debug
    } else {
        configured
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
