//! Fixed-rate tick loop around a [`StepDriverGate`].
//!
//! The gate itself never sleeps; this runner is the outer scheduler that
//! calls [`StepDriverGate::tick`] every `tick_period_us`, keeps timing
//! statistics and stops when the shared `running` flag drops or a tick
//! limit is reached.
//!
//! ## RT Setup Sequence
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)`: lock all pages.
//! 2. Prefault stack pages.
//! 3. `sched_setaffinity`: pin to one CPU core.
//! 4. `sched_setscheduler(SCHED_FIFO, prio)`.
//!
//! All four are no-ops without the `rt` feature.
//!
//! ## Pacing
//! With `rt`, absolute-time `clock_nanosleep(TIMER_ABSTIME)` on
//! `CLOCK_MONOTONIC`; otherwise `std::thread::sleep` for the remainder of
//! the period. An overrun is counted, never fatal: late ticks are absorbed
//! by the sequencer's elapsed-time comparisons.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use stepgate_common::config::{ConfigError, RunnerConfig};
use stepgate_common::gate::error::GateError;
use stepgate_common::hal::{AnalogInput, DigitalOutput, MonotonicClock};
use thiserror::Error;
use tracing::{info, warn};

use crate::gate::StepDriverGate;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-tick timing statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleStats {
    /// Total ticks executed.
    pub cycle_count: u64,
    /// Last tick duration [µs].
    pub last_tick_us: u32,
    /// Minimum tick duration [µs].
    pub min_tick_us: u32,
    /// Maximum tick duration [µs].
    pub max_tick_us: u32,
    /// Running sum for average computation.
    pub sum_tick_us: u64,
    /// Ticks that took longer than the tick period.
    pub overruns: u64,
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleStats {
    /// Create a new zeroed stats instance.
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_tick_us: 0,
            min_tick_us: u32::MAX,
            max_tick_us: 0,
            sum_tick_us: 0,
            overruns: 0,
        }
    }

    /// Record a tick duration. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration_us: u32) {
        self.cycle_count += 1;
        self.last_tick_us = duration_us;
        self.min_tick_us = self.min_tick_us.min(duration_us);
        self.max_tick_us = self.max_tick_us.max(duration_us);
        self.sum_tick_us += u64::from(duration_us);
    }

    /// Average tick time [µs] (0 if no ticks).
    #[inline]
    pub fn avg_tick_us(&self) -> u64 {
        self.sum_tick_us.checked_div(self.cycle_count).unwrap_or(0)
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

/// Errors during RT setup or runner construction.
#[derive(Debug, Error)]
pub enum CycleError {
    /// RT system call failed.
    #[error("RT setup error: {0}")]
    RtSetup(String),

    /// Runner configuration rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Gate construction or reconfiguration failed.
    #[error(transparent)]
    Gate(#[from] GateError),
}

// ─── RT Setup ───────────────────────────────────────────────────────

/// Lock all current and future memory pages.
#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), CycleError> {
    use nix::sys::mman::{MlockallFlags, mlockall};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), CycleError> {
    Ok(())
}

/// Touch 256 KiB of stack so the loop never faults on it.
fn prefault_stack() {
    let mut buf = [0u8; 256 * 1024];
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, exclusive reference into `buf`.
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

/// Pin the current thread to `cpu`.
#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), CycleError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| CycleError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| CycleError::RtSetup(format!("sched_setaffinity failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), CycleError> {
    Ok(())
}

/// Switch to `SCHED_FIFO` at `priority`.
#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), CycleError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` outlives the call; pid 0 is the calling thread.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(CycleError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), CycleError> {
    Ok(())
}

/// Full RT setup sequence; call before [`CycleRunner::run`].
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    Ok(())
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// Owns a gate and ticks it at a fixed rate.
pub struct CycleRunner<A, O, C> {
    gate: StepDriverGate<A, O, C>,
    stats: CycleStats,
    tick_period_us: u32,
    status_interval: u64,
    max_ticks: Option<u64>,
    running: Arc<AtomicBool>,
}

impl<A, O, C> CycleRunner<A, O, C>
where
    A: AnalogInput,
    O: DigitalOutput,
    C: MonotonicClock,
{
    /// Runner for `gate` paced by `config`.
    pub fn new(gate: StepDriverGate<A, O, C>, config: &RunnerConfig) -> Result<Self, CycleError> {
        config.validate()?;
        Ok(Self {
            gate,
            stats: CycleStats::new(),
            tick_period_us: config.tick_period_us,
            status_interval: config.status_interval,
            max_ticks: None,
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Stop after `limit` ticks (`None` runs until the flag drops).
    pub fn with_tick_limit(mut self, limit: Option<u64>) -> Self {
        self.max_ticks = limit;
        self
    }

    /// Flag that keeps the loop alive; store `false` to stop it.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Timing statistics so far.
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// The driven gate.
    pub fn gate(&self) -> &StepDriverGate<A, O, C> {
        &self.gate
    }

    /// The driven gate, mutably.
    pub fn gate_mut(&mut self) -> &mut StepDriverGate<A, O, C> {
        &mut self.gate
    }

    /// Give the gate back.
    pub fn into_gate(self) -> StepDriverGate<A, O, C> {
        self.gate
    }

    /// Tick until stopped, then drop the driver outputs.
    pub fn run(&mut self) -> Result<(), CycleError> {
        info!(
            "Runner started: tick {} µs, limit {:?}",
            self.tick_period_us, self.max_ticks
        );

        #[cfg(feature = "rt")]
        self.run_rt_loop()?;

        #[cfg(not(feature = "rt"))]
        self.run_sim_loop();

        self.gate.stop();
        info!(
            "Runner stopped after {} ticks (avg {} µs, max {} µs, {} overruns)",
            self.stats.cycle_count,
            self.stats.avg_tick_us(),
            self.stats.max_tick_us,
            self.stats.overruns
        );
        Ok(())
    }

    /// Whether another tick should run.
    fn should_continue(&self) -> bool {
        self.running.load(Ordering::SeqCst)
            && self.max_ticks.is_none_or(|limit| self.stats.cycle_count < limit)
    }

    /// One tick plus bookkeeping.
    fn cycle_body(&mut self) {
        let report = self.gate.tick();
        self.stats.record(report.duration_us);

        if report.duration_us > self.tick_period_us {
            self.stats.overruns += 1;
            if self.stats.overruns == 1 {
                warn!(
                    "Tick overrun: {} µs > {} µs period",
                    report.duration_us, self.tick_period_us
                );
            }
        }

        if self.status_interval > 0 && self.stats.cycle_count % self.status_interval == 0 {
            info!(
                "tick={} position={} target={} voltage={:.0}mV homing={} phase={:?}",
                self.stats.cycle_count,
                report.position,
                report.target,
                self.gate.voltage_mv(),
                self.gate.is_homing(),
                self.gate.phase()
            );
        }
    }

    /// Sleep-based loop.
    #[cfg(not(feature = "rt"))]
    fn run_sim_loop(&mut self) {
        use std::time::{Duration, Instant};

        let period = Duration::from_micros(u64::from(self.tick_period_us));

        while self.should_continue() {
            let cycle_start = Instant::now();
            self.cycle_body();
            if let Some(remaining) = period.checked_sub(cycle_start.elapsed()) {
                std::thread::sleep(remaining);
            }
        }
    }

    /// Absolute-time loop on `CLOCK_MONOTONIC`.
    #[cfg(feature = "rt")]
    fn run_rt_loop(&mut self) -> Result<(), CycleError> {
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let period_ns = i64::from(self.tick_period_us) * 1_000;
        let mut next_wake = clock_gettime(clock)
            .map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))?;

        while self.should_continue() {
            next_wake = timespec_add_ns(next_wake, period_ns);
            self.cycle_body();
            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
        }
        Ok(())
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

/// Add nanoseconds to a TimeSpec.
#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let mut secs = ts.tv_sec();
    let mut nanos = ts.tv_nsec() + ns;
    while nanos >= 1_000_000_000 {
        secs += 1;
        nanos -= 1_000_000_000;
    }
    TimeSpec::new(secs, nanos)
}

// ─── Tests ──────────────────────────────────────────────────────────
