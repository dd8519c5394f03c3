//! Simulated analog input.
//!
//! Produces one raw converter sample per read from a configurable
//! waveform, quantized the way a real ADC of the given full scale would.

use stepgate_common::gate::config::AnalogConfig;
use stepgate_common::hal::AnalogInput;
use tracing::debug;

/// Signal shape produced by [`SimAnalogInput`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnalogWaveform {
    /// A fixed raw converter count.
    Raw(u16),
    /// A fixed voltage [mV].
    Constant {
        /// Voltage [mV].
        mv: f32,
    },
    /// Linear up/down sweep between two voltages.
    Triangle {
        /// Voltage at the start and end of each period [mV].
        low_mv: f32,
        /// Voltage at mid-period [mV].
        high_mv: f32,
        /// Samples per full up/down period.
        period_samples: u32,
    },
}

/// Analog input simulator.
#[derive(Debug, Clone)]
pub struct SimAnalogInput {
    /// Current waveform
    waveform: AnalogWaveform,
    /// Converter full-scale count
    full_scale_count: u16,
    /// Voltage at full scale [mV]
    full_scale_mv: f32,
    /// Number of samples taken so far
    samples: u64,
}

impl SimAnalogInput {
    /// Create a simulator quantizing to the given converter scaling.
    pub fn new(config: &AnalogConfig, waveform: AnalogWaveform) -> Self {
        Self {
            waveform,
            full_scale_count: config.full_scale_count,
            full_scale_mv: config.full_scale_mv,
            samples: 0,
        }
    }

    /// Simulator holding a fixed raw count.
    pub fn raw(config: &AnalogConfig, raw: u16) -> Self {
        Self::new(config, AnalogWaveform::Raw(raw))
    }

    /// Simulator holding a fixed voltage.
    pub fn constant_mv(config: &AnalogConfig, mv: f32) -> Self {
        Self::new(config, AnalogWaveform::Constant { mv })
    }

    /// Replace the waveform. The sample counter restarts.
    pub fn set_waveform(&mut self, waveform: AnalogWaveform) {
        debug!("Analog waveform -> {:?}", waveform);
        self.waveform = waveform;
        self.samples = 0;
    }

    /// Hold a fixed raw count.
    pub fn set_raw(&mut self, raw: u16) {
        self.set_waveform(AnalogWaveform::Raw(raw));
    }

    /// Hold a fixed voltage.
    pub fn set_millivolts(&mut self, mv: f32) {
        self.set_waveform(AnalogWaveform::Constant { mv });
    }

    /// Current waveform.
    pub fn waveform(&self) -> AnalogWaveform {
        self.waveform
    }

    /// Number of samples read so far.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Quantize a voltage to the nearest raw count, clamped to full scale.
    pub fn raw_for_mv(&self, mv: f32) -> u16 {
        let counts = mv / self.full_scale_mv * self.full_scale_count as f32;
        counts.round().clamp(0.0, self.full_scale_count as f32) as u16
    }

    /// Voltage of the waveform at sample `index` [mV].
    fn level_mv(&self, index: u64) -> f32 {
        match self.waveform {
            AnalogWaveform::Raw(raw) => {
                raw as f32 * self.full_scale_mv / self.full_scale_count as f32
            }
            AnalogWaveform::Constant { mv } => mv,
            AnalogWaveform::Triangle {
                low_mv,
                high_mv,
                period_samples,
            } => {
                let period = period_samples.max(1) as u64;
                let phase = (index % period) as f32 / period as f32;
                let span = high_mv - low_mv;
                if phase < 0.5 {
                    low_mv + span * 2.0 * phase
                } else {
                    high_mv - span * 2.0 * (phase - 0.5)
                }
            }
        }
    }
}

impl AnalogInput for SimAnalogInput {
    fn read_analog(&mut self) -> u16 {
        let raw = match self.waveform {
            AnalogWaveform::Raw(raw) => raw,
            _ => self.raw_for_mv(self.level_mv(self.samples)),
        };
        self.samples += 1;
        raw
    }
}
