//! Simulation collaborators.
//!
//! Software-emulated analog input, output lines and time for development
//! and testing without physical hardware.

mod analog;
mod clock;
mod outputs;
mod stepper;

pub use analog::{AnalogWaveform, SimAnalogInput};
pub use clock::SimClock;
pub use outputs::SimOutputBank;
pub use stepper::StepperModel;
