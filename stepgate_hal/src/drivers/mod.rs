//! Collaborator driver implementations.

pub mod simulation;
pub mod system_clock;
