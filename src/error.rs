//! Error type shared by every layer of the simulator.

use thiserror::Error;

/// Everything that can go wrong while configuring or stepping the simulation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhaseNoiseError {
    /// A simulation parameter is outside its physical domain.
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// `advance(k)` asked for more samples than the buffer holds.
    #[error("cannot advance by {requested} samples: buffer capacity is {capacity}")]
    AdvanceTooLarge { requested: usize, capacity: usize },

    /// Two arrays that must line up do not.
    #[error("length mismatch: expected {expected} samples, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, PhaseNoiseError>;
