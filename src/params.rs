//! Simulation parameters and the fixed bench defaults.
//!
//! Defaults describe a 100 kHz laser sampled at 250 MHz and observed through
//! a 0.1 µs delay-line interferometer biased at quadrature-ish (π/4).

use crate::error::{PhaseNoiseError, Result};
use crate::units::{self, PI};

/// Sampling frequency (Hz)
pub const DEFAULT_FS: f64 = 250e6;

/// Samples per spectrum window
pub const DEFAULT_WINDOW: usize = 1024;

/// Laser linewidth (Hz)
pub const DEFAULT_LINEWIDTH: f64 = 100e3;

/// Interferometer delay (s)
pub const DEFAULT_DELAY: f64 = 0.1e-6;

/// Interferometer arm phase offset (rad)
pub const DEFAULT_ARM_PHASE: f64 = PI / 4.0;

/// Phase samples appended per display tick
pub const DEFAULT_SAMPLES_PER_TICK: usize = 16;

/// All tunable parameters of the laser + interferometer model.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParameters {
    /// Sampling frequency fs (Hz).
    pub fs: f64,
    /// Window length n (samples). The phase buffer holds 2n.
    pub n: usize,
    /// Phase diffusion coefficient D_phi (rad²/s).
    pub d_phi: f64,
    /// Fixed arm phase offset φ0 (rad).
    pub arm_phase: f64,
    /// Interferometer delay τ (s).
    pub delay: f64,
    /// Samples appended to the phase buffer on each tick.
    pub samples_per_tick: usize,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            fs: DEFAULT_FS,
            n: DEFAULT_WINDOW,
            d_phi: units::diffusion_from_linewidth(DEFAULT_LINEWIDTH),
            arm_phase: DEFAULT_ARM_PHASE,
            delay: DEFAULT_DELAY,
            samples_per_tick: DEFAULT_SAMPLES_PER_TICK,
        }
    }
}

impl SimulationParameters {
    /// Ideal single-frequency laser: same bench, no phase diffusion.
    pub fn noiseless() -> Self {
        Self {
            d_phi: 0.0,
            ..Self::default()
        }
    }

    /// Sampling period dt = 1/fs (s).
    pub fn dt(&self) -> f64 {
        1.0 / self.fs
    }

    /// Phase buffer capacity n_max = 2n.
    pub fn capacity(&self) -> usize {
        2 * self.n
    }

    /// Lorentzian linewidth D_phi / 2π (Hz).
    pub fn linewidth(&self) -> f64 {
        units::linewidth_from_diffusion(self.d_phi)
    }

    /// Standard deviation of one Wiener increment, sqrt(2·D_phi·dt) (rad).
    pub fn step_std(&self) -> f64 {
        (2.0 * self.d_phi * self.dt()).sqrt()
    }

    /// Check every field against its physical domain.
    pub fn validate(&self) -> Result<()> {
        if !self.fs.is_finite() || self.fs <= 0.0 {
            return Err(PhaseNoiseError::InvalidParameter {
                name: "fs",
                value: self.fs,
                reason: "sampling frequency must be positive and finite",
            });
        }
        if self.n == 0 {
            return Err(PhaseNoiseError::InvalidParameter {
                name: "n",
                value: 0.0,
                reason: "window must hold at least one sample",
            });
        }
        validate_diffusion(self.d_phi)?;
        validate_delay(self.delay)?;
        if !self.arm_phase.is_finite() {
            return Err(PhaseNoiseError::InvalidParameter {
                name: "arm_phase",
                value: self.arm_phase,
                reason: "arm phase must be finite",
            });
        }
        if self.samples_per_tick > self.capacity() {
            return Err(PhaseNoiseError::AdvanceTooLarge {
                requested: self.samples_per_tick,
                capacity: self.capacity(),
            });
        }
        Ok(())
    }
}

pub(crate) fn validate_diffusion(d_phi: f64) -> Result<()> {
    if !d_phi.is_finite() || d_phi < 0.0 {
        return Err(PhaseNoiseError::InvalidParameter {
            name: "d_phi",
            value: d_phi,
            reason: "diffusion coefficient must be finite and non-negative",
        });
    }
    Ok(())
}

pub(crate) fn validate_delay(delay: f64) -> Result<()> {
    if !delay.is_finite() || delay < 0.0 {
        return Err(PhaseNoiseError::InvalidParameter {
            name: "delay",
            value: delay,
            reason: "delay must be finite and non-negative",
        });
    }
    Ok(())
}
