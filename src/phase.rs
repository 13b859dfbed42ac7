//! Laser phase as a discrete Wiener process.
//!
//! The optical phase of a free-running laser diffuses: over a sampling
//! period dt it moves by a Gaussian step of variance 2·D_phi·dt. The
//! resulting field has a Lorentzian lineshape of FWHM D_phi / 2π.
//!
//! [`PhaseBuffer`] is a fixed-length sliding window over that trajectory
//! (newest sample at the tail). [`PhaseNoiseGenerator`] owns the buffer and
//! the random source and extends the trajectory `k` samples at a time.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::error::{PhaseNoiseError, Result};
use crate::params::{validate_diffusion, SimulationParameters};
use crate::units::TAU;

/// Fixed-capacity sliding window of phase samples (rad).
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseBuffer {
    samples: Vec<f64>,
}

impl PhaseBuffer {
    /// Buffer of `capacity` samples all equal to `initial`.
    pub fn filled(capacity: usize, initial: f64) -> Self {
        Self {
            samples: vec![initial; capacity],
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.samples
    }

    /// Newest sample.
    pub fn last(&self) -> Option<f64> {
        self.samples.last().copied()
    }

    /// The newest `n` samples (or the whole buffer if shorter).
    pub fn window(&self, n: usize) -> &[f64] {
        let start = self.samples.len().saturating_sub(n);
        &self.samples[start..]
    }

    /// Drop the `increments.len()` oldest samples and append the running sum
    /// of `increments`, offset by the current tail so the trajectory is
    /// continuous.
    pub fn extend_walk(&mut self, increments: &[f64]) -> Result<()> {
        let k = increments.len();
        let capacity = self.samples.len();
        if k > capacity {
            return Err(PhaseNoiseError::AdvanceTooLarge {
                requested: k,
                capacity,
            });
        }
        if k == 0 {
            return Ok(());
        }

        let mut phase = self.samples[capacity - 1];
        self.samples.copy_within(k.., 0);
        for (slot, step) in self.samples[capacity - k..].iter_mut().zip(increments) {
            phase += step;
            *slot = phase;
        }
        Ok(())
    }
}

/// Random-walk phase source for one laser.
#[derive(Debug, Clone)]
pub struct PhaseNoiseGenerator {
    buffer: PhaseBuffer,
    d_phi: f64,
    dt: f64,
    rng: StdRng,
    increments: Vec<f64>,
}

impl PhaseNoiseGenerator {
    /// Generator seeded from OS entropy.
    pub fn new(params: &SimulationParameters) -> Result<Self> {
        Self::with_rng(params, StdRng::from_entropy())
    }

    /// Reproducible generator.
    pub fn with_seed(params: &SimulationParameters, seed: u64) -> Result<Self> {
        Self::with_rng(params, StdRng::seed_from_u64(seed))
    }

    /// Fill the buffer with one uniform random phase in [0, 2π), then warm
    /// it up with `n` diffusion steps so the first window is a real trajectory.
    fn with_rng(params: &SimulationParameters, mut rng: StdRng) -> Result<Self> {
        params.validate()?;
        let offset = TAU * rng.gen::<f64>();
        let mut generator = Self {
            buffer: PhaseBuffer::filled(params.capacity(), offset),
            d_phi: params.d_phi,
            dt: params.dt(),
            rng,
            increments: Vec::with_capacity(params.capacity()),
        };
        generator.advance(params.n)?;
        debug!(
            "phase generator ready: capacity={} offset={:.4} rad D_phi={:.3e} rad²/s",
            params.capacity(),
            offset,
            params.d_phi
        );
        Ok(generator)
    }

    pub fn buffer(&self) -> &PhaseBuffer {
        &self.buffer
    }

    pub fn diffusion(&self) -> f64 {
        self.d_phi
    }

    /// Change D_phi; takes effect on the next `advance`.
    pub fn set_diffusion(&mut self, d_phi: f64) -> Result<()> {
        validate_diffusion(d_phi)?;
        self.d_phi = d_phi;
        Ok(())
    }

    /// Standard deviation of one increment, sqrt(2·D_phi·dt).
    pub fn step_std(&self) -> f64 {
        (2.0 * self.d_phi * self.dt).sqrt()
    }

    /// Append `k` new correlated samples and discard the `k` oldest.
    ///
    /// The first new sample is the old tail plus one Gaussian step.
    /// `advance(0)` is the identity. `k` larger than the capacity is rejected
    /// and the buffer is left untouched.
    pub fn advance(&mut self, k: usize) -> Result<()> {
        if k > self.buffer.len() {
            return Err(PhaseNoiseError::AdvanceTooLarge {
                requested: k,
                capacity: self.buffer.len(),
            });
        }
        let sigma = self.step_std();
        self.increments.clear();
        for _ in 0..k {
            let z: f64 = self.rng.sample(StandardNormal);
            self.increments.push(sigma * z);
        }
        self.buffer.extend_walk(&self.increments)
    }
}
