//! Delay-line interferometer and power spectral density.
//!
//! A two-arm interferometer with delay τ and arm phase φ0 turns phase noise
//! into intensity noise:
//!
//! ```text
//! I(t) = ½ · (1 + cos(φ0 + φ(t) − φ(t − τ)))
//! ```
//!
//! The PSD of I(t) over the newest `n` samples is |DFT|², computed with
//! `rustfft` and reordered so zero frequency sits in the middle. No window
//! function is applied; rectangular-window leakage is part of the picture.
//!
//! The delayed phase is read with an explicit index into the 2n-sample
//! buffer. A window of n samples can look back at most n samples without
//! leaving recorded history, so larger delays are clamped.

use std::sync::Arc;

use log::debug;
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::error::{PhaseNoiseError, Result};
use crate::params::SimulationParameters;
use crate::phase::PhaseBuffer;
use crate::units;

/// Floor applied when converting power to dB (dB).
pub const DB_FLOOR: f64 = -300.0;

/// Sample frequencies of a length-`n` DFT with sample spacing `dt`, in
/// natural (unshifted) order: `[0, 1, …, ⌈n/2⌉−1, −⌊n/2⌋, …, −1] / (n·dt)`.
pub fn fft_frequencies(n: usize, dt: f64) -> Vec<f64> {
    let scale = 1.0 / (n as f64 * dt);
    let positive = (n + 1) / 2;
    (0..n)
        .map(|k| {
            let signed = if k < positive {
                k as f64
            } else {
                k as f64 - n as f64
            };
            signed * scale
        })
        .collect()
}

/// Rotate a DFT-ordered array so the zero-frequency bin is at index ⌊n/2⌋.
pub fn fft_shift<T: Copy>(values: &[T]) -> Vec<T> {
    let n = values.len();
    let half = n / 2;
    (0..n).map(|i| values[(i + n - half) % n]).collect()
}

/// One PSD estimate, zero frequency centred.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// Frequency axis (Hz), ascending from −fs/2.
    pub frequencies: Vec<f64>,
    /// |DFT|² at each frequency (linear).
    pub power: Vec<f64>,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.power.len()
    }

    pub fn is_empty(&self) -> bool {
        self.power.is_empty()
    }

    /// 10·log10(power), floored at [`DB_FLOOR`].
    pub fn to_db(&self) -> Vec<f64> {
        self.power
            .iter()
            .map(|&p| units::power_to_db(p, DB_FLOOR))
            .collect()
    }

    /// Frequency axis in MHz for display.
    pub fn frequencies_mhz(&self) -> Vec<f64> {
        self.frequencies.iter().map(|&f| units::hz_to_mhz(f)).collect()
    }

    /// Strongest bin as (frequency Hz, power).
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.frequencies
            .iter()
            .zip(&self.power)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(&f, &p)| (f, p))
    }

    /// Total power over all bins.
    pub fn total_power(&self) -> f64 {
        self.power.iter().sum()
    }
}

/// Interference signal and PSD for a fixed window length.
///
/// Holds the FFT plan, scratch space and the shifted frequency axis so a
/// tick only pays for the transform itself.
pub struct SpectrumEstimator {
    n: usize,
    fs: f64,
    arm_phase: f64,
    fft: Arc<dyn Fft<f64>>,
    buffer: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
    frequencies: Vec<f64>,
}

impl SpectrumEstimator {
    pub fn new(params: &SimulationParameters) -> Result<Self> {
        params.validate()?;
        let n = params.n;
        let fft = FftPlanner::<f64>::new().plan_fft_forward(n);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        Ok(Self {
            n,
            fs: params.fs,
            arm_phase: params.arm_phase,
            fft,
            buffer: vec![Complex::new(0.0, 0.0); n],
            scratch,
            frequencies: fft_shift(&fft_frequencies(n, params.dt())),
        })
    }

    /// Shifted frequency axis (Hz).
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Delay in samples for `phase`: round(τ·fs), clamped so every window
    /// sample has a delayed partner inside the buffer.
    ///
    /// Returns the shift and whether clamping occurred; callers decide how
    /// loudly to report a clamp.
    pub fn delay_shift(&self, phase: &PhaseBuffer, delay: f64) -> (usize, bool) {
        let window = self.n.min(phase.len());
        let max_shift = phase.len() - window;
        let raw = (delay * self.fs).round();
        if raw > max_shift as f64 {
            (max_shift, true)
        } else {
            (raw.max(0.0) as usize, false)
        }
    }

    /// Interferometer output for each sample of the newest window, in [0, 1].
    pub fn interference_signal(&self, phase: &PhaseBuffer, delay: f64) -> Vec<f64> {
        let (shift, clamped) = self.delay_shift(phase, delay);
        if clamped {
            debug!("delay {:.3e} s clamped to {} samples", delay, shift);
        }
        self.interference_at_shift(phase, shift)
    }

    /// Same as [`interference_signal`](Self::interference_signal) with the
    /// delay already in samples. Shifts past the recorded history read the
    /// oldest sample.
    pub fn interference_at_shift(&self, phase: &PhaseBuffer, shift: usize) -> Vec<f64> {
        let samples = phase.as_slice();
        let window = self.n.min(samples.len());
        let start = samples.len() - window;
        let shift = shift.min(start);
        (start..samples.len())
            .map(|i| {
                let dphi = samples[i] - samples[i - shift];
                0.5 * (1.0 + (self.arm_phase + dphi).cos())
            })
            .collect()
    }

    /// |DFT|² of the newest `n` samples of `signal`, zero frequency centred.
    pub fn power_spectrum(&mut self, signal: &[f64]) -> Result<Vec<f64>> {
        if signal.len() < self.n {
            return Err(PhaseNoiseError::LengthMismatch {
                expected: self.n,
                actual: signal.len(),
            });
        }
        let window = &signal[signal.len() - self.n..];
        for (slot, &x) in self.buffer.iter_mut().zip(window) {
            *slot = Complex::new(x, 0.0);
        }
        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);
        let power: Vec<f64> = self.buffer.iter().map(|c| c.norm_sqr()).collect();
        Ok(fft_shift(&power))
    }

    /// PSD paired with its frequency axis.
    pub fn spectrum(&mut self, signal: &[f64]) -> Result<Spectrum> {
        let power = self.power_spectrum(signal)?;
        Ok(Spectrum {
            frequencies: self.frequencies.clone(),
            power,
        })
    }
}

/// Running arithmetic mean of successive PSDs.
#[derive(Debug, Clone, Default)]
pub struct SpectrumAverager {
    mean: Vec<f64>,
    count: usize,
}

impl SpectrumAverager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one PSD into the mean: avg_k = ((k−1)·avg_{k−1} + psd_k) / k.
    pub fn add(&mut self, power: &[f64]) -> Result<()> {
        if self.count == 0 {
            self.mean = power.to_vec();
            self.count = 1;
            return Ok(());
        }
        if power.len() != self.mean.len() {
            return Err(PhaseNoiseError::LengthMismatch {
                expected: self.mean.len(),
                actual: power.len(),
            });
        }
        self.count += 1;
        let k = self.count as f64;
        for (avg, &p) in self.mean.iter_mut().zip(power) {
            *avg = ((k - 1.0) * *avg + p) / k;
        }
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn reset(&mut self) {
        self.mean.clear();
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::PhaseNoiseGenerator;
    use crate::units::{PI, TAU};

    fn estimator(params: &SimulationParameters) -> SpectrumEstimator {
        SpectrumEstimator::new(params).unwrap()
    }

    #[test]
    fn frequencies_follow_dft_ordering() {
        assert_eq!(fft_frequencies(4, 1.0), vec![0.0, 0.25, -0.5, -0.25]);
        assert_eq!(fft_frequencies(5, 1.0), vec![0.0, 0.2, 0.4, -0.4, -0.2]);
        assert_eq!(fft_shift(&fft_frequencies(4, 1.0)), vec![-0.5, -0.25, 0.0, 0.25]);
        assert_eq!(fft_shift(&fft_frequencies(5, 1.0)), vec![-0.4, -0.2, 0.0, 0.2, 0.4]);
    }

    #[test]
    fn frequency_axis_spans_nyquist() {
        let params = SimulationParameters::default();
        let est = estimator(&params);
        let f = est.frequencies();
        assert_eq!(f.len(), 1024);
        assert!((f[0] + 125e6).abs() < 1e-3, "first bin {}", f[0]);
        assert_eq!(f[512], 0.0);
        assert!(f.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn constant_signal_concentrates_at_dc() {
        let params = SimulationParameters::default();
        let mut est = estimator(&params);
        let n = params.n;
        let psd = est.power_spectrum(&vec![1.0; n]).unwrap();

        let dc = psd[n / 2];
        let expected = (n * n) as f64;
        assert!((dc - expected).abs() / expected < 1e-9, "DC power {}", dc);
        for (i, &p) in psd.iter().enumerate() {
            if i != n / 2 {
                assert!(p < 1e-12 * expected, "bin {} leaks {}", i, p);
            }
        }
    }

    #[test]
    fn tone_lands_on_its_bins() {
        let params = SimulationParameters::default();
        let mut est = estimator(&params);
        let n = params.n;
        let k0 = 64;
        let tone: Vec<f64> = (0..n)
            .map(|i| (TAU * k0 as f64 * i as f64 / n as f64).cos())
            .collect();
        let spectrum = est.spectrum(&tone).unwrap();

        let quarter = (n * n) as f64 / 4.0;
        assert!((spectrum.power[n / 2 + k0] - quarter).abs() / quarter < 1e-9);
        assert!((spectrum.power[n / 2 - k0] - quarter).abs() / quarter < 1e-9);
        let (f_peak, _) = spectrum.peak().unwrap();
        assert!((f_peak.abs() - k0 as f64 * params.fs / n as f64).abs() < 1e-3);
    }

    #[test]
    fn power_spectrum_uses_newest_samples() {
        let params = SimulationParameters {
            n: 8,
            ..SimulationParameters::default()
        };
        let mut est = estimator(&params);
        let mut signal = vec![5.0; 4];
        signal.extend(vec![1.0; 8]);
        let psd = est.power_spectrum(&signal).unwrap();
        assert!((psd[4] - 64.0).abs() < 1e-9);

        assert_eq!(
            est.power_spectrum(&[1.0; 7]),
            Err(PhaseNoiseError::LengthMismatch { expected: 8, actual: 7 })
        );
    }

    #[test]
    fn noiseless_bench_gives_flat_signal() {
        let params = SimulationParameters::noiseless();
        let gen = PhaseNoiseGenerator::with_seed(&params, 1).unwrap();
        let est = estimator(&params);
        let signal = est.interference_signal(gen.buffer(), 0.1e-6);

        let expected = 0.5 * (1.0 + (PI / 4.0).cos());
        assert_eq!(signal.len(), 1024);
        assert!((expected - 0.853_553_390_593_273_7).abs() < 1e-12);
        for &s in &signal {
            assert!((s - expected).abs() < 1e-12, "sample {} != {}", s, expected);
        }
    }

    #[test]
    fn noiseless_signal_is_constant_over_time() {
        let params = SimulationParameters::noiseless();
        let mut gen = PhaseNoiseGenerator::with_seed(&params, 8).unwrap();
        let est = estimator(&params);
        let first = est.interference_signal(gen.buffer(), 0.37e-6);
        for _ in 0..20 {
            gen.advance(16).unwrap();
            assert_eq!(est.interference_signal(gen.buffer(), 0.37e-6), first);
        }
    }

    #[test]
    fn signal_stays_in_unit_interval() {
        let params = SimulationParameters {
            d_phi: 10e6,
            ..SimulationParameters::default()
        };
        let mut gen = PhaseNoiseGenerator::with_seed(&params, 99).unwrap();
        let est = estimator(&params);
        for delay in [0.0, 1e-9, 0.1e-6, 1e-6, 1.0] {
            gen.advance(256).unwrap();
            let signal = est.interference_signal(gen.buffer(), delay);
            assert!(signal.iter().all(|&s| (0.0..=1.0).contains(&s)));
        }
    }

    #[test]
    fn zero_delay_reads_arm_phase_only() {
        let params = SimulationParameters::default();
        let gen = PhaseNoiseGenerator::with_seed(&params, 4).unwrap();
        let est = estimator(&params);
        let expected = 0.5 * (1.0 + (PI / 4.0).cos());
        let signal = est.interference_signal(gen.buffer(), 0.0);
        assert!(signal.iter().all(|&s| (s - expected).abs() < 1e-12));
    }

    #[test]
    fn delay_beyond_history_is_clamped() {
        let params = SimulationParameters::default();
        let gen = PhaseNoiseGenerator::with_seed(&params, 6).unwrap();
        let est = estimator(&params);
        assert_eq!(est.delay_shift(gen.buffer(), 0.1e-6), (25, false));
        assert_eq!(est.delay_shift(gen.buffer(), 0.0), (0, false));
        assert_eq!(est.delay_shift(gen.buffer(), 1024.0 / params.fs), (1024, false));
        assert_eq!(est.delay_shift(gen.buffer(), 1e-3), (1024, true));
        assert_eq!(
            est.interference_signal(gen.buffer(), 1e-3),
            est.interference_at_shift(gen.buffer(), 1024)
        );
    }

    #[test]
    fn db_conversion_is_finite() {
        let spectrum = Spectrum {
            frequencies: vec![-1.0, 0.0, 1.0],
            power: vec![0.0, 1000.0, 1.0],
        };
        assert!(!spectrum.is_empty());
        let db = spectrum.to_db();
        assert_eq!(db[0], DB_FLOOR);
        assert!((db[1] - 30.0).abs() < 1e-12);
        assert!(db[2].abs() < 1e-12);

        let empty = Spectrum {
            frequencies: Vec::new(),
            power: Vec::new(),
        };
        assert!(empty.is_empty());
        assert_eq!(empty.peak(), None);
        assert_eq!(spectrum.peak(), Some((0.0, 1000.0)));
        assert_eq!(spectrum.total_power(), 1001.0);
    }

    #[test]
    fn averager_tracks_running_mean() {
        let mut avg = SpectrumAverager::new();
        avg.add(&[2.0, 4.0]).unwrap();
        avg.add(&[4.0, 8.0]).unwrap();
        avg.add(&[6.0, 0.0]).unwrap();
        assert_eq!(avg.count(), 3);
        assert!((avg.mean()[0] - 4.0).abs() < 1e-12);
        assert!((avg.mean()[1] - 4.0).abs() < 1e-12);

        assert_eq!(
            avg.add(&[1.0]),
            Err(PhaseNoiseError::LengthMismatch { expected: 2, actual: 1 })
        );

        avg.reset();
        assert_eq!(avg.count(), 0);
        assert!(avg.mean().is_empty());
    }
}
