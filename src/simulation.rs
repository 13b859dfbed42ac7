//! Single-threaded tick driver.
//!
//! Each tick:
//! 1. Apply queued parameter updates (last write wins)
//! 2. Advance the phase by `samples_per_tick`
//! 3. Form the interference signal over the newest window
//! 4. Estimate its PSD (optionally folding it into a running average)
//! 5. Hand (frequency MHz, PSD dB) to the display sink
//!
//! The simulation owns every piece of mutable state. Front-ends only queue
//! [`ParameterUpdate`]s and read [`Frame`]s.

use std::collections::VecDeque;

use log::{debug, info, trace, warn};

use crate::controls::ParameterUpdate;
use crate::error::Result;
use crate::params::SimulationParameters;
use crate::phase::PhaseNoiseGenerator;
use crate::spectrum::{Spectrum, SpectrumAverager, SpectrumEstimator, DB_FLOOR};
use crate::units;

/// Receives one line plot per tick and replaces whatever it showed before.
pub trait DisplaySink {
    fn show(&mut self, x: &[f64], y: &[f64]);
}

impl<F: FnMut(&[f64], &[f64])> DisplaySink for F {
    fn show(&mut self, x: &[f64], y: &[f64]) {
        self(x, y)
    }
}

/// Sink that keeps the most recent line as plot points.
#[derive(Debug, Clone, Default)]
pub struct PlotBuffer {
    pub points: Vec<[f64; 2]>,
    pub updates: usize,
}

impl DisplaySink for PlotBuffer {
    fn show(&mut self, x: &[f64], y: &[f64]) {
        self.points.clear();
        self.points.extend(x.iter().zip(y).map(|(&x, &y)| [x, y]));
        self.updates += 1;
    }
}

/// Everything computed in one tick.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Ticks completed so far, this one included.
    pub tick: u64,
    /// PSD of this tick.
    pub spectrum: Spectrum,
    /// Running mean PSD, when averaging is on.
    pub averaged: Option<Vec<f64>>,
    /// Interference signal over the newest window.
    pub signal: Vec<f64>,
    /// Phase over the newest window (rad).
    pub phase: Vec<f64>,
    /// Phase one delay earlier, aligned with `phase` (rad).
    pub delayed_phase: Vec<f64>,
    /// Delay actually used, in samples.
    pub delay_shift: usize,
}

impl Frame {
    /// PSD in dB, the averaged one when available.
    pub fn display_db(&self) -> Vec<f64> {
        match &self.averaged {
            Some(avg) => avg
                .iter()
                .map(|&p| units::power_to_db(p, DB_FLOOR))
                .collect(),
            None => self.spectrum.to_db(),
        }
    }
}

pub struct Simulation {
    params: SimulationParameters,
    generator: PhaseNoiseGenerator,
    estimator: SpectrumEstimator,
    averager: Option<SpectrumAverager>,
    pending: VecDeque<ParameterUpdate>,
    clamped_delay: Option<f64>,
    ticks: u64,
}

impl Simulation {
    /// Simulation seeded from OS entropy.
    pub fn new(params: SimulationParameters) -> Result<Self> {
        let generator = PhaseNoiseGenerator::new(&params)?;
        Self::with_generator(params, generator)
    }

    /// Reproducible simulation.
    pub fn with_seed(params: SimulationParameters, seed: u64) -> Result<Self> {
        let generator = PhaseNoiseGenerator::with_seed(&params, seed)?;
        Self::with_generator(params, generator)
    }

    fn with_generator(params: SimulationParameters, generator: PhaseNoiseGenerator) -> Result<Self> {
        let estimator = SpectrumEstimator::new(&params)?;
        info!(
            "simulation: fs={:.1} MHz n={} linewidth={:.2} kHz delay={:.1} ns",
            units::hz_to_mhz(params.fs),
            params.n,
            1e-3 * params.linewidth(),
            units::seconds_to_ns(params.delay)
        );
        Ok(Self {
            params,
            generator,
            estimator,
            averager: None,
            pending: VecDeque::new(),
            clamped_delay: None,
            ticks: 0,
        })
    }

    /// Keep a running average of every PSD from now on.
    pub fn with_averaging(mut self) -> Self {
        self.set_averaging(true);
        self
    }

    /// Turn PSD averaging on (starting from an empty mean) or off.
    pub fn set_averaging(&mut self, on: bool) {
        self.averager = on.then(SpectrumAverager::new);
    }

    pub fn is_averaging(&self) -> bool {
        self.averager.is_some()
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    pub fn generator(&self) -> &PhaseNoiseGenerator {
        &self.generator
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn pending_updates(&self) -> usize {
        self.pending.len()
    }

    /// Record a control change; it is applied at the start of the next tick.
    pub fn queue(&mut self, update: ParameterUpdate) {
        self.pending.push_back(update);
    }

    /// Drop the running average (e.g. after a parameter change).
    pub fn reset_average(&mut self) {
        if let Some(avg) = self.averager.as_mut() {
            avg.reset();
        }
    }

    fn apply_pending(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        while let Some(update) = self.pending.pop_front() {
            match update.apply(&mut self.params) {
                Ok(()) => debug!("{:?} -> {:.4e}", update.control, update.value),
                Err(e) => warn!("ignoring {:?}: {}", update.control, e),
            }
        }
        self.generator.set_diffusion(self.params.d_phi)
    }

    /// Run one tick and return everything it computed.
    pub fn step(&mut self) -> Result<Frame> {
        self.apply_pending()?;
        self.generator.advance(self.params.samples_per_tick)?;

        let buffer = self.generator.buffer();
        let delay = self.params.delay;
        let (shift, clamped) = self.estimator.delay_shift(buffer, delay);
        if !clamped {
            self.clamped_delay = None;
        } else if self.clamped_delay != Some(delay) {
            warn!(
                "delay {:.3e} s exceeds the recorded history; clamped to {} samples",
                delay, shift
            );
            self.clamped_delay = Some(delay);
        }
        let signal = self.estimator.interference_at_shift(buffer, shift);

        let n = self.params.n;
        let samples = buffer.as_slice();
        let start = samples.len() - n;
        let phase = samples[start..].to_vec();
        let delayed_phase = samples[start - shift..samples.len() - shift].to_vec();

        let spectrum = self.estimator.spectrum(&signal)?;
        let averaged = match self.averager.as_mut() {
            Some(avg) => {
                avg.add(&spectrum.power)?;
                Some(avg.mean().to_vec())
            }
            None => None,
        };

        self.ticks += 1;
        trace!(
            "tick {}: shift={} total_power={:.4e}",
            self.ticks,
            shift,
            spectrum.total_power()
        );

        Ok(Frame {
            tick: self.ticks,
            spectrum,
            averaged,
            signal,
            phase,
            delayed_phase,
            delay_shift: shift,
        })
    }

    /// One tick, pushed to `sink` as (frequency MHz, PSD dB).
    pub fn tick<S: DisplaySink + ?Sized>(&mut self, sink: &mut S) -> Result<Frame> {
        let frame = self.step()?;
        sink.show(&frame.spectrum.frequencies_mhz(), &frame.display_db());
        Ok(frame)
    }

    /// `ticks` consecutive ticks; returns the last frame.
    pub fn run<S: DisplaySink + ?Sized>(&mut self, ticks: usize, sink: &mut S) -> Result<Option<Frame>> {
        let mut last = None;
        for _ in 0..ticks {
            last = Some(self.tick(sink)?);
        }
        Ok(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::Control;
    use crate::units::PI;

    #[test]
    fn step_produces_full_frame() {
        let mut sim = Simulation::with_seed(SimulationParameters::default(), 1).unwrap();
        let frame = sim.step().unwrap();
        assert_eq!(frame.tick, 1);
        assert_eq!(frame.spectrum.len(), 1024);
        assert!(!frame.spectrum.is_empty());
        assert_eq!(frame.signal.len(), 1024);
        assert_eq!(frame.phase.len(), 1024);
        assert_eq!(frame.delayed_phase.len(), 1024);
        assert_eq!(frame.delay_shift, 25);
        assert!(frame.averaged.is_none());
    }

    #[test]
    fn delayed_phase_lines_up_with_signal() {
        let mut sim = Simulation::with_seed(SimulationParameters::default(), 2).unwrap();
        let frame = sim.step().unwrap();
        let arm = sim.params().arm_phase;
        for i in 0..frame.signal.len() {
            let expected = 0.5 * (1.0 + (arm + frame.phase[i] - frame.delayed_phase[i]).cos());
            assert!((frame.signal[i] - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn noiseless_spectrum_is_dc_only() {
        let mut sim = Simulation::with_seed(SimulationParameters::noiseless(), 3).unwrap();
        let frame = sim.step().unwrap();
        let level = 0.5 * (1.0 + (PI / 4.0).cos());
        let n = 1024.0;
        let (f_peak, p_peak) = frame.spectrum.peak().unwrap();
        assert_eq!(f_peak, 0.0);
        assert!((p_peak - (level * n).powi(2)).abs() / p_peak < 1e-9);
    }

    #[test]
    fn updates_wait_for_next_tick() {
        let mut sim = Simulation::with_seed(SimulationParameters::default(), 4).unwrap();
        sim.queue(Control::Delay.update_at(200));
        assert_eq!(sim.pending_updates(), 1);
        assert!((sim.params().delay - 0.1e-6).abs() < 1e-18);

        let frame = sim.step().unwrap();
        assert_eq!(sim.pending_updates(), 0);
        assert!((sim.params().delay - 200e-9).abs() < 1e-18);
        assert_eq!(frame.delay_shift, 50);
    }

    #[test]
    fn last_write_wins() {
        let mut sim = Simulation::with_seed(SimulationParameters::default(), 5).unwrap();
        sim.queue(Control::Diffusion.update_at(10));
        sim.queue(Control::Diffusion.update_at(0));
        sim.step().unwrap();
        assert_eq!(sim.params().d_phi, 0.0);
        assert_eq!(sim.generator().diffusion(), 0.0);
    }

    #[test]
    fn clamped_delay_is_reported_once() {
        let mut sim = Simulation::with_seed(SimulationParameters::default(), 10).unwrap();
        sim.queue(ParameterUpdate::new(Control::Delay, 1e-3));
        assert_eq!(sim.step().unwrap().delay_shift, 1024);
        assert_eq!(sim.clamped_delay, Some(1e-3));
        assert_eq!(sim.step().unwrap().delay_shift, 1024);
        assert_eq!(sim.clamped_delay, Some(1e-3));

        sim.queue(Control::Delay.update_at(100));
        assert_eq!(sim.step().unwrap().delay_shift, 25);
        assert_eq!(sim.clamped_delay, None);
    }

    #[test]
    fn invalid_update_is_dropped() {
        let mut sim = Simulation::with_seed(SimulationParameters::default(), 6).unwrap();
        sim.queue(ParameterUpdate::new(Control::Delay, -1.0));
        sim.step().unwrap();
        assert!((sim.params().delay - 0.1e-6).abs() < 1e-18);
    }

    #[test]
    fn tick_feeds_sink_in_display_units() {
        let mut sim = Simulation::with_seed(SimulationParameters::default(), 7).unwrap();
        let mut plot = PlotBuffer::default();
        sim.run(3, &mut plot).unwrap();
        assert_eq!(plot.updates, 3);
        assert_eq!(plot.points.len(), 1024);
        assert!((plot.points[0][0] + 125.0).abs() < 1e-9);
        assert!(plot.points.iter().all(|p| p[1].is_finite()));
        assert_eq!(sim.ticks(), 3);
    }

    #[test]
    fn closures_are_sinks() {
        let mut sim = Simulation::with_seed(SimulationParameters::default(), 8).unwrap();
        let mut seen = 0;
        let mut sink = |x: &[f64], y: &[f64]| {
            assert_eq!(x.len(), y.len());
            seen += 1;
        };
        sim.run(2, &mut sink).unwrap();
        assert_eq!(seen, 2);
    }

    #[test]
    fn averaging_accumulates_and_resets() {
        let mut sim = Simulation::with_seed(SimulationParameters::default(), 9)
            .unwrap()
            .with_averaging();
        let first = sim.step().unwrap();
        assert_eq!(first.averaged.as_deref(), Some(first.spectrum.power.as_slice()));

        let second = sim.step().unwrap();
        let avg = second.averaged.unwrap();
        for i in 0..avg.len() {
            let expected = 0.5 * (first.spectrum.power[i] + second.spectrum.power[i]);
            assert!((avg[i] - expected).abs() <= 1e-9 * expected.max(1.0));
        }

        sim.reset_average();
        let third = sim.step().unwrap();
        assert_eq!(third.averaged.as_deref(), Some(third.spectrum.power.as_slice()));

        sim.set_averaging(false);
        assert!(!sim.is_averaging());
        assert!(sim.step().unwrap().averaged.is_none());
    }
}
