//! # Laser Phase Noise Simulator
//!
//! Numerical model of a laser's phase noise seen through a delay-line
//! interferometer, rendered as a live power spectral density:
//!
//! ```text
//! Wiener phase φ(t)          (D_phi, rad²/s)
//!   ↓ delay-line interferometer (τ, φ0)
//! I(t) = ½(1 + cos(φ0 + φ(t) − φ(t−τ)))
//!   ↓ |DFT|², zero frequency centred
//! PSD (dB) vs frequency (MHz)
//! ```
//!
//! A free-running laser's phase is a random walk; its lineshape is a
//! Lorentzian of FWHM D_phi / 2π. The interferometer turns that phase walk
//! into intensity noise whose spectrum depends on the delay: zeros at
//! multiples of 1/τ, a DC line set by the arm phase.
//!
//! ## Usage
//!
//! ```no_run
//! use laser_phase_noise_sim::prelude::*;
//!
//! let mut sim = Simulation::new(SimulationParameters::default()).unwrap();
//! let mut plot = PlotBuffer::default();
//! sim.queue(Control::Delay.update_at(250)); // 250 ns
//! sim.run(100, &mut plot).unwrap();
//! println!("{} points in the latest PSD", plot.points.len());
//! ```
//!
//! ## References
//!
//! - Henry (1982), "Theory of the linewidth of semiconductor lasers"
//! - Okoshi, Kikuchi, Nakayama (1980), "Novel method for high resolution
//!   measurement of laser output spectrum" (delayed self-heterodyne)

pub mod controls;
pub mod error;
pub mod params;
pub mod phase;
pub mod simulation;
pub mod spectrum;
pub mod units;
#[cfg(feature = "gui")]
pub mod gui;

pub mod prelude {
    pub use crate::controls::*;
    pub use crate::error::PhaseNoiseError;
    pub use crate::params::*;
    pub use crate::phase::*;
    pub use crate::simulation::*;
    pub use crate::spectrum::*;
}
