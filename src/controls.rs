//! The two user-facing parameter controls.
//!
//! Each control is a quantized slider over one field of
//! [`SimulationParameters`]. Position `p` means value `p · step`. A control
//! owns exactly one mutation ([`Control::apply`]) and one label renderer
//! ([`Control::label`]); front-ends turn slider moves into
//! [`ParameterUpdate`]s and hand them to the simulation, which applies them
//! between ticks.

use crate::error::Result;
use crate::params::{validate_delay, validate_diffusion, SimulationParameters};
use crate::units;

/// Range and quantization of one slider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

/// Phase diffusion D_phi: 0 – 10×10⁶ rad²/s in 10×10³ steps.
pub const DIFFUSION_RANGE: ControlRange = ControlRange {
    min: 0.0,
    max: 10e6,
    step: 10e3,
};

/// Interferometer delay τ: 0 – 1 µs in 1 ns steps.
pub const DELAY_RANGE: ControlRange = ControlRange {
    min: 0.0,
    max: 1e-6,
    step: 1e-9,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    /// Phase diffusion coefficient, shown as linewidth.
    Diffusion,
    /// Interferometer delay.
    Delay,
}

impl Control {
    pub const ALL: [Control; 2] = [Control::Diffusion, Control::Delay];

    pub fn range(self) -> ControlRange {
        match self {
            Control::Diffusion => DIFFUSION_RANGE,
            Control::Delay => DELAY_RANGE,
        }
    }

    /// Number of slider steps; positions run over `0..=slider_max()`.
    pub fn slider_max(self) -> u32 {
        let r = self.range();
        ((r.max - r.min) / r.step).round() as u32
    }

    /// Value at slider position `pos` (clamped to the slider).
    pub fn value_at(self, pos: u32) -> f64 {
        let r = self.range();
        r.min + pos.min(self.slider_max()) as f64 * r.step
    }

    /// Nearest slider position for `value`.
    pub fn position_of(self, value: f64) -> u32 {
        let r = self.range();
        if !value.is_finite() {
            return 0;
        }
        ((value - r.min) / r.step)
            .round()
            .clamp(0.0, self.slider_max() as f64) as u32
    }

    /// Current value of the controlled field.
    pub fn value(self, params: &SimulationParameters) -> f64 {
        match self {
            Control::Diffusion => params.d_phi,
            Control::Delay => params.delay,
        }
    }

    /// Write `value` into the controlled field.
    pub fn apply(self, params: &mut SimulationParameters, value: f64) -> Result<()> {
        match self {
            Control::Diffusion => {
                validate_diffusion(value)?;
                params.d_phi = value;
            }
            Control::Delay => {
                validate_delay(value)?;
                params.delay = value;
            }
        }
        Ok(())
    }

    /// Text shown next to the slider.
    pub fn label(self, params: &SimulationParameters) -> String {
        match self {
            Control::Diffusion => format!(
                "Linewidth (kHz) : {:.2}",
                1e-3 * units::linewidth_from_diffusion(params.d_phi)
            ),
            Control::Delay => format!("Delay (ns) : {:.2}", units::seconds_to_ns(params.delay)),
        }
    }

    /// Update request for slider position `pos`.
    pub fn update_at(self, pos: u32) -> ParameterUpdate {
        ParameterUpdate {
            control: self,
            value: self.value_at(pos),
        }
    }
}

/// A pending change to one control, applied at the start of the next tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterUpdate {
    pub control: Control,
    pub value: f64,
}

impl ParameterUpdate {
    pub fn new(control: Control, value: f64) -> Self {
        Self { control, value }
    }

    pub fn apply(&self, params: &mut SimulationParameters) -> Result<()> {
        self.control.apply(params, self.value)
    }
}
