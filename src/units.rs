//! Unit conversions between simulation units (SI) and display units.
//!
//! The core works in Hz, seconds and rad²/s. Labels and plots use MHz, ns
//! and kHz of linewidth.

/// Pi
pub const PI: f64 = std::f64::consts::PI;

/// Full turn (rad)
pub const TAU: f64 = std::f64::consts::TAU;

/// Hz → MHz
pub fn hz_to_mhz(f_hz: f64) -> f64 {
    f_hz * 1e-6
}

/// Seconds → nanoseconds
pub fn seconds_to_ns(t_s: f64) -> f64 {
    t_s * 1e9
}

/// Lorentzian FWHM linewidth (Hz) of a Wiener phase with diffusion `d_phi` (rad²/s).
pub fn linewidth_from_diffusion(d_phi: f64) -> f64 {
    d_phi / TAU
}

/// Diffusion coefficient (rad²/s) giving a Lorentzian linewidth of `linewidth_hz`.
pub fn diffusion_from_linewidth(linewidth_hz: f64) -> f64 {
    TAU * linewidth_hz
}

/// Linear power → decibels, floored at `floor_db` so the result stays finite.
///
/// Non-finite power (NaN or ±∞) maps to the floor as well.
pub fn power_to_db(power: f64, floor_db: f64) -> f64 {
    if power.is_finite() && power > 0.0 {
        (10.0 * power.log10()).max(floor_db)
    } else {
        floor_db
    }
}

// ─── Kani formal verification harnesses ─────────────────────────────────────
#[cfg(kani)]
mod kani_proofs {
    use super::*;

    /// Prove power_to_db never returns a non-finite value for a finite floor.
    #[kani::proof]
    fn power_to_db_is_finite() {
        let p: f64 = kani::any();
        let db = power_to_db(p, -300.0);
        assert!(db.is_finite());
    }

    /// Prove the linewidth conversion round-trips for finite inputs.
    #[kani::proof]
    fn linewidth_roundtrip() {
        let d: f64 = kani::any();
        kani::assume(d.is_finite());
        kani::assume(d >= 0.0 && d < 1e20);
        let back = diffusion_from_linewidth(linewidth_from_diffusion(d));
        assert!(back.is_finite());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hundred_khz_linewidth() {
        let d = diffusion_from_linewidth(100e3);
        assert!((d - 628_318.530_717_958_6).abs() < 1e-6);
        assert!((linewidth_from_diffusion(d) - 100e3).abs() < 1e-9);
    }

    #[test]
    fn db_floor_applies_to_zero_and_tiny_power() {
        assert_eq!(power_to_db(0.0, -300.0), -300.0);
        assert_eq!(power_to_db(1e-40, -300.0), -300.0);
        assert!((power_to_db(100.0, -300.0) - 20.0).abs() < 1e-12);
    }

    #[test]
    fn db_floor_applies_to_non_finite_power() {
        assert_eq!(power_to_db(f64::INFINITY, -300.0), -300.0);
        assert_eq!(power_to_db(f64::NEG_INFINITY, -300.0), -300.0);
        assert_eq!(power_to_db(f64::NAN, -300.0), -300.0);
        assert!(power_to_db(f64::MAX, -300.0).is_finite());
    }

    #[test]
    fn display_units() {
        assert!((hz_to_mhz(125e6) - 125.0).abs() < 1e-12);
        assert!((seconds_to_ns(0.1e-6) - 100.0).abs() < 1e-9);
    }
}
