//! Headless run of the laser phase-noise simulator.
//!
//! Runs the fixed bench (250 MHz sampling, 1024-point window, 100 kHz
//! linewidth, 0.1 µs delay) for a fixed number of ticks and prints the
//! averaged interferometer PSD plus a delay sweep.

use log::{error, info};

use laser_phase_noise_sim::prelude::*;
use laser_phase_noise_sim::units;

const TICKS: usize = 400;
const SWEEP_TICKS: usize = 100;
const SEED: u64 = 0x1a5e;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        error!("simulation failed: {}", e);
        std::process::exit(1);
    }
}

fn mean_and_variance(xs: &[f64]) -> (f64, f64) {
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, var)
}

fn run() -> Result<(), PhaseNoiseError> {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║        LASER PHASE NOISE — Delay-Line Interferometer PSD         ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let params = SimulationParameters::default();

    // ═══════════════════════════════════════
    // Averaged run
    // ═══════════════════════════════════════
    let mut sim = Simulation::with_seed(params.clone(), SEED)?.with_averaging();
    let mut updates = 0usize;
    let mut sink = |_: &[f64], _: &[f64]| updates += 1;
    let frame = match sim.run(TICKS, &mut sink)? {
        Some(frame) => frame,
        None => return Ok(()),
    };
    info!("{} ticks pushed to the display sink", updates);

    // ═══════════════════════════════════════
    // Bench parameters
    // ═══════════════════════════════════════
    println!("━━━ Bench ━━━");
    println!();
    println!("  Sampling:           fs = {:.1} MHz (dt = {:.1} ns)",
        units::hz_to_mhz(params.fs), units::seconds_to_ns(params.dt()));
    println!("  Window:             n = {} samples ({} in buffer)", params.n, params.capacity());
    println!("  Diffusion:          D_phi = {:.4e} rad²/s", params.d_phi);
    println!("  Linewidth:          {:.2} kHz", 1e-3 * params.linewidth());
    println!("  Step σ:             {:.4e} rad / sample", params.step_std());
    println!("  Delay:              {:.1} ns ({} samples)",
        units::seconds_to_ns(params.delay), frame.delay_shift);
    println!("  Arm phase:          {:.4} rad", params.arm_phase);
    println!("  Samples per tick:   {}", params.samples_per_tick);
    println!();

    // ═══════════════════════════════════════
    // Phase walk and averaged PSD
    // ═══════════════════════════════════════
    let increments: Vec<f64> = frame.phase.windows(2).map(|w| w[1] - w[0]).collect();
    let (_, inc_var) = mean_and_variance(&increments);
    println!("━━━ Phase Walk ━━━");
    println!();
    println!("  Increment variance: {:.4e} rad² (2·D_phi·dt = {:.4e})",
        inc_var, 2.0 * params.d_phi * params.dt());
    println!("  Phase excursion:    {:.4} rad over the window",
        frame.phase.last().copied().unwrap_or(0.0) - frame.phase.first().copied().unwrap_or(0.0));
    println!();

    let psd_db = frame.display_db();
    let freqs = &frame.spectrum.frequencies;
    println!("━━━ Averaged PSD ({} ticks) ━━━", TICKS);
    println!();
    println!("  {:>14}  {:>12}", "f (MHz)", "PSD (dB)");
    println!("  {:─>14}  {:─>12}", "", "");
    let center = freqs.len() / 2;
    let stride = (freqs.len() / 32).max(1);
    for i in (center..freqs.len()).step_by(stride) {
        println!("  {:>14.3}  {:>12.2}", units::hz_to_mhz(freqs[i]), psd_db[i]);
    }
    println!();

    // ═══════════════════════════════════════
    // Delay sweep
    // ═══════════════════════════════════════
    println!("━━━ Delay Sweep ━━━");
    println!();
    println!("  {:>10}  {:>8}  {:>14}  {:>14}  {:>12}",
        "τ (ns)", "shift", "⟨I⟩", "var(I)", "1/τ (MHz)");
    println!("  {:─>10}  {:─>8}  {:─>14}  {:─>14}  {:─>12}", "", "", "", "", "");

    for pos in [0u32, 10, 50, 100, 250, 500, 1000] {
        let mut sweep = Simulation::with_seed(params.clone(), SEED)?;
        sweep.queue(Control::Delay.update_at(pos));
        let mut last = None;
        for _ in 0..SWEEP_TICKS {
            last = Some(sweep.step()?);
        }
        let Some(frame) = last else { continue };
        let (mean, var) = mean_and_variance(&frame.signal);
        let delay = sweep.params().delay;
        let null = if delay > 0.0 {
            format!("{:.3}", units::hz_to_mhz(1.0 / delay))
        } else {
            "—".to_string()
        };
        println!("  {:>10.1}  {:>8}  {:>14.6}  {:>14.4e}  {:>12}",
            units::seconds_to_ns(delay), frame.delay_shift, mean, var, null);
    }
    println!();

    Ok(())
}
