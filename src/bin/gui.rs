fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([800.0, 600.0])
            .with_title("Simulation of laser phase noise"),
        ..Default::default()
    };

    eframe::run_native(
        "laser-phase-noise-sim",
        options,
        Box::new(|cc| Ok(Box::new(laser_phase_noise_sim::gui::PhaseNoiseApp::new(cc)?))),
    )
}
