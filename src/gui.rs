//! egui front-end: two sliders with labels and a live PSD plot.

use eframe::egui;
use egui_plot::{Legend, Line, Plot, PlotPoints};
use log::error;

use crate::controls::Control;
use crate::error::PhaseNoiseError;
use crate::params::SimulationParameters;
use crate::simulation::{Frame, PlotBuffer, Simulation};

const PSD_COLOR: egui::Color32 = egui::Color32::from_rgb(86, 166, 96);
const SIGNAL_COLOR: egui::Color32 = egui::Color32::from_rgb(212, 175, 55);
const PHASE_COLOR: egui::Color32 = egui::Color32::from_rgb(70, 130, 230);
const DELAYED_COLOR: egui::Color32 = egui::Color32::from_rgb(230, 70, 70);
const DIM: egui::Color32 = egui::Color32::from_rgb(160, 160, 150);

fn dim_label(ui: &mut egui::Ui, text: &str) {
    ui.colored_label(DIM, text);
}

pub struct PhaseNoiseApp {
    sim: Simulation,
    /// Slider positions, indexed like `Control::ALL`.
    positions: [u32; 2],
    plot: PlotBuffer,
    last_frame: Option<Frame>,
    paused: bool,
    averaging: bool,
    show_traces: bool,
    failure: Option<String>,
}

impl PhaseNoiseApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Result<Self, PhaseNoiseError> {
        let params = SimulationParameters::default();
        let positions = Control::ALL.map(|c| c.position_of(c.value(&params)));
        let sim = Simulation::new(params)?;
        Ok(Self {
            sim,
            positions,
            plot: PlotBuffer::default(),
            last_frame: None,
            paused: false,
            averaging: false,
            show_traces: false,
            failure: None,
        })
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        for (i, control) in Control::ALL.into_iter().enumerate() {
            ui.label(control.label(self.sim.params()));
            let slider = egui::Slider::new(&mut self.positions[i], 0..=control.slider_max())
                .show_value(false);
            if ui.add(slider).changed() {
                self.sim.queue(control.update_at(self.positions[i]));
                self.sim.reset_average();
            }
            ui.add_space(4.0);
        }

        ui.separator();
        ui.horizontal(|ui| {
            let label = if self.paused { "Resume" } else { "Pause" };
            if ui.button(label).clicked() {
                self.paused = !self.paused;
            }
            if ui.checkbox(&mut self.averaging, "Average").changed() {
                self.sim.set_averaging(self.averaging);
            }
            ui.checkbox(&mut self.show_traces, "Time traces");
        });
        dim_label(ui, "Averaging restarts whenever a slider moves.");
    }

    fn advance(&mut self) {
        if self.paused || self.failure.is_some() {
            return;
        }
        let result = self.sim.tick(&mut self.plot);
        match result {
            Ok(frame) => self.last_frame = Some(frame),
            Err(e) => {
                error!("tick failed: {}", e);
                self.failure = Some(e.to_string());
            }
        }
    }

    fn psd_plot(&self, ui: &mut egui::Ui, height: f32) {
        Plot::new("psd")
            .height(height)
            .x_axis_label("Frequency (MHz)")
            .y_axis_label("PSD (dB)")
            .allow_drag([false, true])
            .allow_zoom([false, true])
            .show(ui, |plot_ui| {
                let points = PlotPoints::new(self.plot.points.clone());
                plot_ui.line(Line::new(points).color(PSD_COLOR).width(1.5));
            });
    }

    fn trace_plots(&self, ui: &mut egui::Ui, height: f32) {
        let Some(frame) = &self.last_frame else {
            return;
        };
        let dt_ns = 1e9 * self.sim.params().dt();
        let series = |ys: &[f64]| {
            PlotPoints::new(
                ys.iter()
                    .enumerate()
                    .map(|(i, &y)| [i as f64 * dt_ns, y])
                    .collect(),
            )
        };

        Plot::new("signal")
            .height(height)
            .x_axis_label("Time (ns)")
            .y_axis_label("Intensity")
            .include_y(0.0)
            .include_y(1.0)
            .show(ui, |plot_ui| {
                plot_ui.line(Line::new(series(&frame.signal)).color(SIGNAL_COLOR));
            });

        Plot::new("phase")
            .height(height)
            .x_axis_label("Time (ns)")
            .y_axis_label("Phase (rad)")
            .legend(Legend::default())
            .show(ui, |plot_ui| {
                plot_ui.line(Line::new(series(&frame.phase)).color(PHASE_COLOR).name("φ(t)"));
                plot_ui.line(
                    Line::new(series(&frame.delayed_phase))
                        .color(DELAYED_COLOR)
                        .name("φ(t − τ)"),
                );
            });
    }
}

impl eframe::App for PhaseNoiseApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.key_pressed(egui::Key::Space)) {
            self.paused = !self.paused;
        }

        self.advance();

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.add_space(4.0);
            self.controls(ui);
            if let Some(msg) = &self.failure {
                ui.colored_label(egui::Color32::from_rgb(217, 77, 77), msg.as_str());
            }
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_height();
            if self.show_traces {
                let each = (available - 16.0) / 3.0;
                self.psd_plot(ui, each);
                self.trace_plots(ui, each);
            } else {
                self.psd_plot(ui, available);
            }
        });

        ctx.request_repaint();
    }
}
