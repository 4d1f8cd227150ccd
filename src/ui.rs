//! Parameter panel (requires the `egui` feature).
//!
//! Edits a [`Settings`] snapshot in place; the frame loop hands the result
//! to the engine afterwards.

use tracing::{info, warn};

use crate::settings::{Settings, SimulationMode};

/// Read-only figures shown in the panel.
#[derive(Clone, Debug, Default)]
pub struct PanelStats {
    pub fps: f32,
    pub particles: u32,
    pub max_particles: u32,
    /// Set when the requested particle count had to be clamped.
    pub clamp_warning: Option<String>,
    pub paused: bool,
}

/// The settings window plus preset file handling.
pub struct SettingsPanel {
    preset_path: String,
    status: Option<String>,
}

impl SettingsPanel {
    pub fn new() -> Self {
        Self {
            preset_path: "preset.json".to_string(),
            status: None,
        }
    }

    pub fn show(&mut self, ctx: &egui::Context, settings: &mut Settings, stats: &PanelStats) {
        egui::Window::new("Particles")
            .default_pos([10.0, 10.0])
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(format!("{:.0} fps", stats.fps));
                if stats.paused {
                    ui.label("Paused (space to resume)");
                }
                if let Some(warning) = &stats.clamp_warning {
                    ui.colored_label(egui::Color32::YELLOW, warning);
                }
                ui.separator();

                ui.heading("Emitter");
                ui.add(
                    egui::Slider::new(&mut settings.number_of_particles, 1..=stats.max_particles.max(1))
                        .logarithmic(true)
                        .text("Particles"),
                );
                ui.add(
                    egui::Slider::new(&mut settings.min_particle_lifetime, 0.05..=10.0)
                        .text("Min lifetime"),
                );
                ui.add(
                    egui::Slider::new(&mut settings.max_particle_lifetime, 0.05..=10.0)
                        .text("Max lifetime"),
                );
                if settings.max_particle_lifetime < settings.min_particle_lifetime {
                    settings.max_particle_lifetime = settings.min_particle_lifetime;
                }
                ui.add(egui::Slider::new(&mut settings.initial_velocity, 0.0..=5.0).text("Velocity"));

                let mut limited = settings.spawn_rate.is_some();
                ui.checkbox(&mut limited, "Limit spawn rate");
                match (limited, settings.spawn_rate.as_mut()) {
                    (true, Some(rate)) => {
                        ui.add(
                            egui::Slider::new(rate, 1.0..=1_000_000.0)
                                .logarithmic(true)
                                .text("Spawns/s"),
                        );
                    }
                    (true, None) => settings.spawn_rate = Some(1000.0),
                    (false, _) => settings.spawn_rate = None,
                }

                ui.separator();
                ui.heading("Forces");
                vec3_row(ui, "Gravity", &mut settings.gravity);
                vec3_row(ui, "Origin", &mut settings.origin);

                ui.separator();
                ui.heading("Look");
                ui.horizontal(|ui| {
                    ui.label("Young");
                    ui.color_edit_button_rgba_unmultiplied(&mut settings.color);
                    ui.label("Old");
                    ui.color_edit_button_rgba_unmultiplied(&mut settings.color2);
                });
                ui.add(egui::Slider::new(&mut settings.half_width, 0.001..=0.2).text("Half width"));
                ui.add(egui::Slider::new(&mut settings.half_height, 0.001..=0.2).text("Half height"));

                egui::ComboBox::from_label("Mode")
                    .selected_text(match settings.mode {
                        SimulationMode::Gpu => "GPU",
                        SimulationMode::Cpu => "CPU",
                    })
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut settings.mode, SimulationMode::Gpu, "GPU");
                        ui.selectable_value(&mut settings.mode, SimulationMode::Cpu, "CPU");
                    });

                ui.separator();
                ui.heading("Preset");
                ui.text_edit_singleline(&mut self.preset_path);
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        self.save(settings);
                    }
                    if ui.button("Load").clicked() {
                        self.load(settings);
                    }
                    if ui.button("Reset").clicked() {
                        *settings = Settings::default();
                        self.status = None;
                    }
                });
                if let Some(status) = &self.status {
                    ui.label(status);
                }

                ui.separator();
                ui.label(format!("{} particles live", stats.particles));
                ui.label("Drag to orbit, scroll to zoom");
            });
    }

    fn save(&mut self, settings: &Settings) {
        self.status = Some(match settings.save(&self.preset_path) {
            Ok(()) => {
                info!(path = %self.preset_path, "preset saved");
                format!("Saved {}", self.preset_path)
            }
            Err(e) => {
                warn!(path = %self.preset_path, "could not save preset: {e}");
                e.to_string()
            }
        });
    }

    fn load(&mut self, settings: &mut Settings) {
        self.status = Some(match Settings::load(&self.preset_path) {
            Ok(loaded) => {
                info!(path = %self.preset_path, "preset loaded");
                *settings = loaded;
                format!("Loaded {}", self.preset_path)
            }
            Err(e) => {
                warn!(path = %self.preset_path, "could not load preset: {e}");
                e.to_string()
            }
        });
    }
}

impl Default for SettingsPanel {
    fn default() -> Self {
        Self::new()
    }
}

fn vec3_row(ui: &mut egui::Ui, label: &str, value: &mut glam::Vec3) {
    ui.horizontal(|ui| {
        ui.label(label);
        ui.add(egui::DragValue::new(&mut value.x).speed(0.01).prefix("x "));
        ui.add(egui::DragValue::new(&mut value.y).speed(0.01).prefix("y "));
        ui.add(egui::DragValue::new(&mut value.z).speed(0.01).prefix("z "));
    });
}
