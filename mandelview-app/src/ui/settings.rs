use eframe::egui;

use mandelview_core::{MIN_DIMENSION, PALETTE_SIZE};

use crate::app::MandelViewApp;

const RECORDING_GREEN: egui::Color32 = egui::Color32::from_rgb(0, 140, 0);

impl MandelViewApp {
    pub(crate) fn show_settings_panel(&mut self, ctx: &egui::Context) {
        if !self.show_settings {
            return;
        }

        let mut open = true;
        egui::Window::new("Setting")
            .open(&mut open)
            .resizable(true)
            .default_width(300.0)
            .frame(
                egui::Frame::window(&ctx.style())
                    .fill(egui::Color32::from_rgba_unmultiplied(10, 10, 10, 210)),
            )
            .show(ctx, |ui| {
                egui::CollapsingHeader::new("Application")
                    .default_open(true)
                    .show(ui, |ui| self.settings_application(ui));
                egui::CollapsingHeader::new("Export")
                    .default_open(true)
                    .show(ui, |ui| self.settings_export(ui));
                egui::CollapsingHeader::new("Environment")
                    .default_open(true)
                    .show(ui, |ui| self.settings_environment(ui));
            });
        if !open {
            self.show_settings = false;
        }
    }

    fn settings_application(&mut self, ui: &mut egui::Ui) {
        egui::Grid::new("application_grid")
            .num_columns(2)
            .spacing([12.0, 4.0])
            .show(ui, |ui| {
                ui.label("Backend");
                ui.label(self.driver.backend_name());
                ui.end_row();
                ui.label("FPS");
                ui.label(format!("{:.1}", self.fps));
                ui.end_row();
                ui.label("CPU");
                ui.label(format!("{:.2} ms", self.cpu_frame_ms));
                ui.end_row();
            });
    }

    fn settings_export(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Save").clicked() {
                self.save_preset_dialog();
            }

            let mut chosen = None;
            egui::ComboBox::from_label("Presets")
                .selected_text(self.selected_preset.as_str())
                .show_ui(ui, |ui| {
                    // Re-read while open so files dropped into the folder show up.
                    for entry in self.presets.list() {
                        let selected = entry.name == self.selected_preset;
                        if ui.selectable_label(selected, &entry.name).clicked() {
                            chosen = Some(entry);
                        }
                    }
                });
            if let Some(entry) = chosen {
                self.load_preset_entry(&entry);
            }
        });

        ui.horizontal(|ui| {
            if ui
                .button("...")
                .on_hover_text(self.driver.recorder().directory().display().to_string())
                .clicked()
            {
                self.pick_record_folder();
            }

            let recording = self.driver.is_recording();
            let button = if recording {
                egui::Button::new(egui::RichText::new("Stop").color(egui::Color32::WHITE))
                    .fill(RECORDING_GREEN)
            } else {
                egui::Button::new("Record")
            };
            if ui.add(button).clicked() {
                self.driver.toggle_recording();
            }
            if recording {
                ui.label(format!("frame {}", self.driver.recorder().next_index()));
            }
        });
    }

    fn settings_environment(&mut self, ui: &mut egui::Ui) {
        if ui
            .checkbox(&mut self.preferences.use_viewport_size, "Use viewport size")
            .changed()
        {
            self.preferences.save();
        }

        let parms = *self.driver.parms();
        if !self.preferences.use_viewport_size {
            let (mut width, mut height) = (parms.width, parms.height);
            let mut changed = false;
            ui.horizontal(|ui| {
                ui.label("Width");
                changed |= ui
                    .add(egui::DragValue::new(&mut width).range(MIN_DIMENSION..=16384))
                    .changed();
                ui.label("Height");
                changed |= ui
                    .add(egui::DragValue::new(&mut height).range(MIN_DIMENSION..=16384))
                    .changed();
            });
            if changed {
                self.driver.request_resize(width, height);
            }
        }

        let mut max_iterations = parms.max_iterations;
        ui.horizontal(|ui| {
            ui.label("maxIterations");
            if ui
                .add(egui::DragValue::new(&mut max_iterations).range(1..=100_000))
                .changed()
            {
                self.driver.set_max_iterations(max_iterations);
            }
        });

        ui.horizontal(|ui| {
            let controller = self.driver.controller_mut();
            ui.label("Zoom in");
            ui.add(egui::DragValue::new(&mut controller.zoom_in_factor).speed(0.0005));
            ui.label("out");
            ui.add(egui::DragValue::new(&mut controller.zoom_out_factor).speed(0.0005));
        });

        ui.add_space(4.0);
        egui::Grid::new("palette_grid")
            .num_columns(2)
            .spacing([12.0, 2.0])
            .show(ui, |ui| {
                for i in 0..PALETTE_SIZE {
                    let [r, g, b, a] = parms.colors[i];
                    let mut rgb = [r, g, b];
                    ui.label(format!("color{i}"));
                    if ui.color_edit_button_rgb(&mut rgb).changed() {
                        self.driver.set_color(i, [rgb[0], rgb[1], rgb[2], a]);
                    }
                    ui.end_row();
                }
            });
    }
}
