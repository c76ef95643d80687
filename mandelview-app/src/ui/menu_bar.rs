use eframe::egui;

use crate::app::MandelViewApp;

impl MandelViewApp {
    /// Draw the top menu bar. Must be called **before** `CentralPanel` so that
    /// `egui` reserves vertical space for it.
    pub(crate) fn draw_menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                self.menu_edit(ui, ctx);
                self.menu_window(ui);
            });
        });
    }

    fn menu_edit(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.menu_button("Edit", |ui| {
            if ui.add(shortcut_item("Restart", "Shift+Esc")).clicked() {
                ui.close();
                self.restart();
            }
            if ui.add(shortcut_item("Full Screen", "F")).clicked() {
                ui.close();
                self.toggle_fullscreen(ctx);
            }
            ui.separator();
            if ui.add(shortcut_item("Exit", "Esc")).clicked() {
                ui.close();
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        });
    }

    fn menu_window(&mut self, ui: &mut egui::Ui) {
        ui.menu_button("Window", |ui| {
            toggle_item(ui, &mut self.show_title_bar, "Title Bar", "T");
            toggle_item(ui, &mut self.show_view_port, "View Port", "Alt+1");
            toggle_item(ui, &mut self.show_settings, "Setting", "Alt+2");
        });
    }
}

fn toggle_item(ui: &mut egui::Ui, flag: &mut bool, label: &str, shortcut: &str) {
    let mark = if *flag { "\u{2714} " } else { "    " };
    if ui.add(shortcut_item(&format!("{mark}{label}"), shortcut)).clicked() {
        ui.close();
        *flag = !*flag;
    }
}

/// Build a `Button` with a right-aligned keyboard shortcut hint.
fn shortcut_item(label: &str, shortcut: &str) -> egui::Button<'static> {
    let text = format!("{label}    {shortcut}");
    egui::Button::new(egui::RichText::new(text).size(13.0)).wrap_mode(egui::TextWrapMode::Extend)
}
