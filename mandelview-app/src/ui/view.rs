use eframe::egui;

use mandelview_core::ViewInput;

use crate::app::MandelViewApp;

impl MandelViewApp {
    /// Draw the output image scaled to fill the central panel and return the
    /// navigation input gathered over it.
    pub(crate) fn draw_view_port(&mut self, ctx: &egui::Context) -> ViewInput {
        let mut input = ViewInput::default();
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                let size = ui.available_size();
                let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click_and_drag());

                if self.preferences.use_viewport_size {
                    let ppp = ctx.pixels_per_point();
                    let width = (rect.width() * ppp).round() as i32;
                    let height = (rect.height() * ppp).round() as i32;
                    self.driver.request_resize(width, height);
                }

                if let Some(texture) = &self.texture {
                    ui.painter().image(
                        texture.id(),
                        rect,
                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        egui::Color32::WHITE,
                    );
                }

                input = self.view_input(ctx, &response);
            });
        input
    }
}
