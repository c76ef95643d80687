use eframe::egui;

use mandelview_core::{window_delta_to_image, window_to_image, DVec2, PanKeys, ViewInput};

use crate::app::MandelViewApp;

/// Points of scroll delta that make up one wheel step.
const SCROLL_POINTS_PER_STEP: f32 = 50.0;

fn to_dvec(v: egui::Vec2) -> DVec2 {
    DVec2::new(v.x as f64, v.y as f64)
}

/// Image-space position of `pos` for an image of `width × height` drawn at
/// `rect`. Positions outside `rect` map outside the image. `None` means the
/// pointer has left the window, so the image centre is used.
fn pointer_in_image(pos: Option<egui::Pos2>, rect: egui::Rect, width: i32, height: i32) -> DVec2 {
    match pos {
        Some(pos) => window_to_image(
            to_dvec(pos.to_vec2()),
            to_dvec(rect.min.to_vec2()),
            to_dvec(rect.size()),
            width,
            height,
        ),
        None => DVec2::new(width as f64, height as f64) * 0.5,
    }
}

impl MandelViewApp {
    /// Collect this frame's navigation input for the image drawn at
    /// `response.rect`.
    pub(crate) fn view_input(&self, ctx: &egui::Context, response: &egui::Response) -> ViewInput {
        let parms = self.driver.parms();
        let rect = response.rect;
        let display = to_dvec(rect.size());

        // Held zoom keeps following the cursor after it leaves the view.
        let pointer = pointer_in_image(ctx.pointer_latest_pos(), rect, parms.width, parms.height);

        let drag_delta = response
            .dragged_by(egui::PointerButton::Middle)
            .then(|| window_delta_to_image(to_dvec(response.drag_delta()), display, parms.width, parms.height));

        ctx.input(|i| {
            // Some platforms turn a shifted wheel into horizontal scrolling.
            let delta = i.raw_scroll_delta;
            let scroll = if delta.y != 0.0 { delta.y } else { delta.x };
            ViewInput {
                pointer,
                hovered: response.hovered(),
                scroll: (scroll / SCROLL_POINTS_PER_STEP) as f64,
                zoom_in_held: i.modifiers.ctrl,
                zoom_out_held: i.modifiers.shift,
                drag_delta,
                pan_keys: PanKeys {
                    left: i.key_down(egui::Key::ArrowLeft),
                    right: i.key_down(egui::Key::ArrowRight),
                    up: i.key_down(egui::Key::ArrowUp),
                    down: i.key_down(egui::Key::ArrowDown),
                },
                fast_pan: i.modifiers.alt,
            }
        })
    }

    pub(crate) fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let text_editing = ctx.memory(|m| m.focused().is_some());
        if text_editing {
            return;
        }

        let (shift, alt) = ctx.input(|i| (i.modifiers.shift, i.modifiers.alt));
        let pressed = |key| ctx.input(|i| i.key_pressed(key));

        if pressed(egui::Key::Escape) {
            if shift {
                self.restart();
            } else {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        }
        if pressed(egui::Key::F) {
            self.toggle_fullscreen(ctx);
        }
        if pressed(egui::Key::T) {
            self.show_title_bar = !self.show_title_bar;
        }
        if pressed(egui::Key::H) {
            self.cursor_visible = !self.cursor_visible;
        }
        if shift && pressed(egui::Key::M) {
            self.toggle_maximized(ctx);
        }
        if alt && pressed(egui::Key::Num1) {
            self.show_view_port = !self.show_view_port;
        }
        if alt && pressed(egui::Key::Num2) {
            self.show_settings = !self.show_settings;
        }
    }

    pub(crate) fn toggle_fullscreen(&mut self, ctx: &egui::Context) {
        let fullscreen = ctx.input(|i| i.viewport().fullscreen.unwrap_or(false));
        ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(!fullscreen));
    }

    pub(crate) fn toggle_maximized(&mut self, ctx: &egui::Context) {
        let maximized = ctx.input(|i| i.viewport().maximized.unwrap_or(false));
        ctx.send_viewport_cmd(egui::ViewportCommand::Maximized(!maximized));
    }
}
