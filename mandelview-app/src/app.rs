use std::time::Instant;

use eframe::egui;
use tracing::{debug, error, info, warn};

use mandelview_core::{Parms, PresetEntry, PresetLibrary, ViewInput};
use mandelview_render::{FrameDriver, SoftwareDevice, SoftwareKernel};

use crate::preferences::AppPreferences;

/// Smoothing applied to the FPS and frame-time readouts.
const STATS_SMOOTHING: f32 = 0.1;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

pub(crate) struct MandelViewApp {
    pub(crate) driver: FrameDriver<SoftwareDevice>,
    pub(crate) preferences: AppPreferences,
    pub(crate) presets: PresetLibrary,
    pub(crate) selected_preset: String,

    pub(crate) texture: Option<egui::TextureHandle>,

    pub(crate) show_title_bar: bool,
    pub(crate) show_view_port: bool,
    pub(crate) show_settings: bool,
    pub(crate) cursor_visible: bool,

    pub(crate) fps: f32,
    pub(crate) cpu_frame_ms: f32,
    last_frame: Instant,
}

impl MandelViewApp {
    pub(crate) fn new(preferences: AppPreferences) -> Self {
        let presets = PresetLibrary::new(preferences.presets_directory());
        if let Err(e) = presets.ensure_default(&Parms::default()) {
            warn!("Could not prepare preset directory: {e}");
        }

        let mut driver = FrameDriver::new(
            SoftwareDevice::new(),
            SoftwareKernel::mandelbrot(),
            Parms::default(),
            preferences.record_directory(),
        );
        driver.controller_mut().zoom_in_factor = preferences.zoom_in_factor;
        driver.controller_mut().zoom_out_factor = preferences.zoom_out_factor;

        let mut app = Self {
            driver,
            selected_preset: preferences.startup_preset.clone(),
            presets,
            preferences,
            texture: None,
            show_title_bar: true,
            show_view_port: true,
            show_settings: true,
            cursor_visible: true,
            fps: 0.0,
            cpu_frame_ms: 0.0,
            last_frame: Instant::now(),
        };
        app.load_startup_preset();
        app
    }

    // -- Presets ------------------------------------------------------------

    fn load_startup_preset(&mut self) {
        let name = self.preferences.startup_preset.clone();
        let path = self.presets.path_for(&name);
        match self.driver.load_preset(&path) {
            Ok(true) => self.selected_preset = name,
            Ok(false) => debug!("Startup preset {name:?} not found"),
            Err(e) => error!("Failed to load startup preset {name:?}: {e}"),
        }
    }

    pub(crate) fn load_preset_entry(&mut self, entry: &PresetEntry) {
        match self.driver.load_preset(&entry.path) {
            Ok(true) => self.selected_preset = entry.name.clone(),
            Ok(false) => warn!("Preset {} disappeared", entry.path.display()),
            Err(e) => error!("Failed to load preset {}: {e}", entry.path.display()),
        }
    }

    /// Ask for a target file and write the current parameters to it.
    pub(crate) fn save_preset_dialog(&mut self) {
        let dir = self.presets.directory();
        let mut dialog = rfd::FileDialog::new()
            .add_filter("Preset", &["json"])
            .set_file_name(format!("{}.json", self.selected_preset));
        if dir.is_dir() {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.save_file() else {
            return;
        };
        match self.driver.save_preset(&path) {
            Ok(()) => {
                if let Some(stem) = path.file_stem() {
                    self.selected_preset = stem.to_string_lossy().into_owned();
                }
            }
            Err(e) => error!("Failed to save preset: {e}"),
        }
    }

    pub(crate) fn pick_record_folder(&mut self) {
        let current = self.driver.recorder().directory().to_path_buf();
        let mut dialog = rfd::FileDialog::new();
        if current.is_dir() {
            dialog = dialog.set_directory(&current);
        }
        if let Some(folder) = dialog.pick_folder() {
            self.preferences.record_dir = folder.to_string_lossy().to_string();
            self.preferences.save();
            self.driver.set_record_dir(folder);
        }
    }

    // -- Edit menu actions --------------------------------------------------

    /// Return to the startup preset, or the built-in view if it is missing.
    pub(crate) fn restart(&mut self) {
        info!("Restarting view");
        let path = self.presets.path_for(&self.preferences.startup_preset);
        match self.driver.load_preset(&path) {
            Ok(true) => self.selected_preset = self.preferences.startup_preset.clone(),
            Ok(false) => {
                let current = self.driver.parms();
                let mut parms = Parms::default();
                parms.set_resolution(current.width, current.height);
                self.driver.reset(parms);
            }
            Err(e) => error!("Failed to reload startup preset: {e}"),
        }
    }

    // -- Frame --------------------------------------------------------------

    fn update_stats(&mut self, cpu_ms: f32) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        if dt > 0.0 {
            self.fps += (1.0 / dt - self.fps) * STATS_SMOOTHING;
        }
        self.cpu_frame_ms += (cpu_ms - self.cpu_frame_ms) * STATS_SMOOTHING;
    }

    fn remember_window_size(&mut self, ctx: &egui::Context) {
        let (rect, fullscreen) = ctx.input(|i| (i.viewport().inner_rect, i.viewport().fullscreen));
        if fullscreen == Some(true) {
            return;
        }
        if let Some(rect) = rect {
            self.preferences.window_width = rect.width();
            self.preferences.window_height = rect.height();
        }
    }

    fn upload_texture(&mut self, ctx: &egui::Context) {
        let image = match self.driver.output_image() {
            Ok(image) => image,
            Err(e) => {
                debug!("No output image this frame: {e}");
                return;
            }
        };
        let color_image = egui::ColorImage::from_rgba_unmultiplied(
            [image.width as usize, image.height as usize],
            &image.pixels,
        );
        match &mut self.texture {
            Some(texture) => texture.set(color_image, egui::TextureOptions::LINEAR),
            None => {
                self.texture =
                    Some(ctx.load_texture("mandelbrot", color_image, egui::TextureOptions::LINEAR))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// eframe::App
// ---------------------------------------------------------------------------

impl eframe::App for MandelViewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let started = Instant::now();
        ctx.set_visuals(egui::Visuals::dark());

        if let Err(e) = self.driver.begin_frame() {
            error!("Could not begin frame: {e}");
            ctx.request_repaint();
            return;
        }

        if self.show_title_bar {
            self.draw_menu_bar(ctx);
        }
        self.show_settings_panel(ctx);
        let input = if self.show_view_port {
            self.draw_view_port(ctx)
        } else {
            egui::CentralPanel::default().show(ctx, |_| {});
            ViewInput::default()
        };
        self.handle_shortcuts(ctx);
        if !self.cursor_visible {
            ctx.set_cursor_icon(egui::CursorIcon::None);
        }

        if let Err(e) = self.driver.update(&input) {
            error!("Frame update failed: {e}");
        }
        if let Err(e) = self.driver.end_frame() {
            error!("Could not end frame: {e}");
        }
        self.upload_texture(ctx);
        self.remember_window_size(ctx);

        self.update_stats(started.elapsed().as_secs_f32() * 1000.0);
        ctx.request_repaint();
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        let controller = self.driver.controller();
        self.preferences.zoom_in_factor = controller.zoom_in_factor;
        self.preferences.zoom_out_factor = controller.zoom_out_factor;
        self.preferences.save();
        info!("Saved preferences on exit");
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub(crate) fn run() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting MandelView");

    let prefs = AppPreferences::load();

    let viewport = egui::ViewportBuilder::default()
        .with_title("MandelView")
        .with_inner_size([prefs.window_width, prefs.window_height]);

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "MandelView",
        options,
        Box::new(move |_cc| Ok(Box::new(MandelViewApp::new(prefs)))),
    )
}
