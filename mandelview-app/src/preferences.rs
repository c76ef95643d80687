use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use mandelview_core::navigation::{DEFAULT_ZOOM_IN_FACTOR, DEFAULT_ZOOM_OUT_FACTOR};
use mandelview_core::DEFAULT_PRESET_NAME;

// ---------------------------------------------------------------------------
// Application preferences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppPreferences {
    #[serde(default = "default_window_width")]
    pub window_width: f32,
    #[serde(default = "default_window_height")]
    pub window_height: f32,
    /// Custom presets directory. When empty, a `presets/` folder next to the executable is used.
    #[serde(default)]
    pub presets_dir: String,
    /// Preset applied at startup and on restart.
    #[serde(default = "default_startup_preset")]
    pub startup_preset: String,
    /// Custom recording directory. When empty, a `recordings/` folder next to the executable is used.
    #[serde(default)]
    pub record_dir: String,
    /// Drive the output resolution from the view panel size.
    #[serde(default = "default_true")]
    pub use_viewport_size: bool,
    #[serde(default = "default_zoom_in_factor")]
    pub zoom_in_factor: f64,
    #[serde(default = "default_zoom_out_factor")]
    pub zoom_out_factor: f64,
}

fn default_window_width() -> f32 {
    1280.0
}
fn default_window_height() -> f32 {
    720.0
}
fn default_startup_preset() -> String {
    DEFAULT_PRESET_NAME.to_string()
}
fn default_true() -> bool {
    true
}
fn default_zoom_in_factor() -> f64 {
    DEFAULT_ZOOM_IN_FACTOR
}
fn default_zoom_out_factor() -> f64 {
    DEFAULT_ZOOM_OUT_FACTOR
}

impl Default for AppPreferences {
    fn default() -> Self {
        Self {
            window_width: default_window_width(),
            window_height: default_window_height(),
            presets_dir: String::new(),
            startup_preset: default_startup_preset(),
            record_dir: String::new(),
            use_viewport_size: true,
            zoom_in_factor: default_zoom_in_factor(),
            zoom_out_factor: default_zoom_out_factor(),
        }
    }
}

impl AppPreferences {
    /// Load preferences from next to the executable, falling back to defaults.
    pub fn load() -> Self {
        let path = config_path();
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(json) => match serde_json::from_str::<AppPreferences>(&json) {
                    Ok(prefs) => {
                        info!("Loaded preferences from {}", path.display());
                        return prefs;
                    }
                    Err(e) => {
                        error!("Failed to parse preferences: {e}");
                    }
                },
                Err(e) => {
                    error!("Failed to read preferences file: {e}");
                }
            }
        } else {
            debug!("No preferences file at {}", path.display());
        }
        Self::default()
    }

    /// Persist preferences to disk.
    pub fn save(&self) {
        let path = config_path();
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = fs::write(&path, &json) {
                    error!("Failed to write preferences: {e}");
                } else {
                    debug!("Saved preferences");
                }
            }
            Err(e) => error!("Failed to serialize preferences: {e}"),
        }
    }

    pub fn presets_directory(&self) -> PathBuf {
        non_empty_or(&self.presets_dir, crate::app_dir::presets_directory)
    }

    pub fn record_directory(&self) -> PathBuf {
        non_empty_or(&self.record_dir, crate::app_dir::recordings_directory)
    }
}

fn non_empty_or(custom: &str, fallback: fn() -> PathBuf) -> PathBuf {
    let trimmed = custom.trim();
    if trimmed.is_empty() {
        fallback()
    } else {
        PathBuf::from(trimmed)
    }
}

fn config_path() -> PathBuf {
    crate::app_dir::exe_directory().join("preferences.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let prefs: AppPreferences =
            serde_json::from_str(r#"{"window_width": 800.0, "record_dir": "/tmp/frames"}"#).unwrap();
        assert_eq!(prefs.window_width, 800.0);
        assert_eq!(prefs.window_height, 720.0);
        assert_eq!(prefs.startup_preset, "default");
        assert!(prefs.use_viewport_size);
        assert_eq!(prefs.zoom_in_factor, DEFAULT_ZOOM_IN_FACTOR);
        assert_eq!(prefs.record_directory(), PathBuf::from("/tmp/frames"));
    }

    #[test]
    fn empty_directories_fall_back_next_to_exe() {
        let prefs = AppPreferences {
            presets_dir: "   ".into(),
            ..AppPreferences::default()
        };
        assert_eq!(prefs.presets_directory(), crate::app_dir::presets_directory());
        assert_eq!(prefs.record_directory(), crate::app_dir::recordings_directory());
    }

    #[test]
    fn round_trips_through_json() {
        let prefs = AppPreferences {
            startup_preset: "spiral".into(),
            use_viewport_size: false,
            zoom_in_factor: 1.01,
            ..AppPreferences::default()
        };
        let json = serde_json::to_string_pretty(&prefs).unwrap();
        let back: AppPreferences = serde_json::from_str(&json).unwrap();
        assert_eq!(back, prefs);
    }
}
