pub mod dvec2;
pub mod error;
pub mod mandelbrot;
pub mod navigation;
pub mod parms;
pub mod preset;

// Re-export primary types for convenience.
pub use dvec2::DVec2;
pub use error::CoreError;
pub use mandelbrot::{escape_time, Escape};
pub use navigation::{
    window_delta_to_image, window_to_image, zoom_at, PanKeys, ViewController, ViewInput,
};
pub use parms::{Color, Parms, DEFAULT_PALETTE, MIN_DIMENSION, PALETTE_SIZE, WORKGROUP_SIZE};
pub use preset::{load_preset, save_preset, PresetEntry, PresetLibrary, DEFAULT_PRESET_NAME};

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
