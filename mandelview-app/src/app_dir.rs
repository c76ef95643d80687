//! Directory where the executable lives. Used for preferences, presets, and recordings
//! so that data is stored next to the app when run as a standalone exe.

use std::path::PathBuf;

/// Directory containing the running executable. Falls back to current directory if unavailable.
pub fn exe_directory() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Default directory for preset JSON files.
pub fn presets_directory() -> PathBuf {
    exe_directory().join("presets")
}

/// Default directory for recorded frames.
pub fn recordings_directory() -> PathBuf {
    exe_directory().join("recordings")
}
