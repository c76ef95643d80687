//! Preset files: [`Parms`] stored as JSON.
//!
//! ```json
//! {
//!   "width": 1920,
//!   "height": 1080,
//!   "maxIterations": 100,
//!   "offset": [0.0, 0.0],
//!   "zoom": 1.0,
//!   "colors": [[0.0, 0.0, 0.4, 1.0], ...]
//! }
//! ```
//!
//! Loading validates the whole document before producing a [`Parms`], so a
//! bad file never leaves the caller with a half-applied view.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::dvec2::DVec2;
use crate::error::CoreError;
use crate::parms::{Color, Parms, PALETTE_SIZE};

/// File extension of preset files.
pub const PRESET_EXTENSION: &str = "json";
/// Name of the preset written into an empty preset directory.
pub const DEFAULT_PRESET_NAME: &str = "default";

/// On-disk shape of a preset. Field order is the order written to disk.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PresetDocument {
    width: i32,
    height: i32,
    max_iterations: i32,
    offset: [f64; 2],
    zoom: f64,
    colors: [Color; PALETTE_SIZE],
}

impl From<&Parms> for PresetDocument {
    fn from(p: &Parms) -> Self {
        Self {
            width: p.width,
            height: p.height,
            max_iterations: p.max_iterations,
            offset: p.offset.to_array(),
            zoom: p.zoom,
            colors: p.colors,
        }
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Serialize `parms` as pretty-printed preset JSON.
pub fn to_json(parms: &Parms) -> crate::Result<String> {
    Ok(serde_json::to_string_pretty(&PresetDocument::from(parms))?)
}

/// Write `parms` to `path`.
pub fn save_preset(path: &Path, parms: &Parms) -> crate::Result<()> {
    let json = to_json(parms)?;
    fs::write(path, json).map_err(|e| CoreError::io(path, e))?;
    info!("Saved preset to {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Parse and validate preset JSON.
pub fn parse_preset(json: &str) -> crate::Result<Parms> {
    let doc: Value = serde_json::from_str(json)?;
    let obj = doc
        .as_object()
        .ok_or_else(|| CoreError::malformed("<root>", "expected a JSON object"))?;

    let width = int_field(obj, "width")?;
    let height = int_field(obj, "height")?;

    // Any value the view can reach must load back, so only shape and type
    // are checked here.
    let max_iterations = int_field(obj, "maxIterations")?;

    let zoom = required(obj, "zoom")?
        .as_f64()
        .ok_or_else(|| CoreError::malformed("zoom", "expected a number"))?;

    let offset: [f64; 2] = number_array(required(obj, "offset")?, "offset")?;

    let color_values = required(obj, "colors")?
        .as_array()
        .ok_or_else(|| CoreError::malformed("colors", "expected an array"))?;
    if color_values.len() != PALETTE_SIZE {
        return Err(CoreError::malformed(
            "colors",
            format!(
                "expected {PALETTE_SIZE} entries, got {}",
                color_values.len()
            ),
        ));
    }
    let mut colors = [[0.0f32; 4]; PALETTE_SIZE];
    for (i, (slot, value)) in colors.iter_mut().zip(color_values).enumerate() {
        let rgba: [f64; 4] = number_array(value, &format!("colors[{i}]"))?;
        *slot = rgba.map(|c| c as f32);
    }

    Ok(Parms::new(
        DVec2::from(offset),
        zoom,
        colors,
        width,
        height,
        max_iterations,
    ))
}

/// Read a preset from `path`.
///
/// A missing file is not an error: it yields `Ok(None)` and the caller keeps
/// its current state.
pub fn load_preset(path: &Path) -> crate::Result<Option<Parms>> {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No preset at {}", path.display());
            return Ok(None);
        }
        Err(e) => return Err(CoreError::io(path, e)),
    };
    let parms = parse_preset(&json)?;
    debug!(
        "Loaded preset {} ({}x{}, {} iterations)",
        path.display(),
        parms.width,
        parms.height,
        parms.max_iterations
    );
    Ok(Some(parms))
}

fn required<'a>(obj: &'a Map<String, Value>, field: &str) -> crate::Result<&'a Value> {
    obj.get(field)
        .ok_or_else(|| CoreError::malformed(field, "missing"))
}

fn int_field(obj: &Map<String, Value>, field: &str) -> crate::Result<i32> {
    let value = required(obj, field)?;
    let n = value
        .as_i64()
        .ok_or_else(|| CoreError::malformed(field, format!("expected an integer, got {value}")))?;
    i32::try_from(n).map_err(|_| CoreError::malformed(field, format!("{n} is out of range")))
}

fn number_array<const N: usize>(value: &Value, field: &str) -> crate::Result<[f64; N]> {
    let items = value
        .as_array()
        .ok_or_else(|| CoreError::malformed(field, "expected an array"))?;
    if items.len() != N {
        return Err(CoreError::malformed(
            field,
            format!("expected {N} numbers, got {}", items.len()),
        ));
    }
    let mut out = [0.0; N];
    for (i, (slot, item)) in out.iter_mut().zip(items).enumerate() {
        *slot = item
            .as_f64()
            .ok_or_else(|| CoreError::malformed(format!("{field}[{i}]"), "expected a number"))?;
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Preset directory
// ---------------------------------------------------------------------------

/// A preset file found in a [`PresetLibrary`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetEntry {
    /// File stem, shown to the user.
    pub name: String,
    pub path: PathBuf,
}

/// A directory of preset files, addressed by name.
#[derive(Debug, Clone)]
pub struct PresetLibrary {
    dir: PathBuf,
}

impl PresetLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// All presets in the directory, sorted by name. An unreadable or
    /// missing directory lists as empty.
    pub fn list(&self) -> Vec<PresetEntry> {
        let rd = match fs::read_dir(&self.dir) {
            Ok(rd) => rd,
            Err(e) => {
                debug!("Could not read preset dir {}: {e}", self.dir.display());
                return Vec::new();
            }
        };
        let mut entries: Vec<PresetEntry> = rd
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == PRESET_EXTENSION))
            .filter_map(|path| {
                let name = path.file_stem()?.to_string_lossy().into_owned();
                Some(PresetEntry { name, path })
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    /// File path for the preset called `name`.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir
            .join(sanitize_name(name))
            .with_extension(PRESET_EXTENSION)
    }

    pub fn load(&self, name: &str) -> crate::Result<Option<Parms>> {
        load_preset(&self.path_for(name))
    }

    pub fn save(&self, name: &str, parms: &Parms) -> crate::Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| CoreError::io(&self.dir, e))?;
        let path = self.path_for(name);
        save_preset(&path, parms)?;
        Ok(path)
    }

    /// Create the directory and seed it with [`DEFAULT_PRESET_NAME`] when it
    /// holds no preset yet.
    pub fn ensure_default(&self, parms: &Parms) -> crate::Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| CoreError::io(&self.dir, e))?;
        if self.list().is_empty() {
            let path = self.save(DEFAULT_PRESET_NAME, parms)?;
            info!("Created default preset at {}", path.display());
        }
        Ok(())
    }
}

/// Replace characters that are not allowed in file names with `_`.
fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect();
    if cleaned.is_empty() {
        warn!("Empty preset name, using {DEFAULT_PRESET_NAME:?}");
        DEFAULT_PRESET_NAME.to_string()
    } else {
        cleaned
    }
}
