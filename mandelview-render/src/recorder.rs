//! Frame recording: one PNG per captured frame.

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::buffer::RgbaImage;
use crate::error::RenderError;

/// Writes captured frames as `frame_NNNNNN.png` into a target directory.
#[derive(Debug)]
pub struct FrameRecorder {
    directory: PathBuf,
    recording: bool,
    next_index: u64,
}

impl FrameRecorder {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            recording: false,
            next_index: 0,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Index the next captured frame will be written under.
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    pub fn set_directory(&mut self, directory: impl Into<PathBuf>) {
        self.directory = directory.into();
        info!("Recording directory set to {}", self.directory.display());
    }

    /// Flip recording and return the new state.
    pub fn toggle(&mut self) -> bool {
        self.recording = !self.recording;
        if self.recording {
            info!(
                "Recording started in {} at frame {}",
                self.directory.display(),
                self.next_index
            );
        } else {
            info!("Recording stopped after frame {}", self.next_index);
        }
        self.recording
    }

    pub fn stop(&mut self) {
        self.recording = false;
    }

    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.directory.join(format!("frame_{index:06}.png"))
    }

    /// Write `image` as the next frame and return its path.
    pub fn capture(&mut self, image: &RgbaImage) -> crate::Result<PathBuf> {
        std::fs::create_dir_all(&self.directory).map_err(|source| RenderError::Io {
            path: self.directory.clone(),
            source,
        })?;
        let path = self.frame_path(self.next_index);
        write_png(&path, image)?;
        self.next_index += 1;
        debug!("Captured frame to {}", path.display());
        Ok(path)
    }
}

/// Encode an RGBA8 image as PNG with a `Software` tEXt chunk.
pub fn write_png(path: &Path, image: &RgbaImage) -> crate::Result<()> {
    let file = std::fs::File::create(path).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, image.width, image.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Fast);
    encoder
        .add_text_chunk("Software".to_string(), "MandelView".to_string())
        .map_err(|e| RenderError::Capture(format!("failed to add text chunk: {e}")))?;

    let mut png_writer = encoder
        .write_header()
        .map_err(|e| RenderError::Capture(format!("failed to write PNG header: {e}")))?;
    png_writer
        .write_image_data(&image.pixels)
        .map_err(|e| RenderError::Capture(format!("failed to write PNG image data: {e}")))?;
    Ok(())
}
