//! The per-frame state machine: `begin_frame → update → end_frame`.
//!
//! Settings changes that invalidate the compute resources are never applied
//! mid-frame. They are queued on the main-thread task queue and executed at
//! the start of the next [`FrameDriver::begin_frame`].

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, trace};

use mandelview_core::{Color, Parms, ViewController, ViewInput, PALETTE_SIZE};

use crate::buffer::RgbaImage;
use crate::device::ComputeDevice;
use crate::error::RenderError;
use crate::recorder::FrameRecorder;
use crate::resources::ResourceManager;
use crate::tasks::{FrameTask, MainThreadQueue};

/// Where the driver is within the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    /// Between frames.
    Idle,
    /// Command stream open, nothing dispatched yet.
    Open,
    /// `update` has run for this frame.
    Dispatched,
}

/// Owns the device, the parameter block and everything that depends on them.
pub struct FrameDriver<D: ComputeDevice> {
    device: D,
    resources: ResourceManager<D>,
    parms: Parms,
    controller: ViewController,
    tasks: MainThreadQueue<FrameTask>,
    recorder: FrameRecorder,
    phase: FramePhase,
    rendered_this_frame: bool,
    frames: u64,
}

impl<D: ComputeDevice> FrameDriver<D> {
    /// Create a driver. The first rebuild runs at the first `begin_frame`.
    pub fn new(device: D, kernel: D::Kernel, parms: Parms, record_dir: impl Into<PathBuf>) -> Self {
        let mut tasks = MainThreadQueue::new();
        tasks.submit(FrameTask::RebuildResources);
        info!("Frame driver using {} backend", device.backend_name());
        Self {
            device,
            resources: ResourceManager::new(kernel),
            parms,
            controller: ViewController::default(),
            tasks,
            recorder: FrameRecorder::new(record_dir),
            phase: FramePhase::Idle,
            rendered_this_frame: false,
            frames: 0,
        }
    }

    // -- Frame lifecycle ----------------------------------------------------

    /// Run queued main-thread tasks, then open the command stream.
    pub fn begin_frame(&mut self) -> crate::Result<()> {
        self.expect_phase("begin_frame", &[FramePhase::Idle])?;

        for task in self.tasks.drain() {
            match task {
                FrameTask::RebuildResources => {
                    let (w, h) = self.parms.extent();
                    if let Err(e) = self.resources.rebuild(&mut self.device, w, h) {
                        error!("Rendering paused until the next successful rebuild: {e}");
                    }
                }
                FrameTask::ToggleRecording => {
                    self.recorder.toggle();
                }
            }
        }

        self.device.open_commands()?;
        self.rendered_this_frame = false;
        self.phase = FramePhase::Open;
        Ok(())
    }

    /// Apply navigation input, upload the parameter block and dispatch the
    /// kernel. Returns `true` if the view moved.
    pub fn update(&mut self, input: &ViewInput) -> crate::Result<bool> {
        self.expect_phase("update", &[FramePhase::Open])?;
        self.phase = FramePhase::Dispatched;

        let moved = self.controller.apply(&mut self.parms, input);

        let (w, h) = self.parms.extent();
        let Some(res) = self.resources.resources().filter(|r| (r.width, r.height) == (w, h)) else {
            trace!("Skipping dispatch: resources not ready for {w}x{h}");
            return Ok(moved);
        };

        let (groups_x, groups_y) = self.parms.workgroups();
        self.device.write_buffer(&res.buffer, self.parms.as_bytes())?;
        self.device
            .dispatch(&res.pipeline, &res.bindings, groups_x, groups_y)?;
        self.rendered_this_frame = true;
        Ok(moved)
    }

    /// Submit the frame, wait for the device, then capture it if recording.
    pub fn end_frame(&mut self) -> crate::Result<()> {
        self.expect_phase("end_frame", &[FramePhase::Open, FramePhase::Dispatched])?;
        self.phase = FramePhase::Idle;
        self.device.submit()?;
        self.device.wait_idle();
        self.frames += 1;

        if self.recorder.is_recording() && self.rendered_this_frame {
            if let Err(e) = self.capture() {
                error!("Frame capture failed, recording stopped: {e}");
                self.recorder.stop();
            }
        }
        Ok(())
    }

    fn capture(&mut self) -> crate::Result<PathBuf> {
        let image = self.output_image()?;
        self.recorder.capture(&image)
    }

    fn expect_phase(&self, operation: &'static str, allowed: &[FramePhase]) -> crate::Result<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(RenderError::FrameOrder {
                operation,
                phase: self.phase,
            })
        }
    }

    // -- Settings -----------------------------------------------------------

    /// Change the output resolution. The resources follow at the next frame.
    pub fn request_resize(&mut self, width: i32, height: i32) -> bool {
        let changed = self.parms.set_resolution(width, height);
        if changed {
            debug!("Resize to {}x{} queued", self.parms.width, self.parms.height);
            self.tasks.submit(FrameTask::RebuildResources);
        }
        changed
    }

    /// Apply the preset at `path`. Returns `false` when the file is missing.
    pub fn load_preset(&mut self, path: &Path) -> crate::Result<bool> {
        match mandelview_core::load_preset(path)? {
            Some(parms) => {
                info!("Loaded preset {}", path.display());
                self.reset(parms);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn save_preset(&self, path: &Path) -> crate::Result<()> {
        mandelview_core::save_preset(path, &self.parms)?;
        info!("Saved preset {}", path.display());
        Ok(())
    }

    /// Replace the whole parameter block and queue a rebuild.
    pub fn reset(&mut self, parms: Parms) {
        self.parms = parms;
        self.tasks.submit(FrameTask::RebuildResources);
    }

    /// Queue a recording toggle for the start of the next frame.
    pub fn toggle_recording(&mut self) {
        self.tasks.submit(FrameTask::ToggleRecording);
    }

    pub fn set_record_dir(&mut self, dir: impl Into<PathBuf>) {
        self.recorder.set_directory(dir);
    }

    pub fn set_max_iterations(&mut self, max_iterations: i32) {
        self.parms.max_iterations = max_iterations.max(1);
    }

    /// Set palette stop `index`. Out-of-range indices are ignored.
    pub fn set_color(&mut self, index: usize, color: Color) -> bool {
        if index >= PALETTE_SIZE {
            return false;
        }
        self.parms.colors[index] = color;
        true
    }

    // -- Accessors ----------------------------------------------------------

    /// Read the output image back from the device.
    pub fn output_image(&mut self) -> crate::Result<RgbaImage> {
        let res = self.resources.resources().ok_or(RenderError::MissingResources)?;
        self.device.read_image(&res.image)
    }

    pub fn parms(&self) -> &Parms {
        &self.parms
    }

    pub fn controller(&self) -> &ViewController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ViewController {
        &mut self.controller
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    pub fn recorder(&self) -> &FrameRecorder {
        &self.recorder
    }

    /// Extent of the live compute resources, if any.
    pub fn resource_extent(&self) -> Option<(u32, u32)> {
        self.resources.extent()
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Frames completed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn backend_name(&self) -> &'static str {
        self.device.backend_name()
    }

    pub fn device(&self) -> &D {
        &self.device
    }
}

impl<D: ComputeDevice> Drop for FrameDriver<D> {
    fn drop(&mut self) {
        self.resources.release(&mut self.device);
    }
}
