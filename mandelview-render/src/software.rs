//! A CPU implementation of [`ComputeDevice`].
//!
//! Commands are recorded while the stream is open and executed in order on
//! [`submit`](ComputeDevice::submit). A dispatch runs the kernel for every
//! in-bounds invocation of every workgroup, one image row per rayon task.

use std::cell::RefCell;
use std::rc::Rc;

use rayon::prelude::*;
use tracing::{debug, trace};

use mandelview_core::{Parms, WORKGROUP_SIZE};

use crate::buffer::RgbaImage;
use crate::device::{BindingLayout, BufferDesc, ComputeDevice, ImageDesc, ImageFormat};
use crate::error::RenderError;
use crate::kernel::SoftwareKernel;

/// Largest image edge the software device accepts.
pub const DEFAULT_MAX_IMAGE_DIMENSION: u32 = 16384;

type Shared = Rc<RefCell<Vec<u8>>>;

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Counters describing what the device has done so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceStats {
    pub images_created: usize,
    pub buffers_created: usize,
    pub binding_sets_created: usize,
    pub pipelines_created: usize,
    /// Resources currently alive (not yet dropped).
    pub live_resources: usize,
    /// Highest value `live_resources` ever reached.
    pub peak_live_resources: usize,
    pub dispatches: usize,
    pub submissions: usize,
}

/// Keeps `live_resources` in step with the handles that are alive.
struct LiveToken(Rc<RefCell<DeviceStats>>);

impl LiveToken {
    fn new(stats: &Rc<RefCell<DeviceStats>>) -> Self {
        {
            let mut s = stats.borrow_mut();
            s.live_resources += 1;
            s.peak_live_resources = s.peak_live_resources.max(s.live_resources);
        }
        Self(Rc::clone(stats))
    }
}

impl Drop for LiveToken {
    fn drop(&mut self) {
        let mut s = self.0.borrow_mut();
        s.live_resources = s.live_resources.saturating_sub(1);
    }
}

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

pub struct SoftwareImage {
    width: u32,
    height: u32,
    storage: bool,
    pixels: Shared,
    _live: LiveToken,
}

pub struct SoftwareBuffer {
    size: usize,
    data: Shared,
    _live: LiveToken,
}

pub struct SoftwareBindingSet {
    params: Shared,
    target: Shared,
    width: u32,
    height: u32,
    _live: LiveToken,
}

pub struct SoftwarePipeline {
    kernel: SoftwareKernel,
    _live: LiveToken,
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

enum Command {
    WriteBuffer {
        data: Shared,
        bytes: Vec<u8>,
    },
    Dispatch {
        kernel: SoftwareKernel,
        params: Shared,
        target: Shared,
        width: u32,
        height: u32,
        groups_x: u32,
        groups_y: u32,
    },
}

// ---------------------------------------------------------------------------
// Device
// ---------------------------------------------------------------------------

/// Compute device that runs kernels on the CPU.
pub struct SoftwareDevice {
    stats: Rc<RefCell<DeviceStats>>,
    commands: Option<Vec<Command>>,
    max_image_dimension: u32,
}

impl Default for SoftwareDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareDevice {
    pub fn new() -> Self {
        Self::with_max_image_dimension(DEFAULT_MAX_IMAGE_DIMENSION)
    }

    /// A device that refuses images with an edge longer than `max`.
    pub fn with_max_image_dimension(max: u32) -> Self {
        Self {
            stats: Rc::new(RefCell::new(DeviceStats::default())),
            commands: None,
            max_image_dimension: max,
        }
    }

    pub fn stats(&self) -> DeviceStats {
        self.stats.borrow().clone()
    }

    fn record(&mut self, command: Command) -> crate::Result<()> {
        match self.commands.as_mut() {
            Some(list) => {
                list.push(command);
                Ok(())
            }
            None => Err(RenderError::Device(
                "command recorded outside an open command stream".into(),
            )),
        }
    }

    fn execute(&self, command: Command) -> crate::Result<()> {
        match command {
            Command::WriteBuffer { data, bytes } => {
                let mut data = data.borrow_mut();
                data[..bytes.len()].copy_from_slice(&bytes);
            }
            Command::Dispatch {
                kernel,
                params,
                target,
                width,
                height,
                groups_x,
                groups_y,
            } => {
                let parms = Parms::read_from(&params.borrow()).ok_or_else(|| {
                    RenderError::Device("parameter buffer is smaller than the parameter block".into())
                })?;
                let mut pixels = target.borrow_mut();
                run_dispatch(kernel, &parms, &mut pixels, width, height, groups_x, groups_y);
                self.stats.borrow_mut().dispatches += 1;
            }
        }
        Ok(())
    }
}

/// Run `kernel` over `groups_x × groups_y` workgroups, skipping invocations
/// that fall outside the image.
fn run_dispatch(
    kernel: SoftwareKernel,
    parms: &Parms,
    pixels: &mut [u8],
    width: u32,
    height: u32,
    groups_x: u32,
    groups_y: u32,
) {
    let cols = groups_x.saturating_mul(WORKGROUP_SIZE).min(width);
    let rows = groups_y.saturating_mul(WORKGROUP_SIZE).min(height) as usize;
    pixels
        .par_chunks_exact_mut(width as usize * 4)
        .take(rows)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..cols {
                let i = x as usize * 4;
                row[i..i + 4].copy_from_slice(&(kernel.entry)(parms, x, y as u32));
            }
        });
}

impl ComputeDevice for SoftwareDevice {
    type Kernel = SoftwareKernel;
    type Image = SoftwareImage;
    type Buffer = SoftwareBuffer;
    type BindingSet = SoftwareBindingSet;
    type Pipeline = SoftwarePipeline;

    fn backend_name(&self) -> &'static str {
        "Software (rayon)"
    }

    fn create_image(&mut self, desc: &ImageDesc) -> crate::Result<SoftwareImage> {
        if desc.width == 0 || desc.height == 0 {
            return Err(RenderError::creation(
                desc.label,
                format!("zero-sized image {}×{}", desc.width, desc.height),
            ));
        }
        if desc.width > self.max_image_dimension || desc.height > self.max_image_dimension {
            return Err(RenderError::creation(
                desc.label,
                format!(
                    "{}×{} exceeds the device limit of {}",
                    desc.width, desc.height, self.max_image_dimension
                ),
            ));
        }
        match desc.format {
            ImageFormat::Rgba8Unorm => {}
        }
        let len = desc.width as usize * desc.height as usize * 4;
        self.stats.borrow_mut().images_created += 1;
        trace!("Created image {:?} {}x{}", desc.label, desc.width, desc.height);
        Ok(SoftwareImage {
            width: desc.width,
            height: desc.height,
            storage: desc.storage,
            pixels: Rc::new(RefCell::new(vec![0u8; len])),
            _live: LiveToken::new(&self.stats),
        })
    }

    fn create_buffer(&mut self, desc: &BufferDesc) -> crate::Result<SoftwareBuffer> {
        if desc.size == 0 {
            return Err(RenderError::creation(desc.label, "zero-sized buffer"));
        }
        self.stats.borrow_mut().buffers_created += 1;
        Ok(SoftwareBuffer {
            size: desc.size,
            data: Rc::new(RefCell::new(vec![0u8; desc.size])),
            _live: LiveToken::new(&self.stats),
        })
    }

    fn create_binding_set(
        &mut self,
        layout: BindingLayout,
        buffer: &SoftwareBuffer,
        image: &SoftwareImage,
    ) -> crate::Result<SoftwareBindingSet> {
        if layout != BindingLayout::KERNEL {
            return Err(RenderError::creation(
                "binding set",
                format!("kernel expects {:?}, got {layout:?}", BindingLayout::KERNEL),
            ));
        }
        if buffer.size < std::mem::size_of::<Parms>() {
            return Err(RenderError::creation(
                "binding set",
                format!(
                    "constant buffer holds {} bytes, kernel reads {}",
                    buffer.size,
                    std::mem::size_of::<Parms>()
                ),
            ));
        }
        if !image.storage {
            return Err(RenderError::creation(
                "binding set",
                "output image is not a storage image",
            ));
        }
        self.stats.borrow_mut().binding_sets_created += 1;
        Ok(SoftwareBindingSet {
            params: Rc::clone(&buffer.data),
            target: Rc::clone(&image.pixels),
            width: image.width,
            height: image.height,
            _live: LiveToken::new(&self.stats),
        })
    }

    fn create_pipeline(
        &mut self,
        kernel: &SoftwareKernel,
        _bindings: &SoftwareBindingSet,
    ) -> crate::Result<SoftwarePipeline> {
        self.stats.borrow_mut().pipelines_created += 1;
        debug!("Created compute pipeline for kernel {}", kernel.name);
        Ok(SoftwarePipeline {
            kernel: *kernel,
            _live: LiveToken::new(&self.stats),
        })
    }

    fn open_commands(&mut self) -> crate::Result<()> {
        if self.commands.is_some() {
            return Err(RenderError::Device("command stream is already open".into()));
        }
        self.commands = Some(Vec::new());
        Ok(())
    }

    fn write_buffer(&mut self, buffer: &SoftwareBuffer, data: &[u8]) -> crate::Result<()> {
        if data.len() > buffer.size {
            return Err(RenderError::Device(format!(
                "write of {} bytes into a {}-byte buffer",
                data.len(),
                buffer.size
            )));
        }
        self.record(Command::WriteBuffer {
            data: Rc::clone(&buffer.data),
            bytes: data.to_vec(),
        })
    }

    fn dispatch(
        &mut self,
        pipeline: &SoftwarePipeline,
        bindings: &SoftwareBindingSet,
        groups_x: u32,
        groups_y: u32,
    ) -> crate::Result<()> {
        self.record(Command::Dispatch {
            kernel: pipeline.kernel,
            params: Rc::clone(&bindings.params),
            target: Rc::clone(&bindings.target),
            width: bindings.width,
            height: bindings.height,
            groups_x,
            groups_y,
        })
    }

    fn submit(&mut self) -> crate::Result<()> {
        let commands = self
            .commands
            .take()
            .ok_or_else(|| RenderError::Device("no open command stream to submit".into()))?;
        trace!("Executing {} commands", commands.len());
        for command in commands {
            self.execute(command)?;
        }
        self.stats.borrow_mut().submissions += 1;
        Ok(())
    }

    fn wait_idle(&mut self) {
        // Submission executes synchronously; nothing is ever in flight.
    }

    fn read_image(&mut self, image: &SoftwareImage) -> crate::Result<RgbaImage> {
        Ok(RgbaImage {
            width: image.width,
            height: image.height,
            pixels: image.pixels.borrow().clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_desc(width: u32, height: u32) -> ImageDesc {
        ImageDesc {
            width,
            height,
            format: ImageFormat::Rgba8Unorm,
            storage: true,
            label: "test image",
        }
    }

    fn params_desc() -> BufferDesc {
        BufferDesc {
            size: std::mem::size_of::<Parms>(),
            label: "Parms",
        }
    }

    fn white(_: &Parms, _: u32, _: u32) -> [u8; 4] {
        [255, 255, 255, 255]
    }

    fn encode_position(_: &Parms, x: u32, y: u32) -> [u8; 4] {
        [x as u8, y as u8, 0, 255]
    }

    fn max_iterations_as_red(p: &Parms, _: u32, _: u32) -> [u8; 4] {
        [p.max_iterations as u8, 0, 0, 255]
    }

    #[test]
    fn dispatch_writes_every_pixel_in_bounds() {
        let mut dev = SoftwareDevice::new();
        let image = dev.create_image(&image_desc(20, 10)).unwrap();
        let buffer = dev.create_buffer(&params_desc()).unwrap();
        let set = dev.create_binding_set(BindingLayout::KERNEL, &buffer, &image).unwrap();
        let kernel = SoftwareKernel::new("encode", encode_position);
        let pipeline = dev.create_pipeline(&kernel, &set).unwrap();

        dev.open_commands().unwrap();
        dev.write_buffer(&buffer, Parms::default().as_bytes()).unwrap();
        // ceil(20/8) × ceil(10/8): the last groups overhang the image.
        dev.dispatch(&pipeline, &set, 3, 2).unwrap();
        dev.submit().unwrap();
        dev.wait_idle();

        let out = dev.read_image(&image).unwrap();
        assert_eq!(out.pixel(0, 0), Some([0, 0, 0, 255]));
        assert_eq!(out.pixel(19, 9), Some([19, 9, 0, 255]));
        assert_eq!(dev.stats().dispatches, 1);
        assert_eq!(dev.stats().submissions, 1);
    }

    #[test]
    fn partial_dispatch_leaves_rest_untouched() {
        let mut dev = SoftwareDevice::new();
        let image = dev.create_image(&image_desc(16, 16)).unwrap();
        let buffer = dev.create_buffer(&params_desc()).unwrap();
        let set = dev.create_binding_set(BindingLayout::KERNEL, &buffer, &image).unwrap();
        let pipeline = dev
            .create_pipeline(&SoftwareKernel::new("white", white), &set)
            .unwrap();

        dev.open_commands().unwrap();
        dev.write_buffer(&buffer, Parms::default().as_bytes()).unwrap();
        dev.dispatch(&pipeline, &set, 1, 1).unwrap();
        dev.submit().unwrap();

        let out = dev.read_image(&image).unwrap();
        assert_eq!(out.pixel(7, 7), Some([255; 4]));
        assert_eq!(out.pixel(8, 0), Some([0; 4]));
        assert_eq!(out.pixel(0, 8), Some([0; 4]));
    }

    #[test]
    fn commands_execute_in_recorded_order() {
        let mut dev = SoftwareDevice::new();
        let image = dev.create_image(&image_desc(8, 8)).unwrap();
        let buffer = dev.create_buffer(&params_desc()).unwrap();
        let set = dev.create_binding_set(BindingLayout::KERNEL, &buffer, &image).unwrap();
        let pipeline = dev
            .create_pipeline(&SoftwareKernel::new("iters", max_iterations_as_red), &set)
            .unwrap();

        let mut first = Parms::default();
        first.max_iterations = 10;
        let mut second = first;
        second.max_iterations = 20;

        dev.open_commands().unwrap();
        dev.write_buffer(&buffer, first.as_bytes()).unwrap();
        dev.write_buffer(&buffer, second.as_bytes()).unwrap();
        dev.dispatch(&pipeline, &set, 1, 1).unwrap();
        // Nothing runs before submission.
        assert_eq!(dev.read_image(&image).unwrap().pixel(0, 0), Some([0; 4]));
        dev.submit().unwrap();

        assert_eq!(dev.read_image(&image).unwrap().pixel(0, 0), Some([20, 0, 0, 255]));
    }

    #[test]
    fn recording_requires_open_stream() {
        let mut dev = SoftwareDevice::new();
        let buffer = dev.create_buffer(&params_desc()).unwrap();
        assert!(matches!(
            dev.write_buffer(&buffer, &[0; 4]),
            Err(RenderError::Device(_))
        ));
        assert!(dev.submit().is_err());

        dev.open_commands().unwrap();
        assert!(dev.open_commands().is_err());
        assert!(dev.write_buffer(&buffer, &[0; 1024]).is_err());
    }

    #[test]
    fn creation_failures_are_reported() {
        let mut dev = SoftwareDevice::with_max_image_dimension(64);
        assert!(matches!(
            dev.create_image(&image_desc(65, 8)),
            Err(RenderError::ResourceCreation { .. })
        ));
        assert!(dev.create_image(&image_desc(0, 8)).is_err());

        let image = dev.create_image(&image_desc(8, 8)).unwrap();
        let small = dev
            .create_buffer(&BufferDesc {
                size: 16,
                label: "too small",
            })
            .unwrap();
        assert!(dev
            .create_binding_set(BindingLayout::KERNEL, &small, &image)
            .is_err());

        let buffer = dev.create_buffer(&params_desc()).unwrap();
        let wrong_slot = BindingLayout {
            constant_buffer_slot: 1,
            storage_image_slot: 0,
        };
        assert!(dev.create_binding_set(wrong_slot, &buffer, &image).is_err());

        let mut desc = image_desc(8, 8);
        desc.storage = false;
        let sampled = dev.create_image(&desc).unwrap();
        assert!(dev
            .create_binding_set(BindingLayout::KERNEL, &buffer, &sampled)
            .is_err());
    }

    #[test]
    fn live_resources_follow_handles() {
        let mut dev = SoftwareDevice::new();
        let image = dev.create_image(&image_desc(8, 8)).unwrap();
        let buffer = dev.create_buffer(&params_desc()).unwrap();
        assert_eq!(dev.stats().live_resources, 2);
        drop(image);
        assert_eq!(dev.stats().live_resources, 1);
        drop(buffer);
        let stats = dev.stats();
        assert_eq!(stats.live_resources, 0);
        assert_eq!(stats.peak_live_resources, 2);
    }
}
