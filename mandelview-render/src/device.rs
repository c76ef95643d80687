//! The compute device boundary.
//!
//! Everything the frame loop needs from a GPU goes through [`ComputeDevice`].
//! Handles are plain owned values: dropping one releases the resource.

use crate::buffer::RgbaImage;

/// Pixel format of the output image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Rgba8Unorm,
}

/// Description of a 2D image the kernel writes into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDesc {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    /// The image is bound as a writable storage image.
    pub storage: bool,
    pub label: &'static str,
}

/// Description of a constant buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDesc {
    pub size: usize,
    pub label: &'static str,
}

/// Slots the kernel reads its inputs from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingLayout {
    pub constant_buffer_slot: u32,
    pub storage_image_slot: u32,
}

impl BindingLayout {
    /// Parameter buffer at constant-buffer slot 0, output image at storage slot 0.
    pub const KERNEL: Self = Self {
        constant_buffer_slot: 0,
        storage_image_slot: 0,
    };
}

/// An injected compute context: resource creation plus a single command stream.
///
/// Commands recorded between [`open_commands`](Self::open_commands) and
/// [`submit`](Self::submit) execute in order; [`wait_idle`](Self::wait_idle)
/// blocks until everything submitted has finished.
pub trait ComputeDevice {
    /// A compiled compute kernel.
    type Kernel: Clone;
    type Image;
    type Buffer;
    type BindingSet;
    type Pipeline;

    /// Human-readable backend name for diagnostics.
    fn backend_name(&self) -> &'static str;

    fn create_image(&mut self, desc: &ImageDesc) -> crate::Result<Self::Image>;

    fn create_buffer(&mut self, desc: &BufferDesc) -> crate::Result<Self::Buffer>;

    fn create_binding_set(
        &mut self,
        layout: BindingLayout,
        buffer: &Self::Buffer,
        image: &Self::Image,
    ) -> crate::Result<Self::BindingSet>;

    fn create_pipeline(
        &mut self,
        kernel: &Self::Kernel,
        bindings: &Self::BindingSet,
    ) -> crate::Result<Self::Pipeline>;

    /// Start recording a command stream.
    fn open_commands(&mut self) -> crate::Result<()>;

    /// Record a write of `data` into `buffer`.
    fn write_buffer(&mut self, buffer: &Self::Buffer, data: &[u8]) -> crate::Result<()>;

    /// Record a dispatch of `groups_x × groups_y` workgroups.
    fn dispatch(
        &mut self,
        pipeline: &Self::Pipeline,
        bindings: &Self::BindingSet,
        groups_x: u32,
        groups_y: u32,
    ) -> crate::Result<()>;

    /// Close the command stream and hand it to the device.
    fn submit(&mut self) -> crate::Result<()>;

    /// Block until all submitted work is complete.
    fn wait_idle(&mut self);

    /// Copy the contents of `image` back to host memory.
    fn read_image(&mut self, image: &Self::Image) -> crate::Result<RgbaImage>;
}
