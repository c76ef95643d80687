pub mod buffer;
pub mod device;
pub mod driver;
pub mod error;
pub mod kernel;
pub mod recorder;
pub mod resources;
pub mod software;
pub mod tasks;

pub use buffer::RgbaImage;
pub use device::{BindingLayout, BufferDesc, ComputeDevice, ImageDesc, ImageFormat};
pub use driver::{FrameDriver, FramePhase};
pub use error::RenderError;
pub use kernel::{sample_palette, KernelFn, SoftwareKernel};
pub use recorder::{write_png, FrameRecorder};
pub use resources::{GpuResources, ResourceManager};
pub use software::{DeviceStats, SoftwareDevice};
pub use tasks::{FrameTask, MainThreadQueue};

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;
