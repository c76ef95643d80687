//! Lifetime of the size-dependent compute resources.

use tracing::{debug, info, warn};

use mandelview_core::Parms;

use crate::device::{BindingLayout, BufferDesc, ComputeDevice, ImageDesc, ImageFormat};

/// Everything a dispatch needs, sized for one output resolution.
pub struct GpuResources<D: ComputeDevice> {
    pub image: D::Image,
    pub buffer: D::Buffer,
    pub bindings: D::BindingSet,
    pub pipeline: D::Pipeline,
    pub width: u32,
    pub height: u32,
}

/// Owns the current [`GpuResources`] and replaces them when the output
/// resolution changes.
///
/// At most one set is alive at a time: the old set is released before the
/// new one is created.
pub struct ResourceManager<D: ComputeDevice> {
    kernel: D::Kernel,
    current: Option<GpuResources<D>>,
}

impl<D: ComputeDevice> ResourceManager<D> {
    pub fn new(kernel: D::Kernel) -> Self {
        Self {
            kernel,
            current: None,
        }
    }

    pub fn resources(&self) -> Option<&GpuResources<D>> {
        self.current.as_ref()
    }

    /// Extent of the live resources, if any.
    pub fn extent(&self) -> Option<(u32, u32)> {
        self.current.as_ref().map(|r| (r.width, r.height))
    }

    /// Whether live resources exist and match `width × height`.
    pub fn matches(&self, width: u32, height: u32) -> bool {
        self.extent() == Some((width, height))
    }

    /// Release the current resources and create a fresh set for
    /// `width × height`. On failure the manager is left empty.
    pub fn rebuild(&mut self, device: &mut D, width: u32, height: u32) -> crate::Result<()> {
        device.wait_idle();
        if let Some(old) = self.current.take() {
            debug!("Releasing {}x{} compute resources", old.width, old.height);
            drop(old);
        }

        match Self::create(device, &self.kernel, width, height) {
            Ok(resources) => {
                info!("Compute resources ready at {}x{}", width, height);
                self.current = Some(resources);
                Ok(())
            }
            Err(e) => {
                warn!("Resource rebuild at {}x{} failed: {}", width, height, e);
                Err(e)
            }
        }
    }

    /// Drop the current resources without replacing them.
    pub fn release(&mut self, device: &mut D) {
        device.wait_idle();
        self.current = None;
    }

    fn create(
        device: &mut D,
        kernel: &D::Kernel,
        width: u32,
        height: u32,
    ) -> crate::Result<GpuResources<D>> {
        let image = device.create_image(&ImageDesc {
            width,
            height,
            format: ImageFormat::Rgba8Unorm,
            storage: true,
            label: "output image",
        })?;
        let buffer = device.create_buffer(&BufferDesc {
            size: std::mem::size_of::<Parms>(),
            label: "parameter buffer",
        })?;
        let bindings = device.create_binding_set(BindingLayout::KERNEL, &buffer, &image)?;
        let pipeline = device.create_pipeline(kernel, &bindings)?;
        Ok(GpuResources {
            image,
            buffer,
            bindings,
            pipeline,
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::SoftwareKernel;
    use crate::software::SoftwareDevice;

    #[test]
    fn rebuild_replaces_previous_set() {
        let mut dev = SoftwareDevice::new();
        let mut mgr = ResourceManager::<SoftwareDevice>::new(SoftwareKernel::mandelbrot());
        assert_eq!(mgr.extent(), None);

        mgr.rebuild(&mut dev, 32, 16).unwrap();
        assert!(mgr.matches(32, 16));
        mgr.rebuild(&mut dev, 64, 48).unwrap();
        assert!(mgr.matches(64, 48));

        let stats = dev.stats();
        assert_eq!(stats.images_created, 2);
        assert_eq!(stats.live_resources, 4);
        assert_eq!(stats.peak_live_resources, 4);
    }

    #[test]
    fn failed_rebuild_leaves_manager_empty() {
        let mut dev = SoftwareDevice::with_max_image_dimension(100);
        let mut mgr = ResourceManager::<SoftwareDevice>::new(SoftwareKernel::mandelbrot());
        mgr.rebuild(&mut dev, 64, 64).unwrap();

        assert!(mgr.rebuild(&mut dev, 200, 64).is_err());
        assert!(mgr.resources().is_none());
        assert_eq!(dev.stats().live_resources, 0);

        mgr.rebuild(&mut dev, 80, 80).unwrap();
        assert!(mgr.matches(80, 80));
    }

    #[test]
    fn release_drops_everything() {
        let mut dev = SoftwareDevice::new();
        let mut mgr = ResourceManager::<SoftwareDevice>::new(SoftwareKernel::mandelbrot());
        mgr.rebuild(&mut dev, 8, 8).unwrap();
        mgr.release(&mut dev);
        assert_eq!(mgr.extent(), None);
        assert_eq!(dev.stats().live_resources, 0);
    }
}
