use bytemuck::{Pod, Zeroable};

use crate::dvec2::DVec2;

/// Number of palette entries in the parameter block.
pub const PALETTE_SIZE: usize = 10;

/// Smallest width or height the output image may have.
pub const MIN_DIMENSION: i32 = 8;

/// Edge length of a compute workgroup, in pixels.
pub const WORKGROUP_SIZE: u32 = 8;

/// Complex-plane point shown at the image centre when `offset` is zero.
pub const VIEW_CENTER: DVec2 = DVec2::new(-0.5, 0.0);

/// Complex-plane units spanned by the image height at `zoom == 1`.
pub const VIEW_SPAN: f64 = 3.0;

/// An RGBA colour with `f32` components in `0.0..=1.0`.
pub type Color = [f32; 4];

/// The parameter block consumed by the compute kernel.
///
/// The field order and the two padding members reproduce the kernel's
/// constant-buffer layout exactly: 208 bytes, 8-byte aligned. The whole
/// struct is uploaded verbatim every frame, so nothing may be reordered.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Parms {
    /// View offset in image pixels at the current zoom.
    pub offset: DVec2,
    /// Magnification; larger values zoom in.
    pub zoom: f64,
    _padding0: f64,
    pub colors: [Color; PALETTE_SIZE],
    pub width: i32,
    pub height: i32,
    pub max_iterations: i32,
    _padding1: i32,
}

/// Classic blue-to-gold gradient.
pub const DEFAULT_PALETTE: [Color; PALETTE_SIZE] = [
    [0.000, 0.027, 0.392, 1.0],
    [0.063, 0.165, 0.560, 1.0],
    [0.125, 0.420, 0.796, 1.0],
    [0.490, 0.706, 0.906, 1.0],
    [0.929, 1.000, 1.000, 1.0],
    [1.000, 0.878, 0.541, 1.0],
    [1.000, 0.667, 0.000, 1.0],
    [0.706, 0.357, 0.020, 1.0],
    [0.392, 0.157, 0.039, 1.0],
    [0.000, 0.008, 0.000, 1.0],
];

impl Default for Parms {
    fn default() -> Self {
        Self::new(DVec2::ZERO, 1.0, DEFAULT_PALETTE, 1920, 1080, 100)
    }
}

impl Parms {
    /// Build a parameter block. Dimensions are clamped to [`MIN_DIMENSION`].
    pub fn new(
        offset: DVec2,
        zoom: f64,
        colors: [Color; PALETTE_SIZE],
        width: i32,
        height: i32,
        max_iterations: i32,
    ) -> Self {
        Self {
            offset,
            zoom,
            _padding0: 0.0,
            colors,
            width: width.max(MIN_DIMENSION),
            height: height.max(MIN_DIMENSION),
            max_iterations,
            _padding1: 0,
        }
    }

    /// Set the output resolution, clamping each side to [`MIN_DIMENSION`].
    ///
    /// Returns `true` when the stored resolution actually changed, i.e. when
    /// the caller must rebuild size-dependent resources.
    pub fn set_resolution(&mut self, width: i32, height: i32) -> bool {
        let width = width.max(MIN_DIMENSION);
        let height = height.max(MIN_DIMENSION);
        let changed = width != self.width || height != self.height;
        self.width = width;
        self.height = height;
        changed
    }

    /// Resolution as unsigned pixel counts.
    pub fn extent(&self) -> (u32, u32) {
        (
            self.width.max(MIN_DIMENSION) as u32,
            self.height.max(MIN_DIMENSION) as u32,
        )
    }

    /// Half the image size in pixels.
    #[inline]
    pub fn half_size(&self) -> DVec2 {
        DVec2::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }

    /// Workgroup counts covering the whole image (rounded up).
    pub fn workgroups(&self) -> (u32, u32) {
        let (w, h) = self.extent();
        (w.div_ceil(WORKGROUP_SIZE), h.div_ceil(WORKGROUP_SIZE))
    }

    /// Complex-plane units covered by one image pixel.
    #[inline]
    pub fn plane_units_per_pixel(&self) -> f64 {
        VIEW_SPAN / (self.zoom * self.height as f64)
    }

    /// Map an image-space pixel position to the complex plane.
    ///
    /// Image y grows downward while the imaginary axis grows upward.
    #[inline]
    pub fn pixel_to_plane(&self, pixel: DVec2) -> DVec2 {
        let units = self.plane_units_per_pixel();
        let local = (pixel - self.half_size() + self.offset) * units;
        DVec2::new(VIEW_CENTER.x + local.x, VIEW_CENTER.y - local.y)
    }

    /// Raw bytes of the block, ready to be written into the parameter buffer.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Decode a block from (possibly unaligned) buffer contents.
    ///
    /// Returns `None` when `bytes` is shorter than the block.
    pub fn read_from(bytes: &[u8]) -> Option<Self> {
        let size = std::mem::size_of::<Self>();
        bytes
            .get(..size)
            .map(bytemuck::pod_read_unaligned::<Self>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{align_of, offset_of, size_of};

    const EPSILON: f64 = 1e-12;

    #[test]
    fn layout_matches_kernel_block() {
        assert_eq!(size_of::<Parms>(), 208);
        assert_eq!(align_of::<Parms>(), 8);
        assert_eq!(offset_of!(Parms, offset), 0);
        assert_eq!(offset_of!(Parms, zoom), 16);
        assert_eq!(offset_of!(Parms, colors), 32);
        assert_eq!(offset_of!(Parms, width), 192);
        assert_eq!(offset_of!(Parms, height), 196);
        assert_eq!(offset_of!(Parms, max_iterations), 200);
    }

    #[test]
    fn defaults() {
        let p = Parms::default();
        assert_eq!(p.offset, DVec2::ZERO);
        assert_eq!(p.zoom, 1.0);
        assert_eq!((p.width, p.height), (1920, 1080));
        assert_eq!(p.max_iterations, 100);
        assert_eq!(p.colors, DEFAULT_PALETTE);
    }

    #[test]
    fn resolution_is_clamped_to_minimum() {
        let mut p = Parms::default();
        assert!(p.set_resolution(3, -20));
        assert_eq!((p.width, p.height), (MIN_DIMENSION, MIN_DIMENSION));

        // Clamping to the same value is not a change.
        assert!(!p.set_resolution(0, 7));

        let q = Parms::new(DVec2::ZERO, 1.0, DEFAULT_PALETTE, 2, 4, 10);
        assert_eq!((q.width, q.height), (8, 8));
    }

    #[test]
    fn set_resolution_reports_change() {
        let mut p = Parms::default();
        assert!(!p.set_resolution(1920, 1080));
        assert!(p.set_resolution(800, 600));
        assert_eq!(p.extent(), (800, 600));
    }

    #[test]
    fn workgroups_round_up() {
        let mut p = Parms::default();
        p.set_resolution(64, 64);
        assert_eq!(p.workgroups(), (8, 8));
        p.set_resolution(65, 71);
        assert_eq!(p.workgroups(), (9, 9));
        p.set_resolution(8, 9);
        assert_eq!(p.workgroups(), (1, 2));
    }

    #[test]
    fn centre_pixel_maps_to_view_center() {
        let mut p = Parms::default();
        p.set_resolution(200, 100);
        let c = p.pixel_to_plane(p.half_size());
        assert!((c.x - VIEW_CENTER.x).abs() < EPSILON);
        assert!((c.y - VIEW_CENTER.y).abs() < EPSILON);
    }

    #[test]
    fn image_height_spans_view_span_at_unit_zoom() {
        let mut p = Parms::default();
        p.set_resolution(100, 100);
        let top = p.pixel_to_plane(DVec2::new(50.0, 0.0));
        let bottom = p.pixel_to_plane(DVec2::new(50.0, 100.0));
        assert!((top.y - bottom.y - VIEW_SPAN).abs() < EPSILON);
        // Image-down is imaginary-negative.
        assert!(top.y > bottom.y);
    }

    #[test]
    fn bytes_round_trip() {
        let mut p = Parms::default();
        p.offset = DVec2::new(12.5, -3.0);
        p.zoom = 42.0;
        p.max_iterations = 777;
        let bytes = p.as_bytes().to_vec();
        assert_eq!(bytes.len(), 208);
        assert_eq!(Parms::read_from(&bytes), Some(p));
        assert_eq!(Parms::read_from(&bytes[..100]), None);
    }
}
