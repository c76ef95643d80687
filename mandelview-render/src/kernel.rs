//! Reference compute kernels for [`SoftwareDevice`](crate::SoftwareDevice).

use mandelview_core::{escape_time, Color, DVec2, Parms, PALETTE_SIZE};

/// Kernel entry point: shade the invocation at image pixel `(x, y)`.
pub type KernelFn = fn(&Parms, u32, u32) -> [u8; 4];

/// A "compiled" kernel for the software device.
#[derive(Clone, Copy)]
pub struct SoftwareKernel {
    pub name: &'static str,
    pub entry: KernelFn,
}

impl SoftwareKernel {
    pub fn new(name: &'static str, entry: KernelFn) -> Self {
        Self { name, entry }
    }

    /// The escape-time Mandelbrot kernel.
    pub fn mandelbrot() -> Self {
        Self::new("Mandelbrot_Main", mandelbrot_main)
    }
}

impl std::fmt::Debug for SoftwareKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftwareKernel")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

const INTERIOR: [u8; 4] = [0, 0, 0, 255];

fn mandelbrot_main(parms: &Parms, x: u32, y: u32) -> [u8; 4] {
    let c = parms.pixel_to_plane(DVec2::new(x as f64 + 0.5, y as f64 + 0.5));
    let max_iterations = parms.max_iterations.max(0) as u32;
    match escape_time(c, max_iterations).smooth_iterations() {
        None => INTERIOR,
        Some(nu) => {
            let t = (nu / max_iterations.max(1) as f64).clamp(0.0, 1.0);
            to_rgba8(sample_palette(&parms.colors, t))
        }
    }
}

/// Linearly interpolate across the palette, `t` in `0.0..=1.0`.
pub fn sample_palette(colors: &[Color; PALETTE_SIZE], t: f64) -> Color {
    let pos = t.clamp(0.0, 1.0) * (PALETTE_SIZE - 1) as f64;
    let i = (pos.floor() as usize).min(PALETTE_SIZE - 2);
    let frac = (pos - i as f64) as f32;
    let (a, b) = (colors[i], colors[i + 1]);
    std::array::from_fn(|k| a[k] + (b[k] - a[k]) * frac)
}

#[inline]
fn to_rgba8(c: Color) -> [u8; 4] {
    c.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
}
