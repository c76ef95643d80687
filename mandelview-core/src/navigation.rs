//! Pan/zoom navigation over a [`Parms`] view.
//!
//! All positions handled here are in image space: pixels of the output
//! image, origin at the top-left corner.

use tracing::trace;

use crate::dvec2::DVec2;
use crate::parms::Parms;

/// Zoom step per frame while the zoom-in modifier is held.
pub const DEFAULT_ZOOM_IN_FACTOR: f64 = 1.003;
/// Zoom step per frame while the zoom-out modifier is held.
pub const DEFAULT_ZOOM_OUT_FACTOR: f64 = 0.997;
/// How much one scroll unit adjusts a held zoom factor.
pub const FACTOR_SCROLL_RATE: f64 = 0.001;
/// Zoom factor of a single scroll-up step over the view.
pub const SCROLL_ZOOM_IN: f64 = 1.1;
/// Zoom factor of a single scroll-down step over the view.
pub const SCROLL_ZOOM_OUT: f64 = 0.9;
/// Arrow-key pan step in pixels per frame.
pub const PAN_STEP: f64 = 1.0;
/// Arrow-key pan step with the fast-pan modifier held.
pub const FAST_PAN_STEP: f64 = 5.0;

/// Arrow keys currently held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanKeys {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl PanKeys {
    pub fn any(&self) -> bool {
        self.left || self.right || self.up || self.down
    }
}

/// One frame's worth of navigation input.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewInput {
    /// Pointer position mapped into image space.
    pub pointer: DVec2,
    /// Whether the pointer is over the view.
    pub hovered: bool,
    /// Scroll delta in wheel steps; positive scrolls up.
    pub scroll: f64,
    /// Zoom-in modifier held.
    pub zoom_in_held: bool,
    /// Zoom-out modifier held.
    pub zoom_out_held: bool,
    /// Pointer movement this frame while the middle button drags, in image space.
    pub drag_delta: Option<DVec2>,
    pub pan_keys: PanKeys,
    /// Fast-pan modifier held.
    pub fast_pan: bool,
}

/// Map a window-space pointer into the output image's pixel grid.
///
/// `view_origin` and `display_size` describe where the image is drawn in
/// window space; the image itself is `width × height` pixels.
pub fn window_to_image(
    pointer: DVec2,
    view_origin: DVec2,
    display_size: DVec2,
    width: i32,
    height: i32,
) -> DVec2 {
    let image_size = DVec2::new(width as f64, height as f64);
    if display_size.x <= 0.0 || display_size.y <= 0.0 {
        return image_size * 0.5;
    }
    (pointer - view_origin) / display_size * image_size
}

/// Scale a window-space delta into image space.
pub fn window_delta_to_image(delta: DVec2, display_size: DVec2, width: i32, height: i32) -> DVec2 {
    if display_size.x <= 0.0 || display_size.y <= 0.0 {
        return delta;
    }
    delta / display_size * DVec2::new(width as f64, height as f64)
}

/// Zoom by `factor` while keeping the plane point under `pointer` fixed.
///
/// `offset' = offset·zf + (pointer − half)·(zf − 1)` and `zoom' = zoom·zf`.
pub fn zoom_at(parms: &mut Parms, pointer: DVec2, factor: f64) {
    let from_center = pointer - parms.half_size();
    parms.offset = parms.offset * factor + from_center * (factor - 1.0);
    parms.zoom *= factor;
}

/// Per-frame navigation state: the adjustable held-modifier zoom factors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewController {
    pub zoom_in_factor: f64,
    pub zoom_out_factor: f64,
}

impl Default for ViewController {
    fn default() -> Self {
        Self::new(DEFAULT_ZOOM_IN_FACTOR, DEFAULT_ZOOM_OUT_FACTOR)
    }
}

impl ViewController {
    pub fn new(zoom_in_factor: f64, zoom_out_factor: f64) -> Self {
        Self {
            zoom_in_factor,
            zoom_out_factor,
        }
    }

    /// Pick the zoom factor for this frame, if any.
    ///
    /// A held modifier wins over plain scrolling and also absorbs the scroll
    /// delta into its own factor, so the wheel tunes the continuous zoom speed.
    fn zoom_factor(&mut self, input: &ViewInput) -> Option<f64> {
        if input.zoom_in_held {
            self.zoom_in_factor += input.scroll * FACTOR_SCROLL_RATE;
            Some(self.zoom_in_factor)
        } else if input.zoom_out_held {
            self.zoom_out_factor += input.scroll * FACTOR_SCROLL_RATE;
            Some(self.zoom_out_factor)
        } else if input.hovered && input.scroll != 0.0 {
            Some(if input.scroll > 0.0 {
                SCROLL_ZOOM_IN
            } else {
                SCROLL_ZOOM_OUT
            })
        } else {
            None
        }
    }

    /// Apply one frame of input to the view. Returns `true` if the view moved.
    pub fn apply(&mut self, parms: &mut Parms, input: &ViewInput) -> bool {
        let before = (parms.offset, parms.zoom);

        if let Some(zf) = self.zoom_factor(input) {
            zoom_at(parms, input.pointer, zf);
        }

        if input.hovered {
            if let Some(delta) = input.drag_delta {
                parms.offset -= delta;
            }
        }

        if input.pan_keys.any() {
            let speed = if input.fast_pan { FAST_PAN_STEP } else { PAN_STEP };
            let keys = input.pan_keys;
            let mut step = DVec2::ZERO;
            if keys.left {
                step.x += speed;
            }
            if keys.right {
                step.x -= speed;
            }
            if keys.up {
                step.y += speed;
            }
            if keys.down {
                step.y -= speed;
            }
            parms.offset -= step;
        }

        let moved = before != (parms.offset, parms.zoom);
        if moved {
            trace!(offset = %parms.offset, zoom = parms.zoom, "view updated");
        }
        moved
    }
}
