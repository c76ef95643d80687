use crate::dvec2::DVec2;

/// Bailout radius squared: an orbit with `|z|² > 4` has escaped.
pub const ESCAPE_RADIUS_SQ: f64 = 4.0;

/// The result of iterating a single point of `z_{n+1} = z_n² + c`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Escape {
    /// The orbit escaped after `iterations` steps.
    /// `norm_sq` is `|z|²` at the moment of escape.
    Escaped { iterations: u32, norm_sq: f64 },

    /// The point is (likely) inside the set: it did not escape within the
    /// iteration bound, or was detected as periodic.
    Interior,
}

impl Escape {
    /// Fractional iteration count `ν = n + 1 − log₂(ln|z|)`, or `None` for
    /// interior points.
    pub fn smooth_iterations(self) -> Option<f64> {
        match self {
            Self::Interior => None,
            Self::Escaped {
                iterations,
                norm_sq,
            } => {
                let log_zn = norm_sq.ln() / 2.0;
                let nu = (log_zn / std::f64::consts::LN_2).ln() / std::f64::consts::LN_2;
                Some((iterations as f64 + 1.0 - nu).max(0.0))
            }
        }
    }
}

/// Returns `true` if `c` lies inside the main cardioid.
#[inline]
fn in_cardioid(re: f64, im: f64) -> bool {
    let im2 = im * im;
    let q = (re - 0.25) * (re - 0.25) + im2;
    q * (q + (re - 0.25)) <= 0.25 * im2
}

/// Returns `true` if `c` lies inside the period-2 bulb.
#[inline]
fn in_period2_bulb(re: f64, im: f64) -> bool {
    (re + 1.0) * (re + 1.0) + im * im <= 0.0625
}

/// Iterate the Mandelbrot map for the plane point `c` (`x` real, `y` imaginary).
pub fn escape_time(c: DVec2, max_iterations: u32) -> Escape {
    if in_cardioid(c.x, c.y) || in_period2_bulb(c.x, c.y) {
        return Escape::Interior;
    }

    let (mut zr, mut zi) = (0.0f64, 0.0f64);

    // Brent's cycle detection state.
    let (mut old_r, mut old_i) = (zr, zi);
    let mut period: u32 = 0;
    let mut check: u32 = 3;

    for n in 0..max_iterations {
        let next_r = zr * zr - zi * zi + c.x;
        zi = 2.0 * zr * zi + c.y;
        zr = next_r;

        let norm_sq = zr * zr + zi * zi;
        if norm_sq > ESCAPE_RADIUS_SQ {
            return Escape::Escaped {
                iterations: n,
                norm_sq,
            };
        }

        // Skip the first 32 iterations and only check every 4th.
        if n >= 32 && n & 3 == 0 {
            if (zr - old_r).abs() < 1e-13 && (zi - old_i).abs() < 1e-13 {
                return Escape::Interior;
            }
            period += 1;
            if period > check {
                old_r = zr;
                old_i = zi;
                period = 0;
                check = check.saturating_mul(2);
            }
        }
    }

    Escape::Interior
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: u32 = 256;

    #[test]
    fn origin_is_interior() {
        assert_eq!(escape_time(DVec2::ZERO, MAX), Escape::Interior);
    }

    #[test]
    fn far_point_escapes_immediately() {
        match escape_time(DVec2::new(10.0, 0.0), MAX) {
            Escape::Escaped { iterations, .. } => assert_eq!(iterations, 0),
            Escape::Interior => panic!("far point should escape"),
        }
    }

    #[test]
    fn period2_bulb_is_interior() {
        assert_eq!(escape_time(DVec2::new(-1.0, 0.0), MAX), Escape::Interior);
    }

    #[test]
    fn known_escape_count() {
        // z₁=1, z₂=2 (|z|²=4, not > 4), z₃=5 → escapes at n=2.
        match escape_time(DVec2::new(1.0, 0.0), MAX) {
            Escape::Escaped { iterations, .. } => assert_eq!(iterations, 2),
            Escape::Interior => panic!("c=1.0 should escape"),
        }
    }

    #[test]
    fn zero_iterations_is_interior_outside_fast_paths() {
        assert_eq!(escape_time(DVec2::new(0.5, 0.5), 0), Escape::Interior);
    }

    #[test]
    fn smooth_count_is_close_to_integer_count() {
        let e = escape_time(DVec2::new(0.5, 0.5), MAX);
        let Escape::Escaped { iterations, .. } = e else {
            panic!("0.5 + 0.5i should escape");
        };
        let nu = e.smooth_iterations().unwrap();
        assert!((nu - iterations as f64).abs() < 2.0);
        assert_eq!(Escape::Interior.smooth_iterations(), None);
    }
}
