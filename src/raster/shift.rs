//! Sub-pixel toroidal panning with 16.16 fixed-point bilinear weights.

use crate::color::Rgb;

/// Fixed-point one (`1.0` in 16.16).
pub const ONE: u32 = 1 << 16;

/// Corner weights `[w00, w10, w01, w11]` for fractional offsets `fx`, `fy` (`< ONE`).
///
/// `w00` weights the unshifted sample, `w10` its horizontal neighbour, `w01` its
/// vertical neighbour, and `w11` the diagonal. The four always sum to exactly [`ONE`],
/// so blending never gains or loses brightness. With `fx == fy == 0` all weight lands
/// on `w00`.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "each product of two values <= ONE shifted right by 16 is <= ONE"
)]
pub fn bilinear_weights(fx: u32, fy: u32) -> [u32; 4] {
    debug_assert!(fx < ONE && fy < ONE, "fractions must be below one");
    let one = u64::from(ONE);
    let (fx, fy) = (u64::from(fx), u64::from(fy));
    let w00 = (((one - fx) * (one - fy)) >> 16) as u32;
    let w10 = ((fx * (one - fy)) >> 16) as u32;
    let w01 = (((one - fx) * fy) >> 16) as u32;
    // The remainder absorbs the truncation of the other three.
    let w11 = ONE - w00 - w10 - w01;
    [w00, w10, w01, w11]
}

/// Blend four corner colors with weights from [`bilinear_weights`].
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "weights sum to ONE, so each weighted channel sum is at most 255 << 16"
)]
pub fn blend(corners: [Rgb; 4], weights: [u32; 4]) -> Rgb {
    let channel = |pick: fn(Rgb) -> u8| -> u8 {
        let sum: u32 = corners
            .iter()
            .zip(weights)
            .map(|(corner, weight)| u32::from(pick(*corner)) * weight)
            .sum();
        (sum >> 16) as u8
    };
    Rgb::new(
        channel(|rgb| rgb.r),
        channel(|rgb| rgb.g),
        channel(|rgb| rgb.b),
    )
}

/// A shift along one axis, split into whole cells and a 16-bit fraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxisShift {
    /// Whole cells, `< extent`.
    pub whole: usize,
    /// Fraction of a cell, `< ONE`.
    pub fraction: u32,
}

impl AxisShift {
    /// Convert `shift` (a fraction of `extent`) to fixed point, wrapped into `0..extent`.
    ///
    /// Shifts outside `[0, 1)` wrap around, so `1.25` pans like `0.25` and `-0.25` like `0.75`.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss,
        reason = "extents are small; the wrapped value is non-negative and below extent << 16"
    )]
    pub fn new(shift: f32, extent: usize) -> Self {
        let span = (extent as i64) << 16;
        if span == 0 {
            return Self {
                whole: 0,
                fraction: 0,
            };
        }
        let raw = (shift * extent as f32 * ONE as f32) as i64;
        let wrapped = raw.rem_euclid(span);
        Self {
            whole: (wrapped >> 16) as usize,
            fraction: (wrapped & 0xFFFF) as u32,
        }
    }

    /// Source indices `(near, far)` for destination `index`: `near` is `index` moved back
    /// by the whole shift, `far` one cell further back. Both wrap modulo `extent`.
    #[must_use]
    pub const fn sources(self, index: usize, extent: usize) -> (usize, usize) {
        let near = (index + extent - self.whole) % extent;
        let far = (near + extent - 1) % extent;
        (near, far)
    }
}

/// A complete 2D shift: per-axis offsets plus the corner weights they imply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BilinearShift {
    x: AxisShift,
    y: AxisShift,
    weights: [u32; 4],
}

impl BilinearShift {
    /// Shift a `height x width` grid by `shift_x` of its width and `shift_y` of its height.
    #[must_use]
    pub fn new(shift_x: f32, shift_y: f32, width: usize, height: usize) -> Self {
        let x = AxisShift::new(shift_x, width);
        let y = AxisShift::new(shift_y, height);
        Self {
            x,
            y,
            weights: bilinear_weights(x.fraction, y.fraction),
        }
    }

    /// The corner weights, `[w00, w10, w01, w11]`.
    #[must_use]
    pub const fn weights(&self) -> [u32; 4] {
        self.weights
    }

    /// The shifted color for destination cell `(row, column)` of a row-major grid.
    ///
    /// # Panics
    ///
    /// Panics if `colors` holds fewer than `width * height` cells.
    #[must_use]
    pub fn sample(
        &self,
        colors: &[Rgb],
        width: usize,
        height: usize,
        row: usize,
        column: usize,
    ) -> Rgb {
        let (x0, x1) = self.x.sources(column, width);
        let (y0, y1) = self.y.sources(row, height);
        let at = |y: usize, x: usize| colors[y * width + x];
        blend([at(y0, x0), at(y0, x1), at(y1, x0), at(y1, x1)], self.weights)
    }
}
