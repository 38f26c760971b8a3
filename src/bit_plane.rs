//! Transposed bit-plane encoding of one color channel across all strips of a board.
//!
//! A [`BitPlaneValue`] is eight 32-bit words. Word `k` ("plane `k`") holds bit `7 - k`
//! of the channel value for every strip, strip `s` owning bit `1 << s`. Streaming the
//! eight words in order therefore emits the channel most significant bit first on every
//! strip at once, which is what the WS2812 PIO program consumes.

use crate::STRIPS;

/// Planes per channel value (one per bit of a `u8`).
pub const PLANE_COUNT: usize = 8;

/// Eight plane words for one color channel slot, most significant bit first.
///
/// Word-aligned so the DMA engine can read it as one 8-word fragment.
#[repr(C, align(4))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BitPlaneValue(pub [u32; PLANE_COUNT]);

impl BitPlaneValue {
    /// All strips off.
    pub const ZERO: Self = Self([0; PLANE_COUNT]);

    /// Store `value` as `strip`'s channel, leaving every other strip's bits untouched.
    ///
    /// Idempotent: writing the same value twice leaves the same planes.
    ///
    /// # Panics
    ///
    /// Panics if `strip >= STRIPS`.
    pub fn set_channel(&mut self, strip: usize, value: u8) {
        assert!(strip < STRIPS, "strip index out of range");
        let mask = 1_u32 << strip;
        for (plane_index, plane) in self.0.iter_mut().enumerate() {
            if value & (0x80 >> plane_index) == 0 {
                *plane &= !mask;
            } else {
                *plane |= mask;
            }
        }
    }

    /// Read `strip`'s channel value back out of the planes.
    ///
    /// # Panics
    ///
    /// Panics if `strip >= STRIPS`.
    #[must_use]
    pub fn channel(&self, strip: usize) -> u8 {
        assert!(strip < STRIPS, "strip index out of range");
        self.0
            .iter()
            .fold(0_u8, |value, plane| (value << 1) | u8::from((plane >> strip) & 1 == 1))
    }

    /// Address of plane 0, as the DMA control channel expects it.
    #[must_use]
    pub fn as_ptr(&self) -> *const u32 {
        self.0.as_ptr()
    }
}
