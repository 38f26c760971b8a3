//! Logical-to-physical address generation for raster objects.
//!
//! [`AddressMap`] walks a `height x width` grid in row-major order and yields the
//! [`PixelAddress`] each cell lands on. A cursor starts at the raster's start address
//! and moves through pixels, then strips, then boards. Boards form a ring: stepping past
//! the last board wraps to board 0.

use crate::frame_buffer::PixelAddress;
use crate::{BOARDS, NUM_PIXELS, STRIPS};

/// How consecutive rows of a raster are laid onto strips.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub enum WrapMode {
    /// Every strip holds one `width`-pixel window starting at the start pixel. When the
    /// window is used up, the next cell goes to the next strip's window.
    #[default]
    Clip,
    /// Rows follow each other along the strip. A row that would reach the end of the
    /// strip starts on the next strip instead.
    NoWrap,
    /// Serpentine: rows fill `width`-pixel segments of a strip, every odd segment
    /// running backwards. Requires `width` to divide [`NUM_PIXELS`] and the start pixel
    /// to sit on a segment boundary; otherwise the raster is laid out as [`NoWrap`](Self::NoWrap).
    Wrap,
}

/// Whether a raster of this width starting at `start_pixel` can use [`WrapMode::Wrap`].
#[must_use]
pub const fn wrap_supported(width: usize, start_pixel: usize) -> bool {
    width > 0 && NUM_PIXELS % width == 0 && start_pixel % width == 0
}

/// The mode a raster actually gets, after the [`WrapMode::Wrap`] fallback.
#[must_use]
pub const fn effective_mode(requested: WrapMode, width: usize, start_pixel: usize) -> WrapMode {
    match requested {
        WrapMode::Wrap if !wrap_supported(width, start_pixel) => WrapMode::NoWrap,
        mode => mode,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Cursor {
    board: usize,
    strip: usize,
    pixel: usize,
}

impl Cursor {
    const fn from_address(address: PixelAddress) -> Self {
        Self {
            board: address.board as usize,
            strip: address.strip as usize,
            pixel: address.pixel as usize,
        }
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "cursor fields stay below BOARDS, STRIPS, and NUM_PIXELS, which all fit in u8"
    )]
    const fn address_at(self, pixel: usize) -> PixelAddress {
        PixelAddress::new(self.board as u8, self.strip as u8, pixel as u8)
    }

    const fn address(self) -> PixelAddress {
        self.address_at(self.pixel)
    }

    const fn next_strip(&mut self) {
        self.strip += 1;
        if self.strip >= STRIPS {
            self.strip = 0;
            self.board = (self.board + 1) % BOARDS;
        }
    }

    const fn advance(&mut self, pixels: usize) {
        self.pixel += pixels;
        if self.pixel >= NUM_PIXELS {
            self.pixel -= NUM_PIXELS;
            self.next_strip();
        }
    }
}

/// Iterator over the physical address of every cell of a raster, row by row.
///
/// ```rust
/// use pixel_blit::frame_buffer::PixelAddress;
/// use pixel_blit::raster::mapping::{AddressMap, WrapMode};
///
/// let map: Vec<_> = AddressMap::new(2, 3, PixelAddress::new(0, 5, 0), WrapMode::Clip).collect();
/// assert_eq!(map[2], PixelAddress::new(0, 5, 2));
/// assert_eq!(map[3], PixelAddress::new(0, 6, 0));
/// ```
#[derive(Clone, Debug)]
pub struct AddressMap {
    height: usize,
    width: usize,
    mode: WrapMode,
    window: (usize, usize),
    cursor: Cursor,
    row_start: Cursor,
    row_reversed: bool,
    row: usize,
    column: usize,
}

impl AddressMap {
    /// Walk a `height x width` raster whose first cell sits at `start`.
    ///
    /// `start` must be a valid address (see [`PixelAddress::is_valid`]).
    #[must_use]
    pub fn new(height: usize, width: usize, start: PixelAddress, wrap: WrapMode) -> Self {
        let cursor = Cursor::from_address(start);
        let window_end = cursor.pixel.saturating_add(width).min(NUM_PIXELS);
        Self {
            height,
            width,
            mode: effective_mode(wrap, width, cursor.pixel),
            window: (cursor.pixel, window_end),
            cursor,
            row_start: cursor,
            row_reversed: false,
            row: 0,
            column: 0,
        }
    }

    /// The layout in use, after the [`WrapMode::Wrap`] fallback.
    #[must_use]
    pub const fn mode(&self) -> WrapMode {
        self.mode
    }

    fn begin_row(&mut self) {
        match self.mode {
            WrapMode::Clip => {}
            WrapMode::NoWrap => {
                let pixel = self.cursor.pixel;
                if self.row > 0 && pixel != 0 && pixel + self.width >= NUM_PIXELS {
                    self.cursor.pixel = 0;
                    self.cursor.next_strip();
                }
            }
            WrapMode::Wrap => {
                self.row_start = self.cursor;
                self.row_reversed = (self.cursor.pixel / self.width) % 2 == 1;
            }
        }
    }

    fn next_address(&mut self) -> PixelAddress {
        match self.mode {
            WrapMode::Clip => {
                let (window_start, window_end) = self.window;
                if self.cursor.pixel >= window_end {
                    self.cursor.pixel = window_start;
                    self.cursor.next_strip();
                }
                let address = self.cursor.address();
                self.cursor.pixel += 1;
                address
            }
            WrapMode::NoWrap => {
                let address = self.cursor.address();
                self.cursor.advance(1);
                address
            }
            WrapMode::Wrap => {
                let offset = if self.row_reversed {
                    self.width - 1 - self.column
                } else {
                    self.column
                };
                self.row_start.address_at(self.row_start.pixel + offset)
            }
        }
    }

    const fn remaining(&self) -> usize {
        (self.height - self.row) * self.width - self.column
    }
}

impl Iterator for AddressMap {
    type Item = PixelAddress;

    fn next(&mut self) -> Option<PixelAddress> {
        if self.row >= self.height || self.width == 0 {
            return None;
        }
        if self.column == 0 {
            self.begin_row();
        }
        let address = self.next_address();
        self.column += 1;
        if self.column == self.width {
            self.column = 0;
            self.row += 1;
            if self.mode == WrapMode::Wrap {
                self.cursor.advance(self.width);
            }
        }
        Some(address)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.width == 0 { 0 } else { self.remaining() };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for AddressMap {}
