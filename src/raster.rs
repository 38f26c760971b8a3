//! Raster objects: rectangular color grids with a fixed map onto physical LEDs.
//!
//! A [`RasterRegistry`] owns every raster. Each raster gets a contiguous span of a
//! fixed-capacity cell arena for its colors and addresses, carved out once by
//! [`RasterRegistry::create_raster`] and never freed. Rasters are named by [`RasterId`].
//!
//! Cells are addressed `(row, column)`. The address map is computed at creation (see
//! [`mapping`]) and never changes; drawing only touches colors. Flushing a raster
//! ([`RasterRegistry::show_raster_object`]) encodes each cell color into a
//! [`FrameBuffer`] at its mapped address.
//!
//! # Example
//!
//! ```rust
//! use pixel_blit::color::rgb_from_u32;
//! use pixel_blit::frame_buffer::{FrameBuffer, PixelAddress};
//! use pixel_blit::raster::{RasterRegistry, WrapMode};
//!
//! # fn main() -> pixel_blit::Result<()> {
//! let mut registry = RasterRegistry::<1600>::new();
//! let panel = registry.create_raster(16, 10, PixelAddress::new(0, 3, 0), WrapMode::Clip)?;
//! registry.fill_raster(panel, rgb_from_u32(0x00_00_FF))?;
//!
//! let mut frame = Box::new(FrameBuffer::new());
//! registry.show_raster_object(panel, &mut frame)?;
//! assert_eq!(frame.decode_pixel(PixelAddress::new(0, 4, 0)).b, 0xFF);
//! # Ok(())
//! # }
//! ```

pub mod mapping;
pub mod shift;

use core::convert::Infallible;
use core::ops::Range;

use embedded_graphics::Pixel;
use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::geometry::{OriginDimensions, Size};
use heapless::Vec;
use itertools::izip;

use crate::color::{BLACK, Rgb, Rgb888, ToRgb, fade_rgb};
use crate::frame_buffer::{FrameBuffer, PixelAddress};
use crate::{Error, MAX_RASTER_OBJECTS, Result};

pub use mapping::{AddressMap, WrapMode};
use shift::BilinearShift;

/// Handle to a raster in a [`RasterRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub struct RasterId(u8);

impl RasterId {
    /// Wrap a raw index. Lookups fail with [`Error::UnknownRaster`] if no raster has it.
    #[must_use]
    pub const fn from_index(index: u8) -> Self {
        Self(index)
    }

    /// Creation order of this raster, starting at 0.
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }
}

#[derive(Clone, Copy, Debug)]
struct RasterSpan {
    height: usize,
    width: usize,
    offset: usize,
}

impl RasterSpan {
    const fn cells(&self) -> Range<usize> {
        self.offset..self.offset + self.height * self.width
    }
}

/// Fixed-capacity store of up to [`MAX_RASTER_OBJECTS`] rasters sharing `CELLS` cells.
pub struct RasterRegistry<const CELLS: usize> {
    spans: Vec<RasterSpan, MAX_RASTER_OBJECTS>,
    colors: Vec<Rgb, CELLS>,
    addresses: Vec<PixelAddress, CELLS>,
}

impl<const CELLS: usize> RasterRegistry<CELLS> {
    /// An empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            spans: Vec::new(),
            colors: Vec::new(),
            addresses: Vec::new(),
        }
    }

    /// Number of rasters created so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Whether no raster has been created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Cells still available to new rasters.
    #[must_use]
    pub fn free_cells(&self) -> usize {
        CELLS - self.colors.len()
    }

    /// Ids of every raster, in creation order.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "MAX_RASTER_OBJECTS fits in u8"
    )]
    pub fn ids(&self) -> impl Iterator<Item = RasterId> + use<CELLS> {
        (0..self.spans.len()).map(|index| RasterId(index as u8))
    }

    /// Create a `height x width` raster whose first cell sits at `start`, laid out
    /// according to `wrap`. All cells start black.
    ///
    /// [`WrapMode::Wrap`] falls back to [`WrapMode::NoWrap`] (with a warning) when the
    /// width does not evenly divide a strip or `start` is not on a segment boundary.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyRaster`] if `height` or `width` is zero.
    /// - [`Error::StartOutOfRange`] if `start` is not a valid address.
    /// - [`Error::RasterRegistryFull`] if [`MAX_RASTER_OBJECTS`] rasters already exist.
    /// - [`Error::RasterArenaFull`] if fewer than `height * width` cells remain.
    pub fn create_raster(
        &mut self,
        height: usize,
        width: usize,
        start: PixelAddress,
        wrap: WrapMode,
    ) -> Result<RasterId> {
        if height == 0 || width == 0 {
            return Err(Error::EmptyRaster);
        }
        if !start.is_valid() {
            return Err(Error::StartOutOfRange);
        }
        if self.spans.is_full() {
            warn!("create_raster: max raster objects reached");
            return Err(Error::RasterRegistryFull);
        }
        let requested = height.saturating_mul(width);
        let available = self.free_cells();
        if requested > available {
            return Err(Error::RasterArenaFull {
                requested,
                available,
            });
        }

        let map = AddressMap::new(height, width, start, wrap);
        if map.mode() != wrap {
            warn!(
                "create_raster: width {} cannot wrap from pixel {}, using NoWrap",
                width,
                start.pixel
            );
        }

        let offset = self.colors.len();
        let id = self.spans.len();
        self.spans
            .push(RasterSpan {
                height,
                width,
                offset,
            })
            .map_err(|_| Error::RasterRegistryFull)?;
        for address in map {
            if self.addresses.push(address).is_err() || self.colors.push(BLACK).is_err() {
                // Leave the registry as it was before this call.
                self.spans.pop();
                self.addresses.truncate(offset);
                self.colors.truncate(offset);
                return Err(Error::RasterArenaFull {
                    requested,
                    available,
                });
            }
        }
        #[expect(clippy::cast_possible_truncation, reason = "id < MAX_RASTER_OBJECTS")]
        let id = RasterId(id as u8);
        info!(
            "create_raster: raster {} is {}x{}",
            id.index(),
            height,
            width
        );
        Ok(id)
    }

    fn span(&self, id: RasterId) -> Result<RasterSpan> {
        self.spans.get(usize::from(id.0)).copied().ok_or_else(|| {
            warn!("unknown raster id {}", id.0);
            Error::UnknownRaster(id.0)
        })
    }

    /// Read-only view of a raster.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownRaster`] if `id` was not returned by this registry.
    pub fn get_raster(&self, id: RasterId) -> Result<Raster<'_>> {
        let span = self.span(id)?;
        let cells = span.cells();
        Ok(Raster {
            id,
            height: span.height,
            width: span.width,
            colors: &self.colors[cells.clone()],
            addresses: &self.addresses[cells],
        })
    }

    /// Mutable view of a raster's colors. Also an embedded-graphics [`DrawTarget`].
    ///
    /// # Errors
    ///
    /// [`Error::UnknownRaster`] if `id` was not returned by this registry.
    pub fn raster_mut(&mut self, id: RasterId) -> Result<RasterMut<'_>> {
        let span = self.span(id)?;
        let cells = span.cells();
        Ok(RasterMut {
            id,
            height: span.height,
            width: span.width,
            colors: &mut self.colors[cells.clone()],
            addresses: &self.addresses[cells],
        })
    }

    /// Set every cell of a raster to `color`.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownRaster`] if `id` is unknown; nothing is changed.
    pub fn fill_raster(&mut self, id: RasterId, color: Rgb) -> Result<()> {
        self.raster_mut(id)?.fill(color);
        Ok(())
    }

    /// Set one cell. `x` is the row and `y` the column.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownRaster`] if `id` is unknown, [`Error::IndexOutOfBounds`] if the
    /// cell is outside the raster. Nothing is changed on error.
    pub fn draw_pixel(&mut self, id: RasterId, x: usize, y: usize, color: Rgb) -> Result<()> {
        self.raster_mut(id)?.set(x, y, color)
    }

    /// Scale every cell by `amount / 256` (see [`fade_rgb`]).
    ///
    /// # Errors
    ///
    /// [`Error::UnknownRaster`] if `id` is unknown; nothing is changed.
    pub fn fade_raster(&mut self, id: RasterId, amount: u8) -> Result<()> {
        self.raster_mut(id)?.fade(amount);
        Ok(())
    }

    /// Encode every cell of a raster into `frame` at its mapped address.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownRaster`] if `id` is unknown; `frame` is not touched.
    pub fn show_raster_object(&self, id: RasterId, frame: &mut FrameBuffer) -> Result<()> {
        self.get_raster(id)?.show(frame);
        Ok(())
    }

    /// Encode every raster, in creation order. Later rasters win where maps overlap.
    pub fn show_all_raster_objects(&self, frame: &mut FrameBuffer) {
        for span in &self.spans {
            let cells = span.cells();
            for (address, color) in izip!(&self.addresses[cells.clone()], &self.colors[cells]) {
                frame.encode_pixel(*address, *color);
            }
        }
    }

    /// Encode a raster panned by `shift_x` of its width and `shift_y` of its height,
    /// wrapping around its edges, with bilinear blending between cells.
    ///
    /// The raster's own colors are not modified. Zero shifts encode it unchanged.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownRaster`] if `id` is unknown; `frame` is not touched.
    pub fn show_raster_object_with_shift(
        &self,
        id: RasterId,
        shift_x: f32,
        shift_y: f32,
        frame: &mut FrameBuffer,
    ) -> Result<()> {
        self.get_raster(id)?.show_with_shift(shift_x, shift_y, frame);
        Ok(())
    }
}

impl<const CELLS: usize> Default for RasterRegistry<CELLS> {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of one raster.
#[derive(Clone, Copy, Debug)]
pub struct Raster<'a> {
    id: RasterId,
    height: usize,
    width: usize,
    colors: &'a [Rgb],
    addresses: &'a [PixelAddress],
}

impl<'a> Raster<'a> {
    /// This raster's id.
    #[must_use]
    pub const fn id(&self) -> RasterId {
        self.id
    }

    /// Rows.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Columns.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Color of cell `(row, column)`, if inside the raster.
    #[must_use]
    pub fn color(&self, row: usize, column: usize) -> Option<Rgb> {
        cell_index(self.height, self.width, row, column).map(|index| self.colors[index])
    }

    /// Physical LED of cell `(row, column)`, if inside the raster.
    #[must_use]
    pub fn address(&self, row: usize, column: usize) -> Option<PixelAddress> {
        cell_index(self.height, self.width, row, column).map(|index| self.addresses[index])
    }

    /// Colors, row-major.
    #[must_use]
    pub const fn colors(&self) -> &'a [Rgb] {
        self.colors
    }

    /// Addresses, row-major.
    #[must_use]
    pub const fn addresses(&self) -> &'a [PixelAddress] {
        self.addresses
    }

    /// Colors row by row.
    pub fn rows(&self) -> impl Iterator<Item = &'a [Rgb]> + use<'a> {
        self.colors.chunks_exact(self.width)
    }

    /// Encode every cell into `frame` at its mapped address.
    pub fn show(&self, frame: &mut FrameBuffer) {
        for (address, color) in izip!(self.addresses, self.colors) {
            frame.encode_pixel(*address, *color);
        }
    }

    /// Encode the raster panned by a fraction of its size (see
    /// [`RasterRegistry::show_raster_object_with_shift`]).
    pub fn show_with_shift(&self, shift_x: f32, shift_y: f32, frame: &mut FrameBuffer) {
        let shift = BilinearShift::new(shift_x, shift_y, self.width, self.height);
        for (index, address) in self.addresses.iter().enumerate() {
            let (row, column) = (index / self.width, index % self.width);
            let color = shift.sample(self.colors, self.width, self.height, row, column);
            frame.encode_pixel(*address, color);
        }
    }
}

/// Mutable view of one raster's colors.
pub struct RasterMut<'a> {
    id: RasterId,
    height: usize,
    width: usize,
    colors: &'a mut [Rgb],
    addresses: &'a [PixelAddress],
}

impl RasterMut<'_> {
    /// Read-only view of the same raster.
    #[must_use]
    pub fn as_raster(&self) -> Raster<'_> {
        Raster {
            id: self.id,
            height: self.height,
            width: self.width,
            colors: &*self.colors,
            addresses: self.addresses,
        }
    }

    /// Rows.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Columns.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Color of cell `(row, column)`, if inside the raster.
    #[must_use]
    pub fn color(&self, row: usize, column: usize) -> Option<Rgb> {
        cell_index(self.height, self.width, row, column).map(|index| self.colors[index])
    }

    /// Set cell `(row, column)`.
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfBounds`] if the cell is outside the raster.
    pub fn set(&mut self, row: usize, column: usize, color: Rgb) -> Result<()> {
        let index =
            cell_index(self.height, self.width, row, column).ok_or(Error::IndexOutOfBounds)?;
        self.colors[index] = color;
        Ok(())
    }

    /// Set every cell to `color`.
    pub fn fill(&mut self, color: Rgb) {
        self.colors.fill(color);
    }

    /// Scale every cell by `amount / 256`.
    pub fn fade(&mut self, amount: u8) {
        for color in self.colors.iter_mut() {
            *color = fade_rgb(*color, amount);
        }
    }

    /// Colors row by row, mutably.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut [Rgb]> {
        self.colors.chunks_exact_mut(self.width)
    }
}

impl OriginDimensions for RasterMut<'_> {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "raster dimensions are bounded by the cell arena"
    )]
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

/// Drawing maps embedded-graphics `x` to the column and `y` to the row.
impl DrawTarget for RasterMut<'_> {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> core::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            let (Ok(column), Ok(row)) = (usize::try_from(coord.x), usize::try_from(coord.y))
            else {
                continue;
            };
            if let Some(index) = cell_index(self.height, self.width, row, column) {
                self.colors[index] = color.to_rgb();
            }
        }
        Ok(())
    }
}

const fn cell_index(height: usize, width: usize, row: usize, column: usize) -> Option<usize> {
    if row < height && column < width {
        Some(row * width + column)
    } else {
        None
    }
}
