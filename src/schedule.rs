//! Effects that animate rasters, and a schedule that rotates through them by time.
//!
//! An [`Effect`] gets [`start`](Effect::start) once when its turn begins and
//! [`tick`](Effect::tick) once per frame while its turn lasts. A [`Schedule`] holds
//! `(effect, duration)` entries and moves to the next entry, wrapping around, once the
//! current one has run for its duration.
//!
//! ```rust
//! use embassy_time::{Duration, Instant};
//! use pixel_blit::color::colors;
//! use pixel_blit::frame_buffer::PixelAddress;
//! use pixel_blit::raster::RasterRegistry;
//! use pixel_blit::raster::mapping::WrapMode;
//! use pixel_blit::schedule::{Rainbow, Schedule, SolidColor};
//!
//! # fn main() -> pixel_blit::Result<()> {
//! let mut registry = RasterRegistry::<1600>::new();
//! let id = registry.create_raster(16, 100, PixelAddress::new(0, 0, 0), WrapMode::Clip)?;
//!
//! let mut rainbow = Rainbow::new(id);
//! let mut solid = SolidColor::new(id, colors::RED);
//! let mut schedule = Schedule::<1600, 4>::new();
//! schedule.push(&mut rainbow, Duration::from_secs(60))?;
//! schedule.push(&mut solid, Duration::from_secs(2))?;
//!
//! schedule.tick(&mut registry, Instant::from_secs(0))?;
//! assert_eq!(schedule.current_index(), Some(0));
//! # Ok(())
//! # }
//! ```

use embassy_time::{Duration, Instant};
use heapless::Vec;

use crate::color::{Hsl, Rgb, hsl_to_rgb, mix_rgb};
use crate::raster::{RasterId, RasterMut, RasterRegistry};
use crate::{Error, Result};

/// Something that animates rasters in a [`RasterRegistry`].
pub trait Effect<const CELLS: usize> {
    /// Called once when the effect's turn begins.
    ///
    /// # Errors
    ///
    /// Whatever the effect's raster operations return.
    fn start(&mut self, registry: &mut RasterRegistry<CELLS>) -> Result<()> {
        let _ = registry;
        Ok(())
    }

    /// Called once per frame; `elapsed` is the time since [`start`](Self::start).
    ///
    /// # Errors
    ///
    /// Whatever the effect's raster operations return.
    fn tick(&mut self, registry: &mut RasterRegistry<CELLS>, elapsed: Duration) -> Result<()>;
}

struct Entry<'a, const CELLS: usize> {
    effect: &'a mut dyn Effect<CELLS>,
    duration: Duration,
}

/// Rotates through up to `N` effects, each for its own duration.
pub struct Schedule<'a, const CELLS: usize, const N: usize> {
    entries: Vec<Entry<'a, CELLS>, N>,
    current: usize,
    started_at: Option<Instant>,
}

impl<'a, const CELLS: usize, const N: usize> Schedule<'a, CELLS, N> {
    /// An empty schedule.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            current: 0,
            started_at: None,
        }
    }

    /// Append `effect`, to run for `duration` each time its turn comes.
    ///
    /// # Errors
    ///
    /// [`Error::ScheduleFull`] if `N` entries are already present.
    pub fn push(&mut self, effect: &'a mut dyn Effect<CELLS>, duration: Duration) -> Result<()> {
        self.entries
            .push(Entry { effect, duration })
            .map_err(|_| Error::ScheduleFull)
    }

    /// Index of the entry whose turn it is, or `None` for an empty schedule.
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        (!self.entries.is_empty()).then_some(self.current)
    }

    /// Run one frame of the current effect at time `now`.
    ///
    /// The first tick of a turn starts the effect. After the tick, a turn that has
    /// lasted its duration ends and the next entry's turn begins on the following call.
    /// An empty schedule does nothing.
    ///
    /// # Errors
    ///
    /// Whatever the current effect returns. The schedule still advances on time.
    pub fn tick(&mut self, registry: &mut RasterRegistry<CELLS>, now: Instant) -> Result<()> {
        let count = self.entries.len();
        let Some(entry) = self.entries.get_mut(self.current) else {
            return Ok(());
        };

        let started_at = match self.started_at {
            Some(started_at) => started_at,
            None => {
                debug!("schedule: starting entry {}", self.current);
                self.started_at = Some(now);
                entry.effect.start(registry)?;
                now
            }
        };

        let elapsed = now.saturating_duration_since(started_at);
        let result = entry.effect.tick(registry, elapsed);
        if elapsed >= entry.duration {
            self.current = (self.current + 1) % count;
            self.started_at = None;
        }
        result
    }
}

impl<const CELLS: usize, const N: usize> Default for Schedule<'_, CELLS, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Paint a diagonal rainbow: hue runs across the columns and again down the rows.
pub fn paint_rainbow(raster: &mut RasterMut<'_>) {
    let (height, width) = (raster.height(), raster.width());
    for (row_index, row) in raster.rows_mut().enumerate() {
        for (column_index, cell) in row.iter_mut().enumerate() {
            let mut hue = fraction(column_index, width) + fraction(row_index, height);
            if hue > 1.0 {
                hue -= 1.0;
            }
            *cell = hsl_to_rgb(Hsl::new(hue, 1.0, 0.5));
        }
    }
}

/// Blend every cell halfway toward its right-hand neighbour; the last cell of each row
/// blends with the row's old first cell.
pub fn rainbow_step(raster: &mut RasterMut<'_>) {
    for row in raster.rows_mut() {
        let Some(&first) = row.first() else {
            continue;
        };
        for column in 1..row.len() {
            row[column - 1] = mix_rgb(row[column - 1], row[column], 0.5);
        }
        if let Some(last) = row.last_mut() {
            *last = mix_rgb(first, *last, 0.5);
        }
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "raster dimensions are far below f32's exact integer range"
)]
fn fraction(index: usize, extent: usize) -> f32 {
    index as f32 / extent as f32
}

/// Rainbow that drifts as neighbouring cells blend into each other.
pub struct Rainbow {
    raster: RasterId,
}

impl Rainbow {
    /// Animate `raster`.
    #[must_use]
    pub const fn new(raster: RasterId) -> Self {
        Self { raster }
    }
}

impl<const CELLS: usize> Effect<CELLS> for Rainbow {
    fn start(&mut self, registry: &mut RasterRegistry<CELLS>) -> Result<()> {
        paint_rainbow(&mut registry.raster_mut(self.raster)?);
        Ok(())
    }

    fn tick(&mut self, registry: &mut RasterRegistry<CELLS>, _elapsed: Duration) -> Result<()> {
        rainbow_step(&mut registry.raster_mut(self.raster)?);
        Ok(())
    }
}

/// Fill a raster with one color when the turn begins.
pub struct SolidColor {
    raster: RasterId,
    color: Rgb,
}

impl SolidColor {
    /// Fill `raster` with `color`.
    #[must_use]
    pub const fn new(raster: RasterId, color: Rgb) -> Self {
        Self { raster, color }
    }
}

impl<const CELLS: usize> Effect<CELLS> for SolidColor {
    fn start(&mut self, registry: &mut RasterRegistry<CELLS>) -> Result<()> {
        registry.fill_raster(self.raster, self.color)
    }

    fn tick(&mut self, _registry: &mut RasterRegistry<CELLS>, _elapsed: Duration) -> Result<()> {
        Ok(())
    }
}

/// Fade a raster a little every frame.
pub struct FadeOut {
    raster: RasterId,
    amount: u8,
}

impl FadeOut {
    /// Scale `raster` by `amount / 256` per frame. `253` is a slow fade.
    #[must_use]
    pub const fn new(raster: RasterId, amount: u8) -> Self {
        Self { raster, amount }
    }
}

impl<const CELLS: usize> Effect<CELLS> for FadeOut {
    fn tick(&mut self, registry: &mut RasterRegistry<CELLS>, _elapsed: Duration) -> Result<()> {
        registry.fade_raster(self.raster, self.amount)
    }
}
