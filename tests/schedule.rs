#![cfg(feature = "host")]
#![allow(missing_docs)]
//! Host-level tests for rainbow painting and time-based effect rotation.

use embassy_time::{Duration, Instant};
use pixel_blit::color::{Rgb, colors};
use pixel_blit::frame_buffer::PixelAddress;
use pixel_blit::raster::{RasterId, RasterRegistry, WrapMode};
use pixel_blit::schedule::{Effect, Rainbow, Schedule, SolidColor, paint_rainbow, rainbow_step};
use pixel_blit::{Error, Result};

type Registry = RasterRegistry<64>;

const MAGENTA: Rgb = Rgb::new(255, 0, 255);

fn registry_with(height: usize, width: usize) -> Result<(Registry, RasterId)> {
    let mut registry = Registry::new();
    let id = registry.create_raster(height, width, PixelAddress::new(0, 0, 0), WrapMode::Clip)?;
    Ok((registry, id))
}

#[test]
fn paint_rainbow_runs_hue_across_and_down() -> Result<()> {
    let (mut registry, id) = registry_with(2, 2)?;
    paint_rainbow(&mut registry.raster_mut(id)?);
    let raster = registry.get_raster(id)?;
    assert_eq!(raster.color(0, 0), Some(colors::RED));
    assert_eq!(raster.color(0, 1), Some(Rgb::new(0, 255, 255)));
    assert_eq!(raster.color(1, 0), raster.color(0, 1));
    // Hue 1.0 is a full turn back to red.
    assert_eq!(raster.color(1, 1), Some(colors::RED));
    Ok(())
}

#[test]
fn rainbow_step_blends_neighbours_and_wraps_the_row() -> Result<()> {
    let (mut registry, id) = registry_with(1, 2)?;
    registry.draw_pixel(id, 0, 0, colors::RED)?;
    registry.draw_pixel(id, 0, 1, colors::BLUE)?;
    rainbow_step(&mut registry.raster_mut(id)?);
    let raster = registry.get_raster(id)?;
    assert_eq!(raster.color(0, 0), Some(MAGENTA));
    assert_eq!(raster.color(0, 1), Some(MAGENTA));
    Ok(())
}

#[test]
fn rainbow_step_leaves_uniform_rows_alone() -> Result<()> {
    let (mut registry, id) = registry_with(3, 5)?;
    registry.fill_raster(id, MAGENTA)?;
    rainbow_step(&mut registry.raster_mut(id)?);
    assert!(registry.get_raster(id)?.colors().iter().all(|&color| color == MAGENTA));
    Ok(())
}

#[derive(Default)]
struct Recorder {
    starts: u32,
    ticks: Vec<Duration>,
}

impl<const CELLS: usize> Effect<CELLS> for Recorder {
    fn start(&mut self, _registry: &mut RasterRegistry<CELLS>) -> Result<()> {
        self.starts += 1;
        Ok(())
    }

    fn tick(&mut self, _registry: &mut RasterRegistry<CELLS>, elapsed: Duration) -> Result<()> {
        self.ticks.push(elapsed);
        Ok(())
    }
}

#[test]
fn schedule_rotates_by_duration() -> Result<()> {
    let mut registry = Registry::new();
    let mut first = Recorder::default();
    let mut second = Recorder::default();
    {
        let mut schedule = Schedule::<64, 2>::new();
        schedule.push(&mut first, Duration::from_millis(100))?;
        schedule.push(&mut second, Duration::from_millis(50))?;

        let turns = [
            (0, 0),
            (60, 0),
            (100, 1),
            (110, 1),
            (170, 0),
            (180, 0),
        ];
        for (millis, index_after) in turns {
            schedule.tick(&mut registry, Instant::from_millis(millis))?;
            assert_eq!(schedule.current_index(), Some(index_after), "after {millis} ms");
        }
    }

    let millis = |values: &[u64]| -> Vec<Duration> {
        values.iter().copied().map(Duration::from_millis).collect()
    };
    assert_eq!(first.starts, 2);
    assert_eq!(first.ticks, millis(&[0, 60, 100, 0]));
    assert_eq!(second.starts, 1);
    assert_eq!(second.ticks, millis(&[0, 60]));
    Ok(())
}

#[test]
fn schedule_capacity_and_empty_schedule() -> Result<()> {
    let mut registry = Registry::new();
    let mut first = Recorder::default();
    let mut second = Recorder::default();
    let mut schedule = Schedule::<64, 1>::new();
    assert_eq!(schedule.current_index(), None);
    schedule.tick(&mut registry, Instant::from_secs(1))?;

    schedule.push(&mut first, Duration::from_secs(1))?;
    assert!(matches!(
        schedule.push(&mut second, Duration::from_secs(1)),
        Err(Error::ScheduleFull)
    ));
    Ok(())
}

#[test]
fn effect_errors_are_returned() {
    let mut registry = Registry::new();
    let mut solid = SolidColor::new(RasterId::from_index(7), colors::RED);
    let mut schedule = Schedule::<64, 1>::new();
    assert!(schedule.push(&mut solid, Duration::from_secs(1)).is_ok());
    assert!(matches!(
        schedule.tick(&mut registry, Instant::from_secs(0)),
        Err(Error::UnknownRaster(7))
    ));
}

#[test]
fn rainbow_then_solid_color() -> Result<()> {
    let (mut registry, id) = registry_with(4, 4)?;
    let mut rainbow = Rainbow::new(id);
    let mut solid = SolidColor::new(id, colors::RED);
    let mut schedule = Schedule::<64, 2>::new();
    schedule.push(&mut rainbow, Duration::from_secs(1))?;
    schedule.push(&mut solid, Duration::from_secs(1))?;

    schedule.tick(&mut registry, Instant::from_secs(0))?;
    assert!(
        registry
            .get_raster(id)?
            .colors()
            .iter()
            .any(|&color| color != colors::RED)
    );

    schedule.tick(&mut registry, Instant::from_secs(1))?;
    schedule.tick(&mut registry, Instant::from_secs(2))?;
    assert_eq!(schedule.current_index(), Some(1));
    assert!(
        registry
            .get_raster(id)?
            .colors()
            .iter()
            .all(|&color| color == colors::RED)
    );
    Ok(())
}
