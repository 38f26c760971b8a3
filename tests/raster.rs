#![cfg(feature = "host")]
#![allow(missing_docs)]
//! Host-level tests for the raster registry: drawing, fading, flushing, and shifting.

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle};
use pixel_blit::color::{BLACK, Rgb, rgb_from_u32, rgb_to_u32};
use pixel_blit::frame_buffer::{FrameBuffer, PixelAddress};
use pixel_blit::raster::shift::{BilinearShift, ONE, bilinear_weights};
use pixel_blit::raster::{RasterId, RasterRegistry, WrapMode};
use pixel_blit::{Error, MAX_RASTER_OBJECTS};

type Registry = RasterRegistry<4096>;

fn cell(registry: &Registry, id: RasterId, row: usize, column: usize) -> u32 {
    let raster = registry.get_raster(id).expect("raster must exist");
    rgb_to_u32(raster.color(row, column).expect("cell must exist"))
}

#[test]
fn fill_draw_and_fade_follow_cell_values() {
    let mut registry = Registry::new();
    let small = registry
        .create_raster(12, 75, PixelAddress::new(1, 4, 0), WrapMode::NoWrap)
        .expect("raster must fit");
    let large = registry
        .create_raster(20, 75, PixelAddress::new(0, 0, 0), WrapMode::NoWrap)
        .expect("raster must fit");

    registry.fill_raster(small, rgb_from_u32(0x00FF00)).expect("known id");
    registry.fill_raster(large, rgb_from_u32(0xFF0000)).expect("known id");
    assert_eq!(cell(&registry, small, 0, 0), 0x00FF00);
    assert_eq!(cell(&registry, large, 0, 0), 0xFF0000);
    assert_eq!(cell(&registry, small, 11, 74), 0x00FF00);
    assert_eq!(cell(&registry, large, 19, 74), 0xFF0000);

    registry.draw_pixel(small, 0, 0, rgb_from_u32(0x0000FF)).expect("in bounds");
    registry.draw_pixel(large, 0, 0, rgb_from_u32(0x0000FF)).expect("in bounds");
    assert_eq!(cell(&registry, small, 0, 0), 0x0000FF);
    assert_eq!(cell(&registry, large, 0, 0), 0x0000FF);
    assert_eq!(cell(&registry, small, 11, 74), 0x00FF00);

    registry.fade_raster(small, 255).expect("known id");
    registry.fade_raster(large, 255).expect("known id");
    assert_eq!(cell(&registry, small, 0, 0), 0x0000FE);
    assert_eq!(cell(&registry, large, 0, 0), 0x0000FE);
    assert_eq!(cell(&registry, small, 11, 74), 0x00FE00);
    assert_eq!(cell(&registry, large, 19, 74), 0xFE0000);

    registry.fade_raster(small, 0).expect("known id");
    registry.fade_raster(large, 0).expect("known id");
    assert_eq!(cell(&registry, small, 0, 0), 0);
    assert_eq!(cell(&registry, large, 19, 74), 0);
}

#[test]
fn draw_pixel_takes_row_then_column() {
    let mut registry = Registry::new();
    let id = registry
        .create_raster(4, 6, PixelAddress::new(0, 0, 0), WrapMode::Clip)
        .expect("raster must fit");
    registry.draw_pixel(id, 3, 5, rgb_from_u32(0x123456)).expect("in bounds");
    assert_eq!(cell(&registry, id, 3, 5), 0x123456);
    assert!(matches!(
        registry.draw_pixel(id, 4, 0, BLACK),
        Err(Error::IndexOutOfBounds)
    ));
    assert!(matches!(
        registry.draw_pixel(id, 0, 6, BLACK),
        Err(Error::IndexOutOfBounds)
    ));
}

#[test]
fn unknown_id_is_rejected_without_changes() {
    let mut registry = Registry::new();
    let id = registry
        .create_raster(2, 2, PixelAddress::new(0, 0, 0), WrapMode::Clip)
        .expect("raster must fit");
    registry.fill_raster(id, rgb_from_u32(0x010203)).expect("known id");

    let bogus = RasterId::from_index(7);
    assert!(matches!(registry.get_raster(bogus), Err(Error::UnknownRaster(7))));
    assert!(matches!(
        registry.fill_raster(bogus, BLACK),
        Err(Error::UnknownRaster(7))
    ));
    assert!(matches!(
        registry.fade_raster(bogus, 0),
        Err(Error::UnknownRaster(7))
    ));
    let mut frame = Box::new(FrameBuffer::new());
    assert!(matches!(
        registry.show_raster_object(bogus, &mut frame),
        Err(Error::UnknownRaster(7))
    ));
    assert!(*frame == FrameBuffer::new());
    assert_eq!(cell(&registry, id, 1, 1), 0x010203);
}

#[test]
fn create_raster_validates_arguments() {
    let mut registry = Registry::new();
    assert!(matches!(
        registry.create_raster(0, 5, PixelAddress::new(0, 0, 0), WrapMode::Clip),
        Err(Error::EmptyRaster)
    ));
    assert!(matches!(
        registry.create_raster(5, 0, PixelAddress::new(0, 0, 0), WrapMode::Clip),
        Err(Error::EmptyRaster)
    ));
    assert!(matches!(
        registry.create_raster(1, 1, PixelAddress::new(10, 0, 0), WrapMode::Clip),
        Err(Error::StartOutOfRange)
    ));
    assert!(matches!(
        registry.create_raster(1, 1, PixelAddress::new(0, 16, 0), WrapMode::Clip),
        Err(Error::StartOutOfRange)
    ));
    assert!(matches!(
        registry.create_raster(1, 1, PixelAddress::new(0, 0, 100), WrapMode::Clip),
        Err(Error::StartOutOfRange)
    ));
    assert!(registry.is_empty());
}

#[test]
fn arena_exhaustion_reports_sizes() {
    let mut registry = RasterRegistry::<100>::new();
    registry
        .create_raster(8, 10, PixelAddress::new(0, 0, 0), WrapMode::Clip)
        .expect("raster must fit");
    assert_eq!(registry.free_cells(), 20);
    let result = registry.create_raster(3, 10, PixelAddress::new(0, 0, 0), WrapMode::Clip);
    assert!(matches!(
        result,
        Err(Error::RasterArenaFull {
            requested: 30,
            available: 20
        })
    ));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.free_cells(), 20);
}

#[test]
fn raster_filling_the_arena_exactly_gets_every_cell() {
    let mut registry = RasterRegistry::<100>::new();
    let first = registry
        .create_raster(8, 10, PixelAddress::new(0, 0, 0), WrapMode::Clip)
        .expect("raster must fit");
    let too_big = registry.create_raster(3, 10, PixelAddress::new(0, 8, 0), WrapMode::Clip);
    assert!(too_big.is_err());

    let last = registry
        .create_raster(2, 10, PixelAddress::new(0, 8, 0), WrapMode::Clip)
        .expect("raster must fit");
    assert_eq!(last.index(), 1);
    assert_eq!(registry.free_cells(), 0);
    let raster = registry.get_raster(last).expect("known id");
    assert_eq!(raster.colors().len(), 20);
    assert_eq!(raster.address(0, 0), Some(PixelAddress::new(0, 8, 0)));
    assert_eq!(raster.address(1, 9), Some(PixelAddress::new(0, 9, 9)));
    assert_eq!(
        registry.get_raster(first).expect("known id").addresses().len(),
        80
    );
}

#[test]
fn registry_capacity_is_enforced() {
    let mut registry = Registry::new();
    for _ in 0..MAX_RASTER_OBJECTS {
        registry
            .create_raster(1, 1, PixelAddress::new(0, 0, 0), WrapMode::Clip)
            .expect("raster must fit");
    }
    assert_eq!(registry.len(), MAX_RASTER_OBJECTS);
    assert!(matches!(
        registry.create_raster(1, 1, PixelAddress::new(0, 0, 0), WrapMode::Clip),
        Err(Error::RasterRegistryFull)
    ));
    assert_eq!(registry.ids().count(), MAX_RASTER_OBJECTS);
}

#[test]
fn show_encodes_every_cell_at_its_address() {
    let mut registry = Registry::new();
    let id = registry
        .create_raster(16, 75, PixelAddress::new(0, 0, 0), WrapMode::NoWrap)
        .expect("raster must fit");
    registry.draw_pixel(id, 0, 0, rgb_from_u32(0x0000FF)).expect("in bounds");
    let mut frame = Box::new(FrameBuffer::new());
    registry.show_raster_object(id, &mut frame).expect("known id");

    // Pixel 0 of strip 0: blue is slot 2, every plane has strip 0's bit set.
    let board = frame.board(0);
    assert!(board[2].0.iter().all(|plane| plane & 1 == 1));
    assert!(board[0].0.iter().all(|plane| *plane == 0));

    registry.fill_raster(id, rgb_from_u32(0x0000FF)).expect("known id");
    registry.show_raster_object(id, &mut frame).expect("known id");
    let board = frame.board(0);
    assert!(board[2].0.iter().all(|plane| *plane == 0xFFFF));
    let raster = registry.get_raster(id).expect("raster must exist");
    for address in raster.addresses() {
        assert_eq!(frame.decode_pixel(*address), rgb_from_u32(0x0000FF));
    }
}

#[test]
fn show_all_draws_in_creation_order() {
    let mut registry = Registry::new();
    let under = registry
        .create_raster(1, 4, PixelAddress::new(2, 5, 10), WrapMode::Clip)
        .expect("raster must fit");
    let over = registry
        .create_raster(1, 2, PixelAddress::new(2, 5, 11), WrapMode::Clip)
        .expect("raster must fit");
    registry.fill_raster(under, rgb_from_u32(0x110000)).expect("known id");
    registry.fill_raster(over, rgb_from_u32(0x002200)).expect("known id");

    let mut frame = Box::new(FrameBuffer::new());
    registry.show_all_raster_objects(&mut frame);
    let decoded: Vec<u32> = (10..14)
        .map(|pixel| rgb_to_u32(frame.decode_pixel(PixelAddress::new(2, 5, pixel))))
        .collect();
    assert_eq!(decoded, [0x110000, 0x002200, 0x002200, 0x110000]);
}

#[test]
fn embedded_graphics_draws_x_as_column() {
    let mut registry = Registry::new();
    let id = registry
        .create_raster(3, 5, PixelAddress::new(0, 0, 0), WrapMode::Clip)
        .expect("raster must fit");
    {
        let mut raster = registry.raster_mut(id).expect("known id");
        assert_eq!(raster.size(), Size::new(5, 3));
        Line::new(Point::new(0, 2), Point::new(4, 2))
            .into_styled(PrimitiveStyle::with_stroke(Rgb888::GREEN, 1))
            .draw(&mut raster)
            .expect("drawing is infallible");
        Pixel(Point::new(-1, 0), Rgb888::RED)
            .draw(&mut raster)
            .expect("drawing is infallible");
    }
    let raster = registry.get_raster(id).expect("raster must exist");
    let rows: Vec<&[Rgb]> = raster.rows().collect();
    assert!(rows[2].iter().all(|color| *color == Rgb::new(0, 255, 0)));
    assert!(rows[0].iter().all(|color| *color == BLACK));
}

#[test]
fn zero_shift_reproduces_the_raster() {
    let mut registry = Registry::new();
    let id = registry
        .create_raster(4, 8, PixelAddress::new(1, 2, 30), WrapMode::Clip)
        .expect("raster must fit");
    {
        let mut raster = registry.raster_mut(id).expect("known id");
        for (row_index, row) in raster.rows_mut().enumerate() {
            for (column_index, color) in row.iter_mut().enumerate() {
                *color = Rgb::new((row_index * 40) as u8, (column_index * 30) as u8, 7);
            }
        }
    }
    let mut plain = Box::new(FrameBuffer::new());
    let mut shifted = Box::new(FrameBuffer::new());
    registry.show_raster_object(id, &mut plain).expect("known id");
    registry
        .show_raster_object_with_shift(id, 0.0, 0.0, &mut shifted)
        .expect("known id");
    assert!(*plain == *shifted);

    // Whole-turn shifts wrap back to the start.
    let mut full_turn = Box::new(FrameBuffer::new());
    registry
        .show_raster_object_with_shift(id, 1.0, -1.0, &mut full_turn)
        .expect("known id");
    assert!(*plain == *full_turn);
}

#[test]
fn whole_cell_shift_moves_columns_right() {
    let mut registry = Registry::new();
    let id = registry
        .create_raster(1, 4, PixelAddress::new(0, 0, 0), WrapMode::Clip)
        .expect("raster must fit");
    registry.draw_pixel(id, 0, 0, rgb_from_u32(0xFF0000)).expect("in bounds");

    let mut frame = Box::new(FrameBuffer::new());
    registry
        .show_raster_object_with_shift(id, 0.25, 0.0, &mut frame)
        .expect("known id");
    assert_eq!(frame.decode_pixel(PixelAddress::new(0, 0, 1)), rgb_from_u32(0xFF0000));
    assert_eq!(frame.decode_pixel(PixelAddress::new(0, 0, 0)), BLACK);
    // The raster itself is untouched.
    assert_eq!(cell(&registry, id, 0, 0), 0xFF0000);
}

#[test]
fn half_cell_shift_blends_neighbours() {
    let shift = BilinearShift::new(0.125, 0.0, 4, 1);
    assert_eq!(shift.weights(), [ONE / 2, ONE / 2, 0, 0]);
    let colors = [
        Rgb::new(200, 0, 0),
        Rgb::new(0, 0, 0),
        Rgb::new(0, 0, 0),
        Rgb::new(0, 100, 0),
    ];
    // Column 0 blends itself with column 3, its left neighbour around the edge.
    assert_eq!(shift.sample(&colors, 4, 1, 0, 0), Rgb::new(100, 50, 0));
    assert_eq!(shift.sample(&colors, 4, 1, 0, 1), Rgb::new(100, 0, 0));
}

#[test]
fn bilinear_weights_always_sum_to_one() {
    for fx in [0, 1, 999, ONE / 3, ONE / 2, ONE - 1] {
        for fy in [0, 7, ONE / 4, ONE / 2 + 3, ONE - 1] {
            let weights = bilinear_weights(fx, fy);
            assert_eq!(weights.iter().sum::<u32>(), ONE, "fx={fx} fy={fy}");
        }
    }
    assert_eq!(bilinear_weights(0, 0), [ONE, 0, 0, 0]);
}
