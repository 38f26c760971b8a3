#![cfg(feature = "host")]
//! Offline previews: decode a [`FrameBuffer`] and draw each LED as a soft disc in a PNG.
//!
//! A board renders as [`STRIPS`] rows of [`NUM_PIXELS`] LEDs. A whole frame stacks the
//! boards top to bottom, board 0 first.

use png::{BitDepth, ColorType, Encoder, ScaledFloat};
use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::color::Rgb;
use crate::frame_buffer::{FrameBuffer, PixelAddress};
use crate::{BOARDS, NUM_PIXELS, STRIPS};

const PREVIEW_INVERSE_GAMMA: f32 = 2.2;

/// Decoded colors laid out row-major: one row per strip.
struct LedGrid {
    columns: usize,
    rows: usize,
    colors: Vec<Rgb>,
}

impl LedGrid {
    #[expect(clippy::cast_possible_truncation, reason = "geometry constants fit in u8")]
    fn from_boards(frame: &FrameBuffer, boards: impl Iterator<Item = usize>) -> Self {
        let mut colors = Vec::new();
        let mut rows = 0;
        for board in boards {
            assert!(board < BOARDS, "board must be below BOARDS");
            for strip in 0..STRIPS {
                colors.extend((0..NUM_PIXELS).map(|pixel| {
                    frame.decode_pixel(PixelAddress::new(board as u8, strip as u8, pixel as u8))
                }));
                rows += 1;
            }
        }
        Self {
            columns: NUM_PIXELS,
            rows,
            colors,
        }
    }
}

/// Render one board of `frame` into a PNG whose larger side is at most `target_max_dimension`.
///
/// # Panics
///
/// Panics if `board >= BOARDS` or `target_max_dimension` is zero.
pub fn write_board_png(
    frame: &FrameBuffer,
    board: usize,
    output_path: impl AsRef<Path>,
    target_max_dimension: u32,
) -> Result<(), Box<dyn Error>> {
    let grid = LedGrid::from_boards(frame, core::iter::once(board));
    write_grid_png(&grid, output_path.as_ref(), target_max_dimension)
}

/// Render every board of `frame`, stacked, into a PNG.
///
/// # Panics
///
/// Panics if `target_max_dimension` is zero.
pub fn write_frame_png(
    frame: &FrameBuffer,
    output_path: impl AsRef<Path>,
    target_max_dimension: u32,
) -> Result<(), Box<dyn Error>> {
    let grid = LedGrid::from_boards(frame, 0..BOARDS);
    write_grid_png(&grid, output_path.as_ref(), target_max_dimension)
}

/// Render one board across several frames into a looping APNG.
///
/// # Panics
///
/// Panics if `frames` is empty, `board >= BOARDS`, or a size argument is zero.
pub fn write_board_apng(
    frames: &[FrameBuffer],
    board: usize,
    output_path: impl AsRef<Path>,
    target_max_dimension: u32,
    frame_delay_ms: u16,
) -> Result<(), Box<dyn Error>> {
    assert!(!frames.is_empty(), "frames must not be empty");
    assert!(frame_delay_ms > 0, "frame_delay_ms must be positive");
    let output_path = output_path.as_ref();
    let grids: Vec<LedGrid> = frames
        .iter()
        .map(|frame| LedGrid::from_boards(frame, core::iter::once(board)))
        .collect();
    let cell_size = select_cell_size(&grids[0], target_max_dimension);
    let led_margin = (cell_size / 8).max(1);
    let frame_count = u32::try_from(grids.len())?;

    let rendered: Vec<(u32, u32, Vec<u8>)> = grids
        .iter()
        .map(|grid| grid_pixels(grid, cell_size, led_margin, PREVIEW_INVERSE_GAMMA))
        .collect();
    let (width, height, _) = rendered[0];

    create_parent_dir(output_path)?;
    let file = File::create(output_path)?;
    let mut encoder = Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(ColorType::Rgb);
    encoder.set_depth(BitDepth::Sixteen);
    encoder.set_source_gamma(ScaledFloat::new(1.0));
    encoder.set_animated(frame_count, 0)?;
    let mut writer = encoder.write_header()?;
    for (_, _, pixels) in rendered {
        writer.set_frame_delay(frame_delay_ms, 1000)?;
        writer.write_image_data(&pixels)?;
    }
    writer.finish()?;
    println!("wrote APNG to {}", output_path.display());
    Ok(())
}

fn write_grid_png(
    grid: &LedGrid,
    output_path: &Path,
    target_max_dimension: u32,
) -> Result<(), Box<dyn Error>> {
    let cell_size = select_cell_size(grid, target_max_dimension);
    let led_margin = (cell_size / 8).max(1);
    let (width, height, pixels) =
        grid_pixels(grid, cell_size, led_margin, PREVIEW_INVERSE_GAMMA);

    create_parent_dir(output_path)?;
    let file = File::create(output_path)?;
    let mut encoder = Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(ColorType::Rgb);
    encoder.set_depth(BitDepth::Sixteen);
    encoder.set_source_gamma(ScaledFloat::new(1.0));
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&pixels)?;
    println!("wrote PNG to {}", output_path.display());
    Ok(())
}

fn create_parent_dir(output_path: &Path) -> std::io::Result<()> {
    match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

#[expect(clippy::cast_possible_truncation, reason = "grids are at most a few hundred LEDs wide")]
fn select_cell_size(grid: &LedGrid, target_max_dimension: u32) -> u32 {
    assert!(target_max_dimension > 0, "target_max_dimension must be positive");
    let (columns, rows) = (grid.columns as u32, grid.rows as u32);
    // Discs need at least a 4-pixel cell for a non-empty fade ring.
    let mut cell_size = target_max_dimension.max(4);
    while cell_size > 4 {
        let led_margin = (cell_size / 8).max(1);
        let border = (cell_size - led_margin * 2) / 2;
        let max_dimension = (columns * cell_size).max(rows * cell_size) + border * 2;
        if max_dimension <= target_max_dimension {
            break;
        }
        cell_size -= 1;
    }
    cell_size
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    reason = "image coordinates are small and non-negative"
)]
fn grid_pixels(
    grid: &LedGrid,
    cell_size: u32,
    led_margin: u32,
    preview_inverse_gamma: f32,
) -> (u32, u32, Vec<u8>) {
    let led_radius = ((cell_size - led_margin * 2) / 2).max(1);
    let fade_width = (led_radius / 3).max(1);
    let border = led_radius;
    let width = grid.columns as u32 * cell_size + border * 2;
    let height = grid.rows as u32 * cell_size + border * 2;
    let mut bytes = vec![0u8; (width * height * 3 * 2) as usize];
    let center = (cell_size - 1) as i32 / 2;
    let led_radius_f = led_radius as f32;
    let inner_radius_f = led_radius.saturating_sub(fade_width) as f32;
    let radius_sq = (led_radius as i32) * (led_radius as i32);

    for (index, rgb) in grid.colors.iter().enumerate() {
        let cell_origin_x = (index % grid.columns) as u32 * cell_size;
        let cell_origin_y = (index / grid.columns) as u32 * cell_size;
        let linear = [rgb.r, rgb.g, rgb.b]
            .map(|channel| inverse_gamma_to_linear(channel, preview_inverse_gamma));

        for local_y in 0..cell_size {
            let delta_y = local_y as i32 - center;
            for local_x in 0..cell_size {
                let delta_x = local_x as i32 - center;
                let distance_sq = delta_x * delta_x + delta_y * delta_y;
                if distance_sq > radius_sq {
                    continue;
                }
                let distance = (distance_sq as f32).sqrt();
                let intensity = if distance <= inner_radius_f {
                    1.0
                } else {
                    (1.0 - (distance - inner_radius_f) / (led_radius_f - inner_radius_f)).max(0.0)
                };
                let x = border + cell_origin_x + local_x;
                let y = border + cell_origin_y + local_y;
                let pixel_index = ((y * width + x) * 3 * 2) as usize;
                for (offset, channel) in linear.iter().enumerate() {
                    let value = linear_to_u16(channel * intensity);
                    bytes[pixel_index + offset * 2..pixel_index + offset * 2 + 2]
                        .copy_from_slice(&value.to_be_bytes());
                }
            }
        }
    }

    (width, height, bytes)
}

fn inverse_gamma_to_linear(channel: u8, preview_inverse_gamma: f32) -> f32 {
    (f32::from(channel) / 255.0).powf(preview_inverse_gamma)
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is clamped to 0.0..=1.0 first"
)]
fn linear_to_u16(value: f32) -> u16 {
    (value.clamp(0.0, 1.0) * 65535.0).round() as u16
}
