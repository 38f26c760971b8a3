#![cfg(feature = "host")]
#![allow(missing_docs)]
//! PNG preview rendering of whole frames and single boards.

use pixel_blit::color::colors;
use pixel_blit::frame_buffer::{FrameBuffer, PixelAddress};
use pixel_blit::to_png::{write_board_apng, write_board_png, write_frame_png};
use png::{BitDepth, ColorType, Decoder, Transformations};
use std::error::Error;
use std::fs::File;
use std::path::Path;

struct Decoded {
    width: u32,
    height: u32,
    frames: Option<u32>,
    pixels: Vec<u8>,
}

fn decode(path: &Path) -> Result<Decoded, Box<dyn Error>> {
    let mut decoder = Decoder::new(File::open(path)?);
    decoder.set_transformations(Transformations::IDENTITY);
    let mut reader = decoder.read_info()?;
    let info = reader.info();
    assert_eq!(info.color_type, ColorType::Rgb);
    assert_eq!(info.bit_depth, BitDepth::Sixteen);
    let (width, height) = (info.width, info.height);
    let frames = info.animation_control.as_ref().map(|control| control.num_frames);
    let mut pixels = vec![0; reader.output_buffer_size()];
    reader.next_frame(&mut pixels)?;
    Ok(Decoded {
        width,
        height,
        frames,
        pixels,
    })
}

/// Big-endian 16-bit RGB at image coordinate (`x`, `y`).
fn sample(decoded: &Decoded, x: u32, y: u32) -> [u16; 3] {
    let start = usize::try_from((y * decoded.width + x) * 6).expect("index fits in usize");
    let bytes = &decoded.pixels[start..start + 6];
    [0, 2, 4].map(|offset| u16::from_be_bytes([bytes[offset], bytes[offset + 1]]))
}

fn lit_frame() -> Box<FrameBuffer> {
    let mut frame = Box::new(FrameBuffer::new());
    frame.encode_pixel(PixelAddress::new(0, 0, 0), colors::RED);
    frame.encode_pixel(PixelAddress::new(9, 15, 99), colors::BLUE);
    frame
}

#[test]
fn board_png_draws_one_disc_per_led() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("previews/board0.png");
    write_board_png(&lit_frame(), 0, &path, 800)?;

    let decoded = decode(&path)?;
    // 7-pixel cells with a 2-pixel border: 100 columns by 16 strips.
    assert_eq!((decoded.width, decoded.height), (704, 116));
    assert_eq!(decoded.frames, None);
    // Center of the first LED's cell.
    assert_eq!(sample(&decoded, 5, 5), [u16::MAX, 0, 0]);
    // Center of the second LED's cell stays dark.
    assert_eq!(sample(&decoded, 12, 5), [0, 0, 0]);
    Ok(())
}

#[test]
fn frame_png_stacks_every_board() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("frame.png");
    write_frame_png(&lit_frame(), &path, 800)?;

    let decoded = decode(&path)?;
    // 160 rows do not fit 800 pixels at five per cell, so cells shrink to the minimum.
    assert_eq!((decoded.width, decoded.height), (402, 642));
    // Last LED of the last board: cell (99, 159), center offset 1, border 1.
    assert_eq!(sample(&decoded, 1 + 99 * 4 + 1, 1 + 159 * 4 + 1), [0, 0, u16::MAX]);
    Ok(())
}

#[test]
fn board_apng_has_one_frame_per_input() -> Result<(), Box<dyn Error>> {
    let mut frames = vec![FrameBuffer::new(); 3];
    for (index, frame) in frames.iter_mut().enumerate() {
        let pixel = u8::try_from(index * 10)?;
        frame.encode_pixel(PixelAddress::new(2, 0, pixel), colors::LIME);
    }
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("walk.png");
    write_board_apng(&frames, 2, &path, 800, 100)?;

    let decoded = decode(&path)?;
    assert_eq!(decoded.frames, Some(3));
    assert_eq!((decoded.width, decoded.height), (704, 116));
    // The first frame lights pixel 0 of strip 0.
    assert_eq!(sample(&decoded, 5, 5), [0, u16::MAX, 0]);
    Ok(())
}
