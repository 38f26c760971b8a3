//! Parallel WS2812 output for Pico 1 and 2: up to 16 strips per board, many boards.
//!
//! Client code draws into [`raster`] objects (rectangular grids of colors). Each raster
//! carries a precomputed map from grid cell to physical LED, so flushing a raster is a
//! walk over that map that encodes every color into a bit-plane [`frame_buffer`].
//! Completed frames go to the [`output`] executor, which usually runs on core 1 and
//! streams each board through PIO + chained DMA.
//!
//! # Glossary
//!
//! - **Board:** A group of up to [`STRIPS`] strips sharing the same data lines. One
//!   board is addressed at a time through four binary board-select lines.
//! - **Strip:** One chain of WS2812 LEDs on one PIO output pin, [`NUM_PIXELS`] long.
//! - **Bit plane:** One 32-bit word carrying the same bit position of one color channel
//!   for every strip at once. Eight planes, most significant bit first, make one
//!   [`BitPlaneValue`](bit_plane::BitPlaneValue).
//! - **Raster object:** A height x width color grid plus its fixed physical address map.
//! - **Settle delay:** The WS2812 reset/latch gap after a transfer ([`RESET_DELAY_US`]).
//! - **PIO ([Programmable I/O](https://medium.com/data-science/nine-pico-pio-wats-with-rust-part-1-9d062067dc25)):** Pico 1 has 2. Pico 2 has 3.
//! - **DMA ([Direct Memory Access](https://en.wikipedia.org/wiki/Direct_memory_access)):** Both Pico 1 and 2 have 12 channels.
#![cfg_attr(not(feature = "host"), no_std)]
#![cfg_attr(not(feature = "host"), no_main)]
#![allow(async_fn_in_trait, reason = "single-threaded embedded")]

// Compile-time checks: exactly one board must be selected (unless testing with host feature)
#[cfg(all(not(any(feature = "pico1", feature = "pico2")), not(feature = "host")))]
compile_error!("Must enable exactly one board feature: 'pico1' or 'pico2'");

#[cfg(all(feature = "pico1", feature = "pico2"))]
compile_error!("Cannot enable both 'pico1' and 'pico2' features simultaneously");

#[cfg(all(not(feature = "arm"), not(feature = "host")))]
compile_error!("Must enable the 'arm' architecture feature");

#[macro_use]
mod logging;

pub mod bit_plane;
pub mod color;
mod error;
pub mod frame_buffer;
pub mod output;
#[cfg(not(feature = "host"))]
#[doc(hidden)]
pub mod pio_irqs;
pub mod raster;
pub mod schedule;
#[cfg(feature = "host")]
pub mod to_png;

// Re-export error types and result (used throughout)
pub use crate::error::{Error, Result};

/// Number of boards the board-select lines can address in this installation.
pub const BOARDS: usize = 10;

/// Strips driven in parallel per board (one PIO output pin each).
pub const STRIPS: usize = 16;

/// LEDs per strip.
pub const NUM_PIXELS: usize = 100;

/// Upper bound on raster objects held by a [`raster::RasterRegistry`].
pub const MAX_RASTER_OBJECTS: usize = 100;

/// Bit-plane slots per board: one per color channel per pixel.
pub const SLOTS_PER_BOARD: usize = NUM_PIXELS * 3;

/// Binary board-select output lines (enough for 16 boards).
pub const BOARD_SELECT_LINES: usize = 4;

/// WS2812 bit rate.
pub const WS2812_BIT_RATE_HZ: u32 = 800_000;

/// Settle delay after each board's transfer before the next board may start.
pub const RESET_DELAY_US: u64 = 200;

const _: () = assert!(STRIPS <= 32, "one plane word carries at most 32 strips");
const _: () = assert!(BOARDS <= 1 << BOARD_SELECT_LINES, "board index must fit the select lines");
const _: () = assert!(NUM_PIXELS <= u8::MAX as usize + 1, "pixel index is stored as u8");
