//! Bit-plane frames for every board, and the current/next pair that output alternates.
//!
//! A [`FrameBuffer`] holds [`SLOTS_PER_BOARD`] [`BitPlaneValue`]s per board. Slot
//! `pixel * 3 + channel` carries channel R, G, or B of `pixel` for all strips of that
//! board. [`FrameStore`] keeps two buffers so the one being streamed out is never the
//! one being edited.

use crate::bit_plane::BitPlaneValue;
use crate::color::Rgb;
use crate::output::{FrameOutput, transmit_frame};
use crate::{BOARDS, NUM_PIXELS, SLOTS_PER_BOARD, STRIPS};

/// One physical LED: which board, which strip on that board, which pixel on that strip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub struct PixelAddress {
    /// Board index, `< BOARDS`.
    pub board: u8,
    /// Strip index on the board, `< STRIPS`.
    pub strip: u8,
    /// Pixel index on the strip, `< NUM_PIXELS`.
    pub pixel: u8,
}

impl PixelAddress {
    /// Create an address. Use [`PixelAddress::is_valid`] to check it against the geometry.
    #[must_use]
    pub const fn new(board: u8, strip: u8, pixel: u8) -> Self {
        Self {
            board,
            strip,
            pixel,
        }
    }

    /// Whether this address names an LED that exists.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        (self.board as usize) < BOARDS
            && (self.strip as usize) < STRIPS
            && (self.pixel as usize) < NUM_PIXELS
    }

    const fn first_slot(self) -> usize {
        self.pixel as usize * 3
    }
}

/// Bit-plane encoded state of every LED on every board.
#[derive(Clone)]
pub struct FrameBuffer([[BitPlaneValue; SLOTS_PER_BOARD]; BOARDS]);

impl FrameBuffer {
    /// All LEDs off.
    #[must_use]
    pub const fn new() -> Self {
        Self([[BitPlaneValue::ZERO; SLOTS_PER_BOARD]; BOARDS])
    }

    /// Turn every LED off.
    pub fn clear(&mut self) {
        for board in &mut self.0 {
            board.fill(BitPlaneValue::ZERO);
        }
    }

    /// Write `rgb` for the LED at `address`. Only that strip's bits change.
    ///
    /// # Panics
    ///
    /// Panics if `address` is outside the configured geometry.
    pub fn encode_pixel(&mut self, address: PixelAddress, rgb: Rgb) {
        let strip = usize::from(address.strip);
        let first = address.first_slot();
        let slots = &mut self.0[usize::from(address.board)][first..first + 3];
        for (slot, channel) in slots.iter_mut().zip([rgb.r, rgb.g, rgb.b]) {
            slot.set_channel(strip, channel);
        }
    }

    /// Read back the color stored for the LED at `address`.
    ///
    /// # Panics
    ///
    /// Panics if `address` is outside the configured geometry.
    #[must_use]
    pub fn decode_pixel(&self, address: PixelAddress) -> Rgb {
        let strip = usize::from(address.strip);
        let first = address.first_slot();
        let slots = &self.0[usize::from(address.board)][first..first + 3];
        Rgb::new(
            slots[0].channel(strip),
            slots[1].channel(strip),
            slots[2].channel(strip),
        )
    }

    /// The slots of one board, in transmission order.
    ///
    /// # Panics
    ///
    /// Panics if `board >= BOARDS`.
    #[must_use]
    pub fn board(&self, board: usize) -> &[BitPlaneValue; SLOTS_PER_BOARD] {
        &self.0[board]
    }

    /// Overwrite this frame with `other`.
    pub fn copy_from(&mut self, other: &Self) {
        self.0.clone_from(&other.0);
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for FrameBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

/// Current/next frame pair for single-context output.
///
/// Edits go to the current frame. [`FrameStore::show_pixels`] streams it out, copies it
/// into the next frame so untouched pixels persist, then swaps roles.
pub struct FrameStore {
    frames: [FrameBuffer; 2],
    current: usize,
}

impl FrameStore {
    /// Two blank frames, frame 0 current.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            frames: [FrameBuffer::new(), FrameBuffer::new()],
            current: 0,
        }
    }

    /// Index (0 or 1) of the frame being edited.
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current
    }

    /// The frame being edited.
    #[must_use]
    pub fn current(&self) -> &FrameBuffer {
        &self.frames[self.current]
    }

    /// The frame being edited, mutably.
    pub fn current_mut(&mut self) -> &mut FrameBuffer {
        &mut self.frames[self.current]
    }

    /// The frame that becomes current after the next flip, mutably.
    ///
    /// [`copy_forward_and_flip`](Self::copy_forward_and_flip) overwrites it with the
    /// current frame, so edits here only matter to code that reads it before then.
    pub fn next_mut(&mut self) -> &mut FrameBuffer {
        &mut self.frames[self.current ^ 1]
    }

    /// Encode one LED into the current frame.
    pub fn encode_pixel(&mut self, address: PixelAddress, rgb: Rgb) {
        self.current_mut().encode_pixel(address, rgb);
    }

    /// Copy the current frame into the next one and make the next one current.
    pub fn copy_forward_and_flip(&mut self) {
        let [first, second] = &mut self.frames;
        let (from, to) = if self.current == 0 {
            (&*first, second)
        } else {
            (&*second, first)
        };
        to.copy_from(from);
        self.current ^= 1;
    }

    /// Stream the current frame board by board, then [`copy_forward_and_flip`](Self::copy_forward_and_flip).
    ///
    /// The copy only reads the frame still being streamed; the frame it overwrites
    /// finished streaming before the first board of this pass was started.
    pub async fn show_pixels<O: FrameOutput>(&mut self, output: &mut O) {
        transmit_frame(self.current(), output).await;
        self.copy_forward_and_flip();
    }
}

impl Default for FrameStore {
    fn default() -> Self {
        Self::new()
    }
}
