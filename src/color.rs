//! Color helpers shared by raster effects: packing, HSL conversion, mixing, and fading.
//!
//! All colors are [`Rgb`] (`smart_leds::RGB8`). Effects that think in packed
//! `0xRRGGBB` integers can use [`rgb_from_u32`] and [`rgb_to_u32`].
//!
//! ```rust
//! use pixel_blit::color::{fade_rgb, hsl_to_rgb, rgb_from_u32, Hsl};
//!
//! let red = hsl_to_rgb(Hsl::new(0.0, 1.0, 0.5));
//! assert_eq!(red, rgb_from_u32(0xFF_00_00));
//! assert_eq!(fade_rgb(red, 128).r, 127);
//! ```

/// Predefined RGB color constants from the `smart_leds` crate.
#[doc(inline)]
pub use smart_leds::colors;

/// 8-bit-per-channel RGB color from `embedded_graphics`.
#[doc(inline)]
pub use embedded_graphics::pixelcolor::Rgb888;

use embedded_graphics::prelude::RgbColor;
use smart_leds::RGB8;

/// RGB color representation re-exported from the `smart_leds` crate.
pub type Rgb = RGB8;

/// Black (all channels off).
pub const BLACK: Rgb = Rgb::new(0, 0, 0);

/// Unpack `0xRRGGBB` into an [`Rgb`]. Bits above 24 are ignored.
#[must_use]
pub const fn rgb_from_u32(packed: u32) -> Rgb {
    Rgb::new(
        ((packed >> 16) & 0xFF) as u8,
        ((packed >> 8) & 0xFF) as u8,
        (packed & 0xFF) as u8,
    )
}

/// Pack an [`Rgb`] as `0xRRGGBB`.
#[must_use]
pub const fn rgb_to_u32(rgb: Rgb) -> u32 {
    ((rgb.r as u32) << 16) | ((rgb.g as u32) << 8) | rgb.b as u32
}

/// Scale every channel by `amount / 256`, truncating.
///
/// `255` is the gentlest fade (0xFF becomes 0xFE), `0` turns the color black.
#[must_use]
pub const fn fade_rgb(rgb: Rgb, amount: u8) -> Rgb {
    Rgb::new(
        fade_channel(rgb.r, amount),
        fade_channel(rgb.g, amount),
        fade_channel(rgb.b, amount),
    )
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "the product of two u8 values shifted right by 8 always fits in u8"
)]
const fn fade_channel(channel: u8, amount: u8) -> u8 {
    ((channel as u16 * amount as u16) >> 8) as u8
}

/// Hue, saturation, and lightness, each in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Hsl {
    /// Hue as a fraction of a full turn.
    pub h: f32,
    /// Saturation.
    pub s: f32,
    /// Lightness.
    pub l: f32,
}

impl Hsl {
    /// Create an HSL triple.
    #[must_use]
    pub const fn new(h: f32, s: f32, l: f32) -> Self {
        Self { h, s, l }
    }
}

/// Convert an [`Rgb`] to [`Hsl`]. Greys report zero hue and saturation.
#[must_use]
pub fn rgb_to_hsl(rgb: Rgb) -> Hsl {
    let [r, g, b] = normalized(rgb);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let l = (max + min) * 0.5;

    if delta <= 0.0 {
        return Hsl::new(0.0, 0.0, l);
    }

    let s = if l > 0.5 {
        delta / (2.0 - max - min)
    } else {
        delta / (max + min)
    };

    // Compare channel bytes, not floats, to find which channel is the max.
    let max_byte = rgb.r.max(rgb.g).max(rgb.b);
    let hue = if max_byte == rgb.r {
        (g - b) / delta + if g < b { 6.0 } else { 0.0 }
    } else if max_byte == rgb.g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };

    Hsl::new(hue / 6.0, s, l)
}

/// Convert [`Hsl`] to [`Rgb`] by hue sector, truncating each channel.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "hue sectors are small non-negative integers; channel casts saturate"
)]
pub fn hsl_to_rgb(hsl: Hsl) -> Rgb {
    let Hsl { h, s, l } = hsl;
    let chroma = (1.0 - abs(2.0 * l - 1.0)) * s;
    let h6 = h * 6.0;
    let sector = h6 as u32;
    let h6_mod_2 = h6 - 2.0 * ((h6 * 0.5) as u32) as f32;
    let x = chroma * (1.0 - abs(h6_mod_2 - 1.0));
    let m = l - chroma / 2.0;

    let (r, g, b) = match sector {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };

    Rgb::new(
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    )
}

/// Linearly interpolate from `first` (`amount = 0.0`) to `second` (`amount = 1.0`).
///
/// When the blend is dimmer than the brighter input, it is rescaled so its brightest
/// channel matches the brighter input. Results are clamped to the channel range.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "channels are clamped to 0.0..=1.0 before scaling to u8"
)]
pub fn mix_rgb(first: Rgb, second: Rgb, amount: f32) -> Rgb {
    let first = normalized(first);
    let second = normalized(second);
    let original_brightness = brightness(first).max(brightness(second));

    let mut mixed = [0.0_f32; 3];
    for ((out, a), b) in mixed.iter_mut().zip(first).zip(second) {
        *out = a * (1.0 - amount) + b * amount;
    }

    let new_brightness = brightness(mixed);
    if new_brightness > 0.0 && new_brightness < original_brightness {
        let scale = original_brightness / new_brightness;
        for channel in &mut mixed {
            *channel *= scale;
        }
    }

    let [r, g, b] = mixed.map(|channel| (channel.clamp(0.0, 1.0) * 255.0) as u8);
    Rgb::new(r, g, b)
}

fn normalized(rgb: Rgb) -> [f32; 3] {
    [rgb.r, rgb.g, rgb.b].map(|channel| f32::from(channel) / 255.0)
}

fn brightness(channels: [f32; 3]) -> f32 {
    channels[0].max(channels[1]).max(channels[2])
}

// `f32::abs` needs std on older toolchains.
const fn abs(value: f32) -> f32 {
    if value < 0.0 { -value } else { value }
}

/// Convert colors to [`Rgb`] for frame encoding.
pub trait ToRgb {
    /// Convert this color to [`Rgb`].
    #[must_use]
    fn to_rgb(self) -> Rgb;
}

impl ToRgb for Rgb {
    #[inline(always)]
    fn to_rgb(self) -> Rgb {
        self
    }
}

impl ToRgb for Rgb888 {
    #[inline(always)]
    fn to_rgb(self) -> Rgb {
        Rgb::new(self.r(), self.g(), self.b())
    }
}

impl ToRgb for u32 {
    #[inline(always)]
    fn to_rgb(self) -> Rgb {
        rgb_from_u32(self)
    }
}

/// Convert colors to [`Rgb888`] for embedded-graphics rendering.
pub trait ToRgb888 {
    /// Convert this color to [`Rgb888`].
    #[must_use]
    fn to_rgb888(self) -> Rgb888;
}

impl ToRgb888 for Rgb {
    #[inline(always)]
    fn to_rgb888(self) -> Rgb888 {
        Rgb888::new(self.r, self.g, self.b)
    }
}

impl ToRgb888 for Rgb888 {
    #[inline(always)]
    fn to_rgb888(self) -> Rgb888 {
        self
    }
}
