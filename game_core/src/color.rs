use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::random::RandomSource;

/// Attempts [perturb] makes before giving up on a nearby color.
pub const PERTURB_MAX_ATTEMPTS: usize = 100;

/// An opaque 24-bit display color, written `#rrggbb`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("[{0}] is not a color, expected #rrggbb")]
pub struct ColorParseError(String);

/// Direction in which [perturb] pushes each channel.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum PerturbMode {
    Lighten,
    Darken,
    RandomDirection,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(0xff, 0xff, 0xff);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    pub const fn from_u32(rgb: u32) -> Self {
        Color::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    pub const fn to_u32(self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    pub const fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    pub const fn from_channels([r, g, b]: [u8; 3]) -> Self {
        Color::new(r, g, b)
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ColorParseError(s.to_string());
        let hex = s.strip_prefix('#').unwrap_or(s);
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(err());
        }
        match hex.len() {
            6 => u32::from_str_radix(hex, 16)
                .map(Color::from_u32)
                .map_err(|_| err()),
            3 => {
                let short = u32::from_str_radix(hex, 16).map_err(|_| err())?;
                let widen = |nibble: u32| (nibble & 0xf) as u8 * 0x11;
                Ok(Color::new(widen(short >> 8), widen(short >> 4), widen(short)))
            },
            _ => Err(err()),
        }
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Scales a unit channel to a byte the way the grid page does: `floor(x * 256)`,
/// saturating at both ends.
fn unit_to_byte(scale: f64) -> u8 {
    let scaled = scale * 256.0;
    if scaled > 255.0 {
        0xff
    } else if scaled < 0.0 || scaled.is_nan() {
        0
    } else {
        scaled.floor() as u8
    }
}

/// Standard HSV to RGB conversion.
///
/// Saturation and value are clamped to `[0, 1]`. Hue is taken modulo 360.
pub fn hsv_to_color(hue: f64, sat: f64, val: f64) -> Color {
    let hue = if hue.is_finite() {
        hue.rem_euclid(360.0)
    } else {
        0.0
    };
    let sat = sat.clamp(0.0, 1.0);
    let val = val.clamp(0.0, 1.0);

    let chroma = val * sat;
    let hh = hue / 60.0;
    let m = val - chroma;
    let x = chroma * (1.0 - (hh % 2.0 - 1.0).abs()) + m;
    let c = chroma + m;

    let (r, g, b) = match hh.floor() as u8 {
        0 => (c, x, m),
        1 => (x, c, m),
        2 => (m, c, x),
        3 => (m, x, c),
        4 => (x, m, c),
        _ => (c, m, x),
    };
    Color::new(unit_to_byte(r), unit_to_byte(g), unit_to_byte(b))
}

fn lighten(channel: u8, factor: f64) -> u8 {
    (channel as f64 * factor).round().min(255.0) as u8
}

fn darken(channel: u8, factor: f64) -> u8 {
    (channel as f64 / factor).round().max(0.0) as u8
}

/// Produces a color near `base` that is not `base`.
///
/// Each attempt draws one factor `1 + U(0,1) * magnitude_percent / 200` and
/// applies it to all three channels according to `mode`. If
/// [PERTURB_MAX_ATTEMPTS] attempts all land back on `base`, the result is a
/// uniformly random color other than `base`.
pub fn perturb(
    base: Color,
    magnitude_percent: f64,
    mode: PerturbMode,
    rng: &mut dyn RandomSource,
) -> Color {
    let magnitude = magnitude_percent.max(0.0);
    for _ in 0..PERTURB_MAX_ATTEMPTS {
        let factor = 1.0 + rng.unit() * (magnitude / 200.0);
        let channels = base.channels().map(|channel| match mode {
            PerturbMode::Lighten => lighten(channel, factor),
            PerturbMode::Darken => darken(channel, factor),
            PerturbMode::RandomDirection => {
                if rng.unit() < 0.5 {
                    lighten(channel, factor)
                } else {
                    darken(channel, factor)
                }
            },
        });
        let candidate = Color::from_channels(channels);
        if candidate != base {
            return candidate;
        }
    }
    log::warn!(
        "No distinct color near {base} after {PERTURB_MAX_ATTEMPTS} attempts at {magnitude_percent}%, using a random one"
    );
    random_color_except(base, rng)
}

/// Uniform over every 24-bit color except `excluded`.
pub fn random_color_except(excluded: Color, rng: &mut dyn RandomSource) -> Color {
    let drawn = rng.below(0xff_ffff);
    let excluded = excluded.to_u32();
    Color::from_u32(if drawn >= excluded { drawn + 1 } else { drawn })
}
