use getset::CopyGetters;

use crate::color::{self, hsv_to_color, Color, PerturbMode};
use crate::configuration::ColorDiffMode;
use crate::difficulty::{DifficultyCurve, HsvRanges};
use crate::grid::{self, Reveal};
use crate::random::RandomSource;

/// One freshly generated grid: its size, its two colors and which block is odd.
#[derive(Clone, Copy, Debug, CopyGetters, Eq, PartialEq)]
#[getset(get_copy = "pub")]
pub struct Round {
    level: u32,
    grid_size: u32,
    /// Zero-based index of the block painted with `diff`.
    target: u32,
    base: Color,
    diff: Color,
}

impl Round {
    pub fn new(level: u32, grid_size: u32, target: u32, base: Color, diff: Color) -> Self {
        Round {
            level,
            grid_size,
            target,
            base,
            diff,
        }
    }

    /// Rolls a round for `level`.
    ///
    /// The target block is drawn first, then the base color, then whatever the
    /// difference mode needs.
    pub fn generate(
        level: u32,
        curve: &DifficultyCurve,
        mode: ColorDiffMode,
        rng: &mut dyn RandomSource,
    ) -> Self {
        let grid_size = curve.grid_size(level);
        let target = grid::pick_differing_block(grid_size, rng);

        let hue = rng.between(0.0, 360.0);
        let sat = rng.between(0.2, 1.0);
        let val = rng.between(0.2, 1.0);
        let base = hsv_to_color(hue, sat, val);

        let magnitude = curve.color_delta_magnitude(level);
        let diff = match mode.perturb_mode() {
            Some(perturb_mode) => color::perturb(base, magnitude, perturb_mode, rng),
            None => {
                let shifted = hsv_shift(hue, sat, val, curve.hsv_ranges(level), rng);
                if shifted == base {
                    log::debug!("HSV shift of {base} rounded back onto itself, perturbing instead");
                    color::perturb(base, magnitude, PerturbMode::RandomDirection, rng)
                } else {
                    shifted
                }
            },
        };
        log::debug!(
            "Generated level {level} round: {grid_size}x{grid_size}, base {base}, diff {diff}, target {}",
            target + 1
        );
        Round::new(level, grid_size, target, base, diff)
    }

    pub fn reveal(&self) -> Reveal {
        Reveal::of(self.grid_size, self.target)
    }

    /// Color of the zero-based block `index0`.
    pub fn color_of(&self, index0: u32) -> Color {
        if index0 == self.target {
            self.diff
        } else {
            self.base
        }
    }
}

/// Splits a difficulty budget between hue, saturation and value and shifts the
/// base color by it, staying inside the valid HSV box.
fn hsv_shift(hue: f64, sat: f64, val: f64, ranges: HsvRanges, rng: &mut dyn RandomSource) -> Color {
    let factor_h = rng.unit() * 0.3 + 0.1;
    let residue = 1.0 - factor_h;
    let factor_s = rng.unit() * residue * 0.6 + residue * 0.2;
    let factor_v = residue - factor_s;

    let mut delta_s = factor_s * ranges.saturation;
    if delta_s + sat > 1.0 {
        delta_s = -delta_s;
    } else if delta_s <= sat {
        delta_s *= rng.sign();
    }
    let mut delta_v = factor_v * ranges.value;
    if delta_v + val > 1.0 {
        delta_v = -delta_v;
    } else if delta_v <= val {
        delta_v *= rng.sign();
    }

    // Hue shifts are less visible on vivid, bright colors, so they shrink there.
    let weight = sat + val + delta_s / 2.0 + delta_v / 2.0;
    let delta_h = factor_h * ranges.hue * rng.sign() / weight;
    hsv_to_color(hue + delta_h, sat + delta_s, val + delta_v)
}
