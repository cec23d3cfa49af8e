use crate::configuration::{GameConfiguration, GridSizing};
use crate::grid::MAX_GRID_SIZE;

/// Level-dependent rendering parameters.
///
/// Every curve here is non-increasing in level, so a higher level never
/// produces an easier color difference.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DifficultyCurve {
    sizing: GridSizing,
    base_magnitude: f64,
    floor_magnitude: f64,
    decay: f64,
}

/// Maximum hue, saturation and value shifts for [ColorDiffMode::HsvShift](crate::configuration::ColorDiffMode::HsvShift).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HsvRanges {
    pub hue: f64,
    pub saturation: f64,
    pub value: f64,
}

impl DifficultyCurve {
    pub fn new(sizing: GridSizing, base_magnitude: f64, floor_magnitude: f64, decay: f64) -> Self {
        DifficultyCurve {
            sizing,
            base_magnitude,
            floor_magnitude,
            decay,
        }
    }

    pub fn from_config(config: &GameConfiguration) -> Self {
        Self::new(
            config.grid_sizing(),
            config.color_diff_magnitude_percent(),
            config.min_color_diff_magnitude_percent(),
            config.color_diff_decay(),
        )
    }

    /// Side length of the grid played at `level`, at most [MAX_GRID_SIZE].
    pub fn grid_size(&self, level: u32) -> u32 {
        let size = match self.sizing {
            GridSizing::Unbounded => level,
            GridSizing::Cyclic { min, max } => {
                let range = max.saturating_sub(min).saturating_add(1);
                (level % range).saturating_add(min)
            },
        };
        size.clamp(1, MAX_GRID_SIZE)
    }

    /// Perturbation magnitude, in percent, for `level`.
    pub fn color_delta_magnitude(&self, level: u32) -> f64 {
        let decayed = self.base_magnitude * (-self.decay * level as f64).exp();
        decayed.max(self.floor_magnitude.min(self.base_magnitude))
    }

    pub fn hsv_ranges(&self, level: u32) -> HsvRanges {
        let level = level as f64;
        HsvRanges {
            hue: 30.0 * (-0.2 * level).exp(),
            saturation: 0.5 * (-0.1 * level).exp(),
            value: 0.2 * (-0.1 * level).exp(),
        }
    }
}

impl Default for DifficultyCurve {
    fn default() -> Self {
        Self::from_config(&GameConfiguration::default())
    }
}
