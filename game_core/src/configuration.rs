use std::path::Path;

use getset::{CopyGetters, Getters, Setters};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::PerturbMode;
use crate::difficulty::DifficultyCurve;
use crate::grid::MAX_GRID_SIZE;
use crate::render::{canvas_side, MAX_CANVAS_SIZE};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse configuration: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration value for [{field}]: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// How a level maps to the side length of the grid.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "camelCase")]
pub enum GridSizing {
    /// The grid is `level`×`level` and keeps growing.
    #[default]
    Unbounded,
    /// The grid side cycles through `min..=max` as the level climbs.
    Cyclic { min: u32, max: u32 },
}

/// How the odd block's color is derived from the base color.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum ColorDiffMode {
    Lighten,
    Darken,
    #[default]
    RandomDirection,
    /// Shift hue, saturation and value by level-scaled amounts.
    HsvShift,
}

impl ColorDiffMode {
    pub fn perturb_mode(self) -> Option<PerturbMode> {
        match self {
            ColorDiffMode::Lighten => Some(PerturbMode::Lighten),
            ColorDiffMode::Darken => Some(PerturbMode::Darken),
            ColorDiffMode::RandomDirection => Some(PerturbMode::RandomDirection),
            ColorDiffMode::HsvShift => None,
        }
    }
}

#[derive(Clone, Debug, CopyGetters, Getters, Setters, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfiguration {
    #[getset(get_copy = "pub", set = "pub")]
    initial_level: u32,
    #[getset(get_copy = "pub", set = "pub")]
    block_size: u32,
    #[getset(get_copy = "pub", set = "pub")]
    spacing: u32,
    /// Zero means guesses never time out.
    #[getset(get_copy = "pub", set = "pub")]
    guess_time_limit_seconds: u64,
    #[getset(get_copy = "pub", set = "pub")]
    color_diff_magnitude_percent: f64,
    #[getset(get_copy = "pub", set = "pub")]
    min_color_diff_magnitude_percent: f64,
    #[getset(get_copy = "pub", set = "pub")]
    color_diff_decay: f64,
    #[getset(get_copy = "pub", set = "pub")]
    color_diff_mode: ColorDiffMode,
    #[getset(get_copy = "pub", set = "pub")]
    grid_sizing: GridSizing,
    #[getset(get_copy = "pub", set = "pub")]
    compress_images: bool,
    /// Only used when `compress_images` is set.
    #[getset(get_copy = "pub", set = "pub")]
    image_quality: u8,
    #[getset(get_copy = "pub", set = "pub")]
    passive_guess_enabled: bool,
    #[getset(get_copy = "pub", set = "pub")]
    interrupt_on_trigger: bool,
    #[getset(get_copy = "pub", set = "pub")]
    leaderboard_size: usize,
    #[getset(get = "pub", set = "pub")]
    command_prefix: String,
}

impl Default for GameConfiguration {
    fn default() -> Self {
        GameConfiguration {
            initial_level: 2,
            block_size: 50,
            spacing: 10,
            guess_time_limit_seconds: 0,
            color_diff_magnitude_percent: 30.0,
            min_color_diff_magnitude_percent: 3.0,
            color_diff_decay: 0.1,
            color_diff_mode: ColorDiffMode::default(),
            grid_sizing: GridSizing::default(),
            compress_images: false,
            image_quality: 80,
            passive_guess_enabled: true,
            interrupt_on_trigger: true,
            leaderboard_size: 10,
            command_prefix: "see-color".to_string(),
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

impl GameConfiguration {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: GameConfiguration = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        log::info!("Loading configuration from {path:?}");
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_level < 1 {
            return Err(invalid("initialLevel", "must be at least 1"));
        }
        if self.grid_sizing == GridSizing::Unbounded && self.initial_level > MAX_GRID_SIZE {
            return Err(invalid("initialLevel", format!("must be at most {MAX_GRID_SIZE}")));
        }
        if self.block_size < 1 {
            return Err(invalid("blockSize", "must be at least 1 pixel"));
        }
        if !(1..=100).contains(&self.image_quality) {
            return Err(invalid("imageQuality", "must be within 1..=100"));
        }
        if !self.color_diff_magnitude_percent.is_finite() || self.color_diff_magnitude_percent < 0.0 {
            return Err(invalid("colorDiffMagnitudePercent", "must be a non-negative number"));
        }
        if !self.min_color_diff_magnitude_percent.is_finite()
            || self.min_color_diff_magnitude_percent < 0.0
        {
            return Err(invalid("minColorDiffMagnitudePercent", "must be a non-negative number"));
        }
        if !self.color_diff_decay.is_finite() || self.color_diff_decay < 0.0 {
            return Err(invalid("colorDiffDecay", "must be a non-negative number"));
        }
        if let GridSizing::Cyclic { min, max } = self.grid_sizing {
            if min < 1 || min > max {
                return Err(invalid("gridSizing", format!("needs 1 <= min <= max, got {min}..={max}")));
            }
            if max > MAX_GRID_SIZE {
                return Err(invalid("gridSizing", format!("max must be at most {MAX_GRID_SIZE}")));
            }
        }
        if self.leaderboard_size < 1 {
            return Err(invalid("leaderboardSize", "must be at least 1"));
        }
        if self.command_prefix.trim().is_empty() {
            return Err(invalid("commandPrefix", "must not be blank"));
        }
        let first_grid = DifficultyCurve::from_config(self).grid_size(self.initial_level);
        if canvas_side(first_grid, self.block_size, self.spacing).is_none() {
            return Err(invalid(
                "blockSize",
                format!("a {first_grid}×{first_grid} grid would be wider than {MAX_CANVAS_SIZE}px"),
            ));
        }
        Ok(())
    }

    /// Builder-style tweak, mostly for tests and embedding.
    pub fn with(mut self, tweak: impl FnOnce(&mut Self)) -> Self {
        tweak(&mut self);
        self
    }
}
