// Tunable post-processing and generation parameters.
//
// `Settings` is loaded once at startup from an optional JSON file and is
// read-only afterwards; concurrent requests share it by reference. Every
// field has a default, so a config file only needs the keys it overrides.
//
// Stages never read `Settings` directly. They take the small parameter
// values derived here (`VelocityBounds`, `HumanizeParams`, the grid and the
// swing ratio) so each stage can be called and tested on its own.

use crate::error::{Error, Result};
use crate::humanize::HumanizeParams;
use crate::note::VelocityBounds;
use crate::quantize::DEFAULT_GRID;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Quantization grid in beats. 0.25 is a sixteenth note.
    pub quantize_grid: f64,
    /// Swing ratio: 0.5 is straight, 0.66 standard, 0.75 hard swing.
    pub swing_ratio: f64,
    /// Timing jitter bound in beats (~15ms at 120 BPM).
    pub humanize_timing: f64,
    /// Velocity jitter bound (+/-).
    pub humanize_velocity: u8,
    pub velocity_min: u8,
    pub velocity_max: u8,

    pub default_tempo: u32,
    pub default_bars: u32,
    pub default_primer_bars: u32,
    pub default_temperature: f64,

    /// Directory `.mid` files are written to.
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            quantize_grid: DEFAULT_GRID,
            swing_ratio: 0.66,
            humanize_timing: 0.015,
            humanize_velocity: 8,
            velocity_min: 40,
            velocity_max: 120,
            default_tempo: 120,
            default_bars: 8,
            default_primer_bars: 2,
            default_temperature: 0.9,
            output_dir: PathBuf::from("output"),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file and validate them.
    pub fn load(path: &Path) -> Result<Settings> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Settings::from_json(&text)
    }

    /// Parse settings from JSON text and validate them.
    pub fn from_json(text: &str) -> Result<Settings> {
        let settings: Settings =
            serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        settings.validate()
    }

    /// Reject unusable values and normalize the velocity range.
    pub fn validate(mut self) -> Result<Settings> {
        if !(self.quantize_grid.is_normal() && self.quantize_grid > 0.0) {
            return Err(Error::Config(format!(
                "quantize_grid must be a positive normal number, got {}",
                self.quantize_grid
            )));
        }
        if !(self.swing_ratio.is_finite() && (0.0..1.0).contains(&self.swing_ratio)) {
            return Err(Error::Config(format!(
                "swing_ratio must be in [0, 1), got {}",
                self.swing_ratio
            )));
        }
        if !(self.humanize_timing.is_finite() && self.humanize_timing >= 0.0) {
            return Err(Error::Config(format!(
                "humanize_timing must be non-negative, got {}",
                self.humanize_timing
            )));
        }
        let bounds = VelocityBounds::new(self.velocity_min, self.velocity_max);
        self.velocity_min = bounds.min();
        self.velocity_max = bounds.max();
        Ok(self)
    }

    pub fn velocity_bounds(&self) -> VelocityBounds {
        VelocityBounds::new(self.velocity_min, self.velocity_max)
    }

    pub fn humanize_params(&self) -> HumanizeParams {
        HumanizeParams {
            timing: self.humanize_timing,
            velocity: self.humanize_velocity,
        }
    }
}
