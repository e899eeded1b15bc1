//! TOML analysis configuration.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::waveform_insight::error::{Result, WaveformError};
use crate::waveform_insight::types::{
    FrequencyConfig, HarmonicConfig, RideThroughConfig, SlidingRmsConfig,
};

/// Analysis parameters for every stage, loaded from TOML.
///
/// Missing sections and fields fall back to the 60 Hz defaults. Unknown
/// fields are rejected.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub harmonics: HarmonicConfig,
    #[serde(default)]
    pub frequency: FrequencyConfig,
    #[serde(default)]
    pub sliding_rms: SlidingRmsConfig,
    #[serde(default)]
    pub ride_through: RideThroughConfig,
}

fn config_error(field: &str, message: impl Into<String>) -> WaveformError {
    WaveformError::Config {
        field: field.to_string(),
        message: message.into(),
    }
}

impl AnalysisConfig {
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            config_error("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| config_error("toml", e.to_string()))
    }

    /// Checks every section and returns all problems found.
    pub fn validate(&self) -> Vec<WaveformError> {
        let mut errors = Vec::new();

        let h = &self.harmonics;
        if !(h.nominal_frequency_hz > 0.0) {
            errors.push(config_error("harmonics.nominal_frequency_hz", "must be > 0"));
        }
        if h.max_harmonic_order < 2 {
            errors.push(config_error(
                "harmonics.max_harmonic_order",
                "must cover DC and the fundamental (>= 2)",
            ));
        }

        let f = &self.frequency;
        if !(1..=8).contains(&f.filter_order) {
            errors.push(config_error(
                "frequency.filter_order",
                format!("must be within 1 and 8, got {}", f.filter_order),
            ));
        }
        if !(f.corner_frequency_hz > 0.0) {
            errors.push(config_error("frequency.corner_frequency_hz", "must be > 0"));
        }

        let s = &self.sliding_rms;
        if !(s.window_ms >= 1.0) {
            errors.push(config_error("sliding_rms.window_ms", "must be >= 1 ms"));
        }
        if s.overlap_ms < 0.0 || s.overlap_ms >= s.window_ms {
            errors.push(config_error(
                "sliding_rms.overlap_ms",
                "must be >= 0 and < sliding_rms.window_ms",
            ));
        }

        let r = &self.ride_through;
        if !(r.grid_frequency_hz > 0.0) {
            errors.push(config_error("ride_through.grid_frequency_hz", "must be > 0"));
        }
        if !(r.cycles_in_window > 0.0) {
            errors.push(config_error("ride_through.cycles_in_window", "must be > 0"));
        } else if r.grid_frequency_hz > 0.0 && r.window_ms() < 1.0 {
            errors.push(config_error(
                "ride_through.cycles_in_window",
                "window must be >= 1 ms",
            ));
        }
        if !(r.sampling_frequency_hz > 0.0) {
            errors.push(config_error("ride_through.sampling_frequency_hz", "must be > 0"));
        }
        if r.voltage_window < 0.0 {
            errors.push(config_error("ride_through.voltage_window", "must be >= 0"));
        }
        if r.trip_threshold < 0.0 {
            errors.push(config_error("ride_through.trip_threshold", "must be >= 0"));
        }

        errors
    }
}
