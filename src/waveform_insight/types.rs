use std::collections::BTreeMap;

use num_complex::Complex;

pub const FREQ_NOMINAL_50: f64 = 50.0;
pub const FREQ_NOMINAL_60: f64 = 60.0;

/// Orders 0..=40, the range IEEE 1547.1 asks for.
pub const MAX_HARMONIC_ORDER: usize = 41;

pub const BUTTERWORTH_ORDER: usize = 4;

pub const TIME_CHANNELS: [&str; 2] = ["Time", "TIME"];
pub const VOLTAGE_CHANNEL_PREFIX: &str = "AC_V_";
pub const CURRENT_CHANNEL_PREFIX: &str = "AC_I_";

/// How the analyzer locates the fundamental bin in the spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FundamentalBinMode {
    /// A bin must land exactly on the nominal frequency.
    #[default]
    Strict,
    /// Use the bin closest to the nominal frequency.
    Nearest,
}

/// Harmonic analysis configuration
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarmonicConfig {
    pub nominal_frequency_hz: f64,       // Grid frequency of the fundamental
    pub max_harmonic_order: usize,       // Number of spectrum bins examined, starting at DC
    pub fundamental_bin: FundamentalBinMode,
}

impl Default for HarmonicConfig {
    fn default() -> Self {
        Self {
            nominal_frequency_hz: FREQ_NOMINAL_60,
            max_harmonic_order: MAX_HARMONIC_ORDER,
            fundamental_bin: FundamentalBinMode::Strict,
        }
    }
}

/// Zero-crossing frequency estimator configuration
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrequencyConfig {
    pub filter_order: usize,
    pub corner_frequency_hz: f64, // wn = 2*pi*corner/fs, normalised to Nyquist
}

impl Default for FrequencyConfig {
    fn default() -> Self {
        Self {
            filter_order: BUTTERWORTH_ORDER,
            corner_frequency_hz: FREQ_NOMINAL_60,
        }
    }
}

/// Sliding RMS window, both values in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SlidingRmsConfig {
    pub window_ms: f64,
    pub overlap_ms: f64,
}

impl Default for SlidingRmsConfig {
    fn default() -> Self {
        let window_ms = 1000.0 / FREQ_NOMINAL_60;
        Self {
            window_ms,
            overlap_ms: (window_ms / 3.0).trunc(),
        }
    }
}

/// Voltage ride-through trip timing parameters
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RideThroughConfig {
    pub grid_frequency_hz: f64,
    pub cycles_in_window: f64,
    pub sampling_frequency_hz: f64, // DAQ rate of the capture
    pub nominal_voltage: f64,
    pub voltage_window: f64,        // Event starts when RMS leaves nominal +/- this
    pub trip_threshold: f64,        // RMS current at or below this means tripped
    pub trigger_threshold: f64,
}

impl RideThroughConfig {
    pub fn window_ms(&self) -> f64 {
        self.cycles_in_window * (1.0 / self.grid_frequency_hz) * 1000.0
    }

    pub fn overlap_ms(&self) -> f64 {
        (self.window_ms() / 3.0).trunc()
    }
}

impl Default for RideThroughConfig {
    fn default() -> Self {
        Self {
            grid_frequency_hz: FREQ_NOMINAL_60,
            cycles_in_window: 1.0,
            sampling_frequency_hz: 24e3,
            nominal_voltage: 240.0,
            voltage_window: 20.0,
            trip_threshold: 3.0,
            trigger_threshold: 3.0,
        }
    }
}

/// Time-stamped RMS values, `time` and `rms` run in parallel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RmsSeries {
    pub time: Vec<f64>,
    pub rms: Vec<f64>,
}

impl RmsSeries {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.time.iter().copied().zip(self.rms.iter().copied())
    }
}

/// Per-cycle RMS of one phase, truncated to the shorter of the V and I series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseRms {
    pub time: Vec<f64>,
    pub voltage_rms: Vec<f64>,
    pub current_rms: Vec<f64>,
}

pub type PhaseRmsMap = BTreeMap<String, PhaseRms>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequencyEstimate {
    pub avg_freq: f64,
    pub freqs: Vec<f64>,          // One per pair of consecutive crossings
    pub freq_times: Vec<f64>,     // Midpoints between crossings, last pair dropped
    pub crossing_times: Vec<f64>, // Interpolated negative-to-positive crossings
}

/// One spectrum bin, scaled to a peak amplitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonicCoefficient {
    pub order: usize,
    pub complex_amplitude: Complex<f64>,
    pub magnitude: f64,
    pub phase: f64,
}

/// IEEE 1459 power quantities. Nonactive terms follow the generator sign convention.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PowerDecomposition {
    pub avg_p: f64, // Time-domain average active power, all harmonics included
    pub p0: f64,    // DC power
    pub p1: f64,    // Fundamental active power
    pub ph: f64,    // Nonfundamental active power
    pub q1: f64,    // Fundamental reactive power
    pub n: f64,     // Nonactive power
    pub di: f64,    // Current distortion power
    pub dv: f64,    // Voltage distortion power
    pub dh: f64,    // Harmonic distortion power
    pub s: f64,     // Combined apparent power
    pub s1: f64,    // Fundamental apparent power
    pub sn: f64,    // Nonfundamental apparent power
    pub sh: f64,    // Harmonic apparent power
    pub pf1: f64,
    pub pf: f64,
    pub harmonic_pollution: f64, // SN / S1
    pub thd_v: f64,
    pub thd_i: f64,
    pub fundamental_order: usize,
    pub voltage_harmonics: Vec<HarmonicCoefficient>,
    pub current_harmonics: Vec<HarmonicCoefficient>,
}

impl PowerDecomposition {
    /// `(avg_P, S, Q1, N, PF1)`
    pub fn summary(&self) -> (f64, f64, f64, f64, f64) {
        (self.avg_p, self.s, self.q1, self.n, self.pf1)
    }
}
