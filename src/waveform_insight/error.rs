//! Error types for waveform analysis.

use thiserror::Error;

/// Result type for waveform analysis operations.
pub type Result<T> = std::result::Result<T, WaveformError>;

/// Errors that can occur while analysing a capture.
#[derive(Debug, Error)]
pub enum WaveformError {
    /// Sliding RMS window shorter than 1 ms.
    #[error("window size must not be below 1 ms, got {0} ms")]
    InvalidWindowSize(f64),

    /// Overlap not smaller than the window.
    #[error("overlap must not exceed window size (overlap {overlap} ms, window {window} ms)")]
    InvalidOverlap { overlap: f64, window: f64 },

    /// A computed RMS window had no samples.
    #[error("zero window size (t = {time} sec.)")]
    EmptyWindow { time: f64 },

    /// Named channel missing from the capture.
    #[error("channel not found: {0}")]
    ChannelNotFound(String),

    /// Paired buffers of different lengths.
    #[error("length mismatch: {what} ({left} vs {right})")]
    LengthMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },

    /// Fewer than two zero crossings.
    #[error("insufficient zero crossings: found {0}, need at least 2")]
    InsufficientCrossings(usize),

    /// No spectrum bin on the nominal frequency.
    #[error("no fundamental bin at {nominal} Hz (bin spacing {resolution} Hz)")]
    NoFundamentalBin { nominal: f64, resolution: f64 },

    #[error("signal is empty or too short")]
    EmptySignal,

    #[error("invalid sampling rate: {0} Hz")]
    InvalidSamplingRate(f64),

    /// Normalised filter cutoff outside (0, 1).
    #[error("invalid filter cutoff: wn = {0} (must be within 0 and 1)")]
    InvalidCutoff(f64),

    /// CSV row with the wrong number of fields.
    #[error("channel data error: line {line}")]
    ChannelData { line: usize },

    #[error("cannot parse value {value:?} at line {line}")]
    ParseValue { value: String, line: usize },

    /// Voltage RMS never left the nominal window.
    #[error("no voltage deviation in the waveform")]
    NoVoltageDeviation,

    /// Trigger channel never crossed its threshold.
    #[error("no daq trigger in the waveform")]
    NoTrigger,

    #[error("FFT error: {0}")]
    Fft(String),

    #[error("config error: {field} - {message}")]
    Config { field: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
