use core::f64::consts::PI;

use crate::waveform_insight::error::{Result, WaveformError};
use crate::waveform_insight::filter::ButterworthLowpass;
use crate::waveform_insight::types::{FrequencyConfig, FrequencyEstimate};

/*
* @brief Find the negative-to-positive zero crossings of a signal.
* @param signal Signal buffer
* @return Fractional sample index of every crossing
* @note The exact position is found by linear interpolation between the two samples.
*/
pub fn find_zero_crossings(signal: &[f64]) -> Vec<f64> {
    signal
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[0] < 0.0 && pair[1] >= 0.0)
        .map(|(p, pair)| p as f64 - pair[0] / (pair[1] - pair[0]))
        .collect()
}

/*
* @brief Estimate the frequency of a signal from its zero crossings.
* @param time Time vector of the capture (only time[0] is used)
* @param signal Signal buffer
* @param fs Sampling frequency in Hz
* @return Average and per-cycle frequency
* @note Uses a 4th order Butterworth low-pass with its corner at 60 Hz.
*/
pub fn freq_from_crossings(time: &[f64], signal: &[f64], fs: f64) -> Result<FrequencyEstimate> {
    freq_from_crossings_with(&FrequencyConfig::default(), time, signal, fs)
}

/*
* @brief Estimate the frequency of a signal from its zero crossings.
* @param config Low-pass order and corner frequency
* @param time Time vector of the capture (only time[0] is used)
* @param signal Signal buffer
* @param fs Sampling frequency in Hz
* @return Average and per-cycle frequency
* @note The signal must cross zero once per cycle. Harmonics or noise that survive
*       the low-pass and add crossings show up as spurious high frequencies.
*/
pub fn freq_from_crossings_with(
    config: &FrequencyConfig,
    time: &[f64],
    signal: &[f64],
    fs: f64,
) -> Result<FrequencyEstimate> {
    if signal.is_empty() {
        return Err(WaveformError::EmptySignal);
    }
    if time.len() != signal.len() {
        return Err(WaveformError::LengthMismatch {
            what: "time vs signal",
            left: time.len(),
            right: signal.len(),
        });
    }
    if !(fs > 0.0) || !fs.is_finite() {
        return Err(WaveformError::InvalidSamplingRate(fs));
    }

    // wn is normalised to Nyquist
    let wn = (2.0 * PI * config.corner_frequency_hz) / fs;
    let filter = ButterworthLowpass::new(config.filter_order, wn)?;
    let filtered = filter.filtfilt(signal)?;

    let crossings = find_zero_crossings(&filtered);
    if crossings.len() < 2 {
        return Err(WaveformError::InsufficientCrossings(crossings.len()));
    }

    let crossing_times: Vec<f64> = crossings.iter().map(|c| time[0] + c / fs).collect();

    let time_steps: Vec<f64> = crossings.windows(2).map(|c| c[1] - c[0]).collect();
    let avg_step = time_steps.iter().sum::<f64>() / time_steps.len() as f64;
    let avg_freq = fs / avg_step;

    let freqs: Vec<f64> = time_steps.iter().map(|step| fs / step).collect();
    let freq_times: Vec<f64> = crossing_times
        .windows(2)
        .take(freqs.len() - 1)
        .map(|c| (c[0] + c[1]) / 2.0)
        .collect();

    log::debug!(
        "Zero crossing frequency: {:.4} Hz from {} crossings",
        avg_freq,
        crossings.len()
    );

    Ok(FrequencyEstimate {
        avg_freq,
        freqs,
        freq_times,
        crossing_times,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(freq: f64, fs: f64, seconds: f64) -> (Vec<f64>, Vec<f64>) {
        let samples = (fs * seconds) as usize;
        let time: Vec<f64> = (0..samples).map(|n| n as f64 / fs).collect();
        let signal = time.iter().map(|t| 170.0 * (2.0 * PI * freq * t).sin()).collect();
        (time, signal)
    }

    #[test]
    fn recovers_60_hz() {
        let (time, signal) = capture(60.0, 10_000.0, 1.0);
        let estimate = freq_from_crossings(&time, &signal, 10_000.0).unwrap();
        assert!((estimate.avg_freq - 60.0).abs() < 0.05, "{}", estimate.avg_freq);
        assert_eq!(estimate.freqs.len(), estimate.crossing_times.len() - 1);
        assert_eq!(estimate.freq_times.len(), estimate.freqs.len() - 1);
        for f in &estimate.freqs {
            assert!((f - 60.0).abs() < 0.5, "{f}");
        }
    }

    #[test]
    fn recovers_off_nominal_frequency() {
        let (time, signal) = capture(59.5, 10_000.0, 1.0);
        let estimate = freq_from_crossings(&time, &signal, 10_000.0).unwrap();
        assert!((estimate.avg_freq - 59.5).abs() < 0.05, "{}", estimate.avg_freq);
    }

    #[test]
    fn crossing_times_are_offset_by_start_time() {
        let fs = 10_000.0;
        let (time, signal) = capture(60.0, fs, 0.5);
        let shifted: Vec<f64> = time.iter().map(|t| t + 2.0).collect();
        let a = freq_from_crossings(&time, &signal, fs).unwrap();
        let b = freq_from_crossings(&shifted, &signal, fs).unwrap();
        for (ta, tb) in a.crossing_times.iter().zip(b.crossing_times.iter()) {
            assert!((tb - ta - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn dc_signal_has_insufficient_crossings() {
        let time: Vec<f64> = (0..1_000).map(|n| n as f64 / 10_000.0).collect();
        let err = freq_from_crossings(&time, &vec![5.0; 1_000], 10_000.0).unwrap_err();
        assert!(matches!(err, WaveformError::InsufficientCrossings(0)));
    }

    #[test]
    fn low_sampling_rate_gives_invalid_cutoff() {
        let (time, signal) = capture(60.0, 300.0, 1.0);
        let err = freq_from_crossings(&time, &signal, 300.0).unwrap_err();
        assert!(matches!(err, WaveformError::InvalidCutoff(_)));
    }

    #[test]
    fn interpolates_crossing_between_samples() {
        let crossings = find_zero_crossings(&[-1.0, 3.0, 2.0, -2.0, -1.0, 1.0]);
        assert_eq!(crossings, vec![0.25, 4.5]);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let (time, signal) = capture(60.0, 10_000.0, 0.5);
        let a = freq_from_crossings(&time, &signal, 10_000.0).unwrap();
        let b = freq_from_crossings(&time, &signal, 10_000.0).unwrap();
        assert_eq!(a, b);
    }
}
