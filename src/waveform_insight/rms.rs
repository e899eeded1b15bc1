use crate::waveform_insight::error::{Result, WaveformError};
use crate::waveform_insight::types::RmsSeries;

/*
* @brief Calculate the mean of the sample-by-sample product of two signals.
* @param signal1 First signal
* @param signal2 Second signal
* @return Mean of signal1[i] * signal2[i] over the common length
* @note With the same signal twice this is the mean square, with V and I it is the average active power.
*/
pub fn calculate_signal_power(signal1: &[f64], signal2: &[f64]) -> f64 {
    let length = signal1.len().min(signal2.len());
    if length == 0 {
        return 0.0;
    }

    let square: f64 = signal1
        .iter()
        .zip(signal2.iter())
        .map(|(s1, s2)| s1 * s2)
        .sum();

    square / length as f64
}

/*
* @brief Calculate the RMS value of a signal.
* @param signal Signal buffer
* @return sqrt(mean(x^2)), 0.0 for an empty buffer
* @note No DC component is removed.
*/
pub fn calculate_rms(signal: &[f64]) -> f64 {
    let power = calculate_signal_power(signal, signal);

    if power > 0.0 {
        power.sqrt()
    } else {
        0.0
    }
}

/*
* @brief Calculate the time-varying RMS of a signal with a sliding window.
* @param data Signal buffer
* @param window_ms Duration of the analysis window in milliseconds (>= 1)
* @param sampling_frequency Sampling frequency in Hz
* @param overlap_ms Overlap between consecutive windows in milliseconds (< window_ms)
* @return RMS series, one point every (window_ms - overlap_ms) ms starting at t = 0
* @note Windows are centred on t. The window at t = 0 starts before the buffer, so
*       it is cut at sample 0 and only holds half a window; see `drop_first_point`.
* @note The right edge is clamped to len - 1, which leaves the last sample out.
* @note EmptyWindow is judged on the unclamped edges. A window lying entirely
*       before sample 0 gives an RMS of 0.0.
*/
pub fn calculate_rms_of_signal(
    data: &[f64],
    window_ms: f64,
    sampling_frequency: f64,
    overlap_ms: f64,
) -> Result<RmsSeries> {
    if !(window_ms >= 1.0) {
        return Err(WaveformError::InvalidWindowSize(window_ms));
    }
    if overlap_ms >= window_ms {
        return Err(WaveformError::InvalidOverlap {
            overlap: overlap_ms,
            window: window_ms,
        });
    }
    if !(sampling_frequency > 0.0) || !sampling_frequency.is_finite() {
        return Err(WaveformError::InvalidSamplingRate(sampling_frequency));
    }
    if data.is_empty() {
        return Err(WaveformError::EmptySignal);
    }

    let num_frames = data.len() as i64;
    let duration = data.len() as f64 / sampling_frequency;
    let read_progress = (window_ms - overlap_ms) / 1000.0;
    let output_size = (duration / read_progress).floor() as usize;
    let half_window = window_ms / 2000.0;
    let window_frames = (window_ms * sampling_frequency / 1000.0).floor() as i64;

    let mut series = RmsSeries {
        time: Vec::with_capacity(output_size),
        rms: Vec::with_capacity(output_size),
    };

    for idx in 0..output_size {
        let t = idx as f64 * read_progress;
        let left = ((t - half_window) * sampling_frequency).floor() as i64;
        let right = (left + window_frames).min(num_frames - 1);
        if right - left <= 0 {
            return Err(WaveformError::EmptyWindow { time: t });
        }

        // Clamp to the buffer after the length check
        let left = left.max(0);
        let right = right.max(left);

        series.time.push(t);
        series.rms.push(calculate_rms(&data[left as usize..right as usize]));
    }

    log::debug!(
        "Sliding RMS: {} points, window {} ms, hop {} ms",
        series.len(),
        window_ms,
        read_progress * 1000.0
    );

    Ok(series)
}

/*
* @brief Drop the first point of an RMS series.
* @param series RMS series from `calculate_rms_of_signal`
* @return The series without its half-window first point
* @note Call-site post-processing, the sliding RMS itself never drops anything.
*/
pub fn drop_first_point(mut series: RmsSeries) -> RmsSeries {
    if !series.is_empty() {
        series.time.remove(0);
        series.rms.remove(0);
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(amplitude: f64, freq: f64, fs: f64, samples: usize) -> Vec<f64> {
        (0..samples)
            .map(|n| amplitude * (2.0 * PI * freq * n as f64 / fs).sin())
            .collect()
    }

    #[test]
    fn rms_of_sine_is_amplitude_over_sqrt2() {
        // 10 full cycles, 200 samples per cycle
        let data = sine(120.0, 60.0, 12_000.0, 2_000);
        let rms = calculate_rms(&data);
        let expected = 120.0 / 2f64.sqrt();
        assert!((rms - expected).abs() / expected < 1e-2, "rms = {rms}");
    }

    #[test]
    fn rms_keeps_dc_component() {
        let data = vec![3.0; 50];
        assert!((calculate_rms(&data) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn rms_of_empty_is_zero() {
        assert_eq!(calculate_rms(&[]), 0.0);
    }

    #[test]
    fn signal_power_of_in_phase_sines() {
        let v = sine(120.0, 60.0, 6_000.0, 100);
        let i = sine(10.0, 60.0, 6_000.0, 100);
        assert!((calculate_signal_power(&v, &i) - 600.0).abs() < 1e-9);
    }

    #[test]
    fn sliding_rms_point_count() {
        let fs = 1_000.0;
        let data = sine(1.0, 60.0, fs, 1_000);
        let series = calculate_rms_of_signal(&data, 50.0, fs, 0.0).unwrap();
        let expected = ((1_000.0 / fs) / (50.0 / 1000.0)).floor() as usize;
        assert_eq!(series.len(), expected);
        assert_eq!(series.time.len(), series.rms.len());
        assert_eq!(series.time[0], 0.0);
    }

    #[test]
    fn sliding_rms_tracks_amplitude() {
        let fs = 24_000.0;
        let data = sine(240.0 * 2f64.sqrt(), 60.0, fs, 24_000);
        let window = 1000.0 / 60.0;
        let series = drop_first_point(calculate_rms_of_signal(&data, window, fs, 5.0).unwrap());
        // Skip the tail where the window is clamped to the end of the buffer
        for &rms in &series.rms[..series.len() - 2] {
            assert!((rms - 240.0).abs() < 2.0, "rms = {rms}");
        }
    }

    #[test]
    fn sliding_rms_rejects_small_window() {
        let err = calculate_rms_of_signal(&[1.0; 10], 0.5, 1_000.0, 0.0).unwrap_err();
        assert!(matches!(err, WaveformError::InvalidWindowSize(_)));
    }

    #[test]
    fn sliding_rms_rejects_overlap_not_below_window() {
        let err = calculate_rms_of_signal(&[1.0; 10], 10.0, 1_000.0, 10.0).unwrap_err();
        assert!(matches!(err, WaveformError::InvalidOverlap { .. }));
    }

    #[test]
    fn one_sample_window_at_start_is_accepted() {
        // 1.2 ms at 1 kHz: the first window covers sample -1 only
        let series = calculate_rms_of_signal(&[1.0; 100], 1.2, 1_000.0, 0.0).unwrap();
        assert_eq!(series.len(), ((100.0_f64 / 1_000.0) / (1.2 / 1000.0)).floor() as usize);
        assert_eq!(series.rms[0], 0.0);
        assert!(series.rms[1..].iter().all(|&rms| rms == 1.0));
    }

    #[test]
    fn sliding_rms_reports_empty_window() {
        // 100 Hz sampling leaves no sample inside a 2 ms window
        let err = calculate_rms_of_signal(&[1.0; 100], 2.0, 100.0, 0.0).unwrap_err();
        match err {
            WaveformError::EmptyWindow { time } => assert_eq!(time, 0.0),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn drop_first_point_removes_one_pair() {
        let series = RmsSeries {
            time: vec![0.0, 0.1, 0.2],
            rms: vec![9.0, 1.0, 1.0],
        };
        let dropped = drop_first_point(series);
        assert_eq!(dropped.time, vec![0.1, 0.2]);
        assert_eq!(dropped.rms, vec![1.0, 1.0]);
        assert!(drop_first_point(RmsSeries::default()).is_empty());
    }
}
