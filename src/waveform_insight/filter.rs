//! Zero-phase Butterworth low-pass filtering.
//!
//! The filter is designed digitally by bilinear transform of the analog
//! Butterworth prototype and realised as cascaded second-order sections,
//! which keeps the 4th order design used for zero-crossing detection well
//! conditioned at low normalised cutoffs.

use core::f64::consts::PI;
use num_complex::Complex;

use crate::waveform_insight::error::{Result, WaveformError};

/// Bilinear transform constant with the sample rate normalised to 2 (Nyquist = 1).
const BILINEAR_K: f64 = 4.0;

/// One second-order section in Direct Form II Transposed.
///
/// H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    b: [f64; 3],
    a: [f64; 2],
}

impl Biquad {
    pub fn new(b: [f64; 3], a: [f64; 2]) -> Self {
        Self { b, a }
    }

    pub fn numerator(&self) -> &[f64; 3] {
        &self.b
    }

    pub fn denominator(&self) -> &[f64; 2] {
        &self.a
    }

    /// Gain at z = 1.
    pub fn dc_gain(&self) -> f64 {
        (self.b[0] + self.b[1] + self.b[2]) / (1.0 + self.a[0] + self.a[1])
    }

    /// Poles inside the unit circle.
    pub fn is_stable(&self) -> bool {
        self.a[1].abs() < 1.0 && self.a[0].abs() < 1.0 + self.a[1]
    }

    /// State reached after a unit step has settled.
    fn step_state(&self) -> [f64; 2] {
        let gain = self.dc_gain();
        [gain - self.b[0], self.b[2] - self.a[1] * gain]
    }

    fn process(&self, samples: &mut [f64], mut state: [f64; 2]) {
        for sample in samples.iter_mut() {
            let input = *sample;
            let output = self.b[0] * input + state[0];
            state[0] = self.b[1] * input - self.a[0] * output + state[1];
            state[1] = self.b[2] * input - self.a[1] * output;
            *sample = output;
        }
    }
}

/// Digital Butterworth low-pass filter.
#[derive(Debug, Clone)]
pub struct ButterworthLowpass {
    order: usize,
    wn: f64,
    sections: Vec<Biquad>,
}

impl ButterworthLowpass {
    /// Design a low-pass of the given order.
    ///
    /// `wn` is the cutoff normalised to the Nyquist frequency and must lie in (0, 1).
    pub fn new(order: usize, wn: f64) -> Result<Self> {
        if !(wn > 0.0 && wn < 1.0) {
            return Err(WaveformError::InvalidCutoff(wn));
        }
        let order = order.max(1);

        // Pre-warp the cutoff
        let wc = BILINEAR_K * (PI * wn / 2.0).tan();

        let sections = butterworth_poles(order)
            .into_iter()
            .map(|p| {
                if p.im.abs() < 1e-12 {
                    bilinear_real_pole(p.re * wc)
                } else {
                    bilinear_pole_pair(p * wc)
                }
            })
            .collect::<Vec<_>>();

        log::debug!(
            "Butterworth low-pass: order {}, wn {:.6}, {} sections",
            order,
            wn,
            sections.len()
        );

        Ok(Self { order, wn, sections })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn wn(&self) -> f64 {
        self.wn
    }

    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    pub fn is_stable(&self) -> bool {
        self.sections.iter().all(Biquad::is_stable)
    }

    /// Single causal pass starting from the steady state of `samples[0]`.
    fn filter_in_place(&self, samples: &mut [f64]) {
        let Some(&first) = samples.first() else {
            return;
        };
        let mut level = first;
        for section in &self.sections {
            let zi = section.step_state();
            section.process(samples, [zi[0] * level, zi[1] * level]);
            level *= section.dc_gain();
        }
    }

    /// Forward-backward filtering, zero phase and squared magnitude response.
    ///
    /// Both ends are extended by odd reflection of `3 * (order + 1)` samples
    /// (at most `len - 1`) before filtering, and the padding is removed afterwards.
    pub fn filtfilt(&self, signal: &[f64]) -> Result<Vec<f64>> {
        let n = signal.len();
        if n < 2 {
            return Err(WaveformError::EmptySignal);
        }

        let padlen = (3 * (self.order + 1)).min(n - 1);
        let first = signal[0];
        let last = signal[n - 1];

        let mut ext = Vec::with_capacity(n + 2 * padlen);
        ext.extend((1..=padlen).rev().map(|i| 2.0 * first - signal[i]));
        ext.extend_from_slice(signal);
        ext.extend((1..=padlen).map(|i| 2.0 * last - signal[n - 1 - i]));

        self.filter_in_place(&mut ext);
        ext.reverse();
        self.filter_in_place(&mut ext);
        ext.reverse();

        Ok(ext[padlen..padlen + n].to_vec())
    }
}

/// Analog prototype poles in the upper half plane, plus the real pole for odd orders.
fn butterworth_poles(order: usize) -> Vec<Complex<f64>> {
    (0..order)
        .map(|k| {
            let theta = PI * (2 * k + order + 1) as f64 / (2 * order) as f64;
            Complex::new(theta.cos(), theta.sin())
        })
        .filter(|p| p.im > -1e-12)
        .collect()
}

fn bilinear_real_pole(p: f64) -> Biquad {
    let alpha = BILINEAR_K - p;
    let beta = BILINEAR_K + p;
    Biquad::new([-p / alpha, -p / alpha, 0.0], [-beta / alpha, 0.0])
}

fn bilinear_pole_pair(p: Complex<f64>) -> Biquad {
    let k2 = BILINEAR_K * BILINEAR_K;
    let mag_sq = p.norm_sqr();
    let d = k2 - 2.0 * BILINEAR_K * p.re + mag_sq;

    Biquad::new(
        [mag_sq / d, 2.0 * mag_sq / d, mag_sq / d],
        [2.0 * (mag_sq - k2) / d, (k2 + 2.0 * BILINEAR_K * p.re + mag_sq) / d],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fourth_order_has_two_stable_sections() {
        let filter = ButterworthLowpass::new(4, 0.05).unwrap();
        assert_eq!(filter.sections().len(), 2);
        assert!(filter.is_stable());
        for section in filter.sections() {
            assert!((section.dc_gain() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn odd_order_adds_first_order_section() {
        let filter = ButterworthLowpass::new(3, 0.2).unwrap();
        assert_eq!(filter.sections().len(), 2);
        assert_eq!(filter.sections()[1].numerator()[2], 0.0);
        assert!(filter.is_stable());
    }

    #[test]
    fn rejects_cutoff_outside_unit_interval() {
        assert!(matches!(
            ButterworthLowpass::new(4, 1.2),
            Err(WaveformError::InvalidCutoff(_))
        ));
        assert!(ButterworthLowpass::new(4, 0.0).is_err());
    }

    #[test]
    fn constant_signal_passes_unchanged() {
        let filter = ButterworthLowpass::new(4, 0.1).unwrap();
        let out = filter.filtfilt(&[2.5; 200]).unwrap();
        assert_eq!(out.len(), 200);
        for v in out {
            assert!((v - 2.5).abs() < 1e-9);
        }
    }

    #[test]
    fn attenuates_high_frequency_and_keeps_phase() {
        let fs = 10_000.0;
        let wn = 2.0 * PI * 60.0 / fs;
        let filter = ButterworthLowpass::new(4, wn).unwrap();

        let fundamental: Vec<f64> = (0..10_000)
            .map(|n| (2.0 * PI * 60.0 * n as f64 / fs).sin())
            .collect();
        let noisy: Vec<f64> = fundamental
            .iter()
            .enumerate()
            .map(|(n, v)| v + 0.5 * (2.0 * PI * 2_000.0 * n as f64 / fs).sin())
            .collect();

        let out = filter.filtfilt(&noisy).unwrap();
        // Away from the edges the 60 Hz component survives without phase shift
        for n in 1_000..9_000 {
            assert!((out[n] - fundamental[n]).abs() < 0.05, "sample {n}: {}", out[n]);
        }
    }

    #[test]
    fn filtfilt_rejects_single_sample() {
        let filter = ButterworthLowpass::new(4, 0.1).unwrap();
        assert!(matches!(filter.filtfilt(&[1.0]), Err(WaveformError::EmptySignal)));
    }
}
