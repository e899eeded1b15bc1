//! Shared capture fixtures for integration tests.

#![allow(dead_code)]

use std::f64::consts::PI;

use waveform_insight::{generate_waveform, SignalSpec, Waveform};

/// `amplitude * sin(2*pi*freq*n/fs - phase)` for `samples` samples.
pub fn sine(amplitude: f64, freq: f64, fs: f64, samples: usize, phase: f64) -> Vec<f64> {
    (0..samples)
        .map(|n| amplitude * (2.0 * PI * freq * n as f64 / fs - phase).sin())
        .collect()
}

/// Time vector starting at 0 for `samples` samples at `fs`.
pub fn time_vector(fs: f64, samples: usize) -> Vec<f64> {
    (0..samples).map(|n| n as f64 / fs).collect()
}

/// 100 samples at 6 kHz, bin spacing lands on 60 Hz.
pub const FUNDAMENTAL_FS: f64 = 6_000.0;
pub const FUNDAMENTAL_SAMPLES: usize = 100;

/// 120 V peak voltage and 10 A peak current lagging by `i_phase` radians.
pub fn fundamental_pair(i_phase: f64) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let time = time_vector(FUNDAMENTAL_FS, FUNDAMENTAL_SAMPLES);
    let v = sine(120.0, 60.0, FUNDAMENTAL_FS, FUNDAMENTAL_SAMPLES, 0.0);
    let i = sine(10.0, 60.0, FUNDAMENTAL_FS, FUNDAMENTAL_SAMPLES, i_phase);
    (time, v, i)
}

/// Default simulated capture: 0.2 s of 60 Hz, 170 V / 10 A peak at 6 kHz.
pub fn simulated_capture() -> Waveform {
    generate_waveform(&SignalSpec::default()).expect("simulated capture")
}
