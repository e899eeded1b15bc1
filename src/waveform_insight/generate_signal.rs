use ndarray::Array1;
use rand::Rng;
use std::f64::consts::PI;

use crate::waveform_insight::error::Result;
use crate::waveform_insight::types::FREQ_NOMINAL_60;
use crate::waveform_insight::waveform::Waveform;

/// Parameters of a synthetic single-phase capture.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSpec {
    pub sample_rate: f64,  // Samples/second
    pub samples: usize,    // Number of samples per channel
    pub frequency: f64,    // Fundamental frequency in Hz
    pub v_peak: f64,
    pub i_peak: f64,
    pub i_phase_deg: f64,  // Current lag behind the voltage
    pub harmonic: Option<(usize, f64, f64)>, // (order, fraction of v_peak, fraction of i_peak)
    pub noise_fraction: f64, // Uniform noise amplitude as a fraction of each peak
}

impl Default for SignalSpec {
    fn default() -> Self {
        Self {
            sample_rate: 6000.0,
            samples: 1200,
            frequency: FREQ_NOMINAL_60,
            v_peak: 170.0,
            i_peak: 10.0,
            i_phase_deg: 0.0,
            harmonic: None,
            noise_fraction: 0.0,
        }
    }
}

fn offset(deg: f64) -> f64 {
    deg * 2.0 * PI / 360.0
}

fn noise<R: Rng>(rng: &mut R, peak: f64, fraction: f64) -> f64 {
    if fraction > 0.0 {
        peak * fraction * rng.gen_range(-1.0..1.0)
    } else {
        0.0
    }
}

/*
* @brief Generate a synthetic capture with Time, AC_V_1 and AC_I_1 channels.
* @param spec Signal parameters
* @return Waveform sampled at spec.sample_rate
*/
pub fn generate_waveform(spec: &SignalSpec) -> Result<Waveform> {
    generate_waveform_with_rng(spec, &mut rand::thread_rng())
}

/*
* @brief Generate a synthetic capture using the given random source for the noise.
* @param spec Signal parameters
* @param rng Random source, seed it for repeatable captures
*/
pub fn generate_waveform_with_rng<R: Rng>(spec: &SignalSpec, rng: &mut R) -> Result<Waveform> {
    let time = Array1::range(0.0, spec.samples as f64, 1.0) / spec.sample_rate;
    let omega = 2.0 * PI * spec.frequency;
    let i_phase = offset(spec.i_phase_deg);

    let mut voltage: Array1<f64> = time.mapv(|t| spec.v_peak * (omega * t).sin());
    let mut current: Array1<f64> = time.mapv(|t| spec.i_peak * (omega * t - i_phase).sin());

    if let Some((order, v_fraction, i_fraction)) = spec.harmonic {
        let h = order as f64;
        voltage.zip_mut_with(&time, |v, &t| {
            *v += spec.v_peak * v_fraction * (h * omega * t).sin();
        });
        current.zip_mut_with(&time, |i, &t| {
            *i += spec.i_peak * i_fraction * (h * (omega * t - i_phase)).sin();
        });
    }

    voltage.mapv_inplace(|v| v + noise(rng, spec.v_peak, spec.noise_fraction));
    current.mapv_inplace(|i| i + noise(rng, spec.i_peak, spec.noise_fraction));

    Waveform::from_channels(
        0.0,
        spec.sample_rate,
        vec!["Time".into(), "AC_V_1".into(), "AC_I_1".into()],
        vec![time.to_vec(), voltage.to_vec(), current.to_vec()],
    )
}
