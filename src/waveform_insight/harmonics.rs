use num_complex::Complex;
use realfft::RealFftPlanner;

use crate::waveform_insight::error::{Result, WaveformError};
use crate::waveform_insight::rms::calculate_signal_power;
use crate::waveform_insight::types::{FundamentalBinMode, HarmonicCoefficient, HarmonicConfig, PowerDecomposition};

/// Relative tolerance used to decide that a bin sits on the nominal frequency.
const EXACT_BIN_TOLERANCE: f64 = 1e-9;

/*
* @brief Compute the spectrum of a real signal.
* @param signal Signal buffer
* @return Non-negative frequency bins 0..=N/2, unscaled
*/
fn compute_fft(signal: &[f64]) -> Result<Vec<Complex<f64>>> {
    let mut planner = RealFftPlanner::<f64>::new();
    let r2c = planner.plan_fft_forward(signal.len());
    let mut spectrum = r2c.make_output_vec();
    let mut scratch = r2c.make_scratch_vec();

    r2c.process_with_scratch(&mut signal.to_vec(), &mut spectrum, &mut scratch)
        .map_err(|e| WaveformError::Fft(e.to_string()))?;
    Ok(spectrum)
}

/*
* @brief Scale the first bins of a spectrum to peak amplitudes.
* @param spectrum Unscaled spectrum
* @param n Length of the time-domain signal
* @param orders Number of bins to keep, starting at DC
* @return One coefficient per order
* @note DC is not doubled and its magnitude is the absolute value of its real part.
*/
fn harmonic_coefficients(spectrum: &[Complex<f64>], n: usize, orders: usize) -> Vec<HarmonicCoefficient> {
    spectrum
        .iter()
        .take(orders)
        .enumerate()
        .map(|(order, bin)| {
            let complex_amplitude = if order == 0 {
                bin / n as f64
            } else {
                bin * 2.0 / n as f64
            };
            let magnitude = if order == 0 {
                complex_amplitude.re.abs()
            } else {
                complex_amplitude.norm()
            };
            HarmonicCoefficient {
                order,
                complex_amplitude,
                magnitude,
                phase: bin.arg(),
            }
        })
        .collect()
}

/*
* @brief Locate the order of the fundamental.
* @param config Nominal frequency and bin selection mode
* @param orders Number of orders examined
* @param resolution Bin spacing in Hz
* @return Order of the fundamental, None when no bin qualifies
*/
fn fundamental_order(config: &HarmonicConfig, orders: usize, resolution: f64) -> Option<usize> {
    let nominal = config.nominal_frequency_hz;
    match config.fundamental_bin {
        FundamentalBinMode::Strict => (1..orders)
            .find(|&k| (k as f64 * resolution - nominal).abs() <= EXACT_BIN_TOLERANCE * nominal),
        FundamentalBinMode::Nearest => {
            let k = ((nominal / resolution).round() as usize).max(1);
            (k < orders).then_some(k)
        }
    }
}

/*
* @brief IEEE 1459 power decomposition with the default configuration.
* @param time Time vector
* @param voltage Voltage samples
* @param current Current samples, synchronous with voltage
* @param sampling_rate Sampling rate in Hz
* @return Power decomposition, see `harmonic_analysis_with`
*/
pub fn harmonic_analysis(
    time: &[f64],
    voltage: &[f64],
    current: &[f64],
    sampling_rate: f64,
) -> Result<PowerDecomposition> {
    harmonic_analysis_with(&HarmonicConfig::default(), time, voltage, current, sampling_rate)
}

/*
* @brief Decompose the power of a voltage/current pair into fundamental and harmonic terms.
* @param config Nominal frequency, number of orders and fundamental bin mode
* @param time Time vector
* @param voltage Voltage samples
* @param current Current samples, synchronous with voltage
* @param sampling_rate Sampling rate in Hz
* @return Power decomposition following IEEE 1459
* @note Q1, DI, DV and N carry the generator sign. PF1 and PF are negated when Q1 and
*       the average power share a sign.
* @note Fails with NoFundamentalBin when no bin matches the nominal frequency.
*/
pub fn harmonic_analysis_with(
    config: &HarmonicConfig,
    time: &[f64],
    voltage: &[f64],
    current: &[f64],
    sampling_rate: f64,
) -> Result<PowerDecomposition> {
    if voltage.len() != current.len() {
        return Err(WaveformError::LengthMismatch {
            what: "voltage vs current",
            left: voltage.len(),
            right: current.len(),
        });
    }
    if time.len() != voltage.len() {
        return Err(WaveformError::LengthMismatch {
            what: "time vs voltage",
            left: time.len(),
            right: voltage.len(),
        });
    }
    if !(sampling_rate > 0.0) || !sampling_rate.is_finite() {
        return Err(WaveformError::InvalidSamplingRate(sampling_rate));
    }
    let n = time.len();
    if n < 2 {
        return Err(WaveformError::EmptySignal);
    }

    let resolution = sampling_rate / n as f64;
    let orders = config.max_harmonic_order.min(n / 2);
    if orders < config.max_harmonic_order {
        log::debug!(
            "Only {} of {} harmonic orders available with {} samples",
            orders,
            config.max_harmonic_order,
            n
        );
    }

    let voltage_harmonics = harmonic_coefficients(&compute_fft(voltage)?, n, orders);
    let current_harmonics = harmonic_coefficients(&compute_fft(current)?, n, orders);

    let Some(fundamental) = fundamental_order(config, orders, resolution) else {
        log::warn!(
            "No fundamental frequency for given capture timing parameters ({} samples at {} Hz). Will not calculate P1 or Q1.",
            n,
            sampling_rate
        );
        return Err(WaveformError::NoFundamentalBin {
            nominal: config.nominal_frequency_hz,
            resolution,
        });
    };

    let mut vh_sq = 0.0;
    let mut ih_sq = 0.0;
    let mut v1_sq = 0.0;
    let mut i1_sq = 0.0;
    let mut p0 = 0.0;
    let mut p1 = 0.0;
    let mut q1 = 0.0;
    let mut ph = 0.0;

    for (v, i) in voltage_harmonics.iter().zip(current_harmonics.iter()) {
        let cross = i.magnitude * v.magnitude / 2.0;
        let angle = i.phase - v.phase;

        if v.order == 0 {
            vh_sq += v.magnitude.powi(2);
            ih_sq += i.magnitude.powi(2);
            p0 = i.complex_amplitude.re * v.complex_amplitude.re;
            ph += p0;
        } else if v.order == fundamental {
            v1_sq = v.magnitude.powi(2) / 2.0;
            i1_sq = i.magnitude.powi(2) / 2.0;
            p1 = cross * angle.cos();
            // Generator point of view
            q1 = -cross * angle.sin();
        } else {
            vh_sq += v.magnitude.powi(2) / 2.0;
            ih_sq += i.magnitude.powi(2) / 2.0;
            ph += cross * angle.cos();
        }
    }

    let thd_i = (ih_sq / i1_sq).sqrt();
    let thd_v = (vh_sq / v1_sq).sqrt();

    // Includes every harmonic, unlike p1
    let avg_p = calculate_signal_power(voltage, current);

    let s1 = (p1.powi(2) + q1.powi(2)).sqrt();
    let di = -s1 * thd_i;
    let dv = -s1 * thd_v;
    let sh = s1 * thd_i * thd_v;
    let dh = (sh.powi(2) - ph.powi(2)).max(0.0).sqrt();
    let sn = (di.powi(2) + dv.powi(2) + sh.powi(2)).sqrt();
    let s = (s1.powi(2) + sn.powi(2)).sqrt();
    let n_power = -(s.powi(2) - avg_p.powi(2)).max(0.0).sqrt();

    let mut pf1 = p1 / s1;
    let mut pf = avg_p / s;
    if (q1 > 0.0 && avg_p > 0.0) || (q1 < 0.0 && avg_p < 0.0) {
        pf1 = -pf1;
        pf = -pf;
    }

    log::debug!(
        "Harmonic analysis: P = {:.3} W, P1 = {:.3} W, Q1 = {:.3} VAR, S = {:.3} VA, THD_V = {:.4}, THD_I = {:.4}",
        avg_p,
        p1,
        q1,
        s,
        thd_v,
        thd_i
    );

    Ok(PowerDecomposition {
        avg_p,
        p0,
        p1,
        ph,
        q1,
        n: n_power,
        di,
        dv,
        dh,
        s,
        s1,
        sn,
        sh,
        pf1,
        pf,
        harmonic_pollution: sn / s1,
        thd_v,
        thd_i,
        fundamental_order: fundamental,
        voltage_harmonics,
        current_harmonics,
    })
}
