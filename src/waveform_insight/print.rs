use crate::waveform_insight::types::{
    FrequencyEstimate, PhaseRms, PowerDecomposition, RmsSeries, CURRENT_CHANNEL_PREFIX,
    VOLTAGE_CHANNEL_PREFIX,
};

/// Unit of a channel from its name prefix, empty when unknown.
pub fn channel_unit(channel: &str) -> &'static str {
    if channel.starts_with(VOLTAGE_CHANNEL_PREFIX) {
        "V"
    } else if channel.starts_with(CURRENT_CHANNEL_PREFIX) {
        "A"
    } else {
        ""
    }
}

/*
* @brief Print the IEEE 1459 power decomposition.
* @param power Result of the harmonic analysis
*/
pub fn print_power(power: &PowerDecomposition) {
    log::info!("Power:");
    log::info!("  Average Active (P): {:.3} W", power.avg_p);
    log::info!("  DC Active (P0): {:.3} W", power.p0);
    log::info!("  Fundamental Active (P1): {:.3} W", power.p1);
    log::info!("  Harmonic Active (PH): {:.3} W", power.ph);
    log::info!("  Fundamental Reactive (Q1): {:.3} VAR", power.q1);
    log::info!("  Nonactive (N): {:.3} VAR\n", power.n);
}

/*
* @brief Print the apparent and distortion powers.
* @param power Result of the harmonic analysis
*/
pub fn print_apparent_power(power: &PowerDecomposition) {
    log::info!("Apparent Power:");
    log::info!("  Combined (S): {:.3} VA", power.s);
    log::info!("  Fundamental (S1): {:.3} VA", power.s1);
    log::info!("  Nonfundamental (SN): {:.3} VA", power.sn);
    log::info!("  Harmonic (SH): {:.3} VA", power.sh);
    log::info!("  Current Distortion (DI): {:.3} VAR", power.di);
    log::info!("  Voltage Distortion (DV): {:.3} VAR", power.dv);
    log::info!("  Harmonic Distortion (DH): {:.3} VAR\n", power.dh);
}

/*
* @brief Print power factors and distortion ratios.
* @param power Result of the harmonic analysis
*/
pub fn print_quality(power: &PowerDecomposition) {
    log::info!("Quality:");
    log::info!("  Fundamental Power Factor: {:.4}", power.pf1);
    log::info!("  Power Factor: {:.4}", power.pf);
    log::info!("  Harmonic Pollution: {:.4}", power.harmonic_pollution);
    log::info!("  THD V: {:.2} %", power.thd_v * 100.0);
    log::info!("  THD I: {:.2} %\n", power.thd_i * 100.0);
}

/*
* @brief Print the voltage and current harmonic magnitudes.
* @param power Result of the harmonic analysis
* @note Only orders with a magnitude above 0.1 % of the fundamental are listed.
*/
pub fn print_harmonics(power: &PowerDecomposition) {
    let fundamental = power.fundamental_order;
    let v1 = power.voltage_harmonics.get(fundamental).map_or(0.0, |h| h.magnitude);
    let i1 = power.current_harmonics.get(fundamental).map_or(0.0, |h| h.magnitude);

    log::info!("Harmonics (fundamental at bin {}):", fundamental);
    for (v, i) in power.voltage_harmonics.iter().zip(power.current_harmonics.iter()) {
        if v.magnitude > v1 * 1e-3 || i.magnitude > i1 * 1e-3 {
            log::info!(
                "  [{:2}] V: {:10.3} ({:7.2}º)  I: {:10.3} ({:7.2}º)",
                v.order,
                v.magnitude,
                v.phase.to_degrees(),
                i.magnitude,
                i.phase.to_degrees()
            );
        }
    }
}

/*
* @brief Print everything the harmonic analysis produced.
* @param power Result of the harmonic analysis
*/
pub fn print_all(power: &PowerDecomposition) {
    print_power(power);
    print_apparent_power(power);
    print_quality(power);
    print_harmonics(power);
}

pub fn print_frequency(estimate: &FrequencyEstimate) {
    let (min, max) = estimate
        .freqs
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &f| (lo.min(f), hi.max(f)));

    log::info!("Frequency:");
    log::info!("  Average: {:.4} Hz", estimate.avg_freq);
    log::info!("  Min: {:.4} Hz  Max: {:.4} Hz", min, max);
    log::info!("  Crossings: {}\n", estimate.crossing_times.len());
}

/*
* @brief Print a time-stamped RMS series.
* @param label Channel name
* @param unit Unit of the samples
* @param series RMS values
*/
pub fn print_rms_series(label: &str, unit: &str, series: &RmsSeries) {
    log::info!("{} RMS ({} points):", label, series.len());
    for (t, rms) in series.iter() {
        log::info!("  {:10.5} s: {:.3} {}", t, rms, unit);
    }
}

pub fn print_phase_rms(phase: &str, rms: &PhaseRms) {
    log::info!("Phase {} cycle RMS ({} cycles):", phase, rms.time.len());
    for ((t, v), i) in rms.time.iter().zip(&rms.voltage_rms).zip(&rms.current_rms) {
        log::info!("  {:10.5} s: {:.3} V  {:.3} A", t, v, i);
    }
}
