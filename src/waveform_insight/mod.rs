pub mod config;
pub mod error;
pub mod filter;
pub mod frequency;
pub mod generate_signal;
pub mod harmonics;
pub mod print;
pub mod ride_through;
pub mod rms;
pub mod types;
pub mod waveform;

pub use config::AnalysisConfig;
pub use error::{Result, WaveformError};
pub use filter::{Biquad, ButterworthLowpass};
pub use frequency::{find_zero_crossings, freq_from_crossings, freq_from_crossings_with};
pub use generate_signal::{generate_waveform, generate_waveform_with_rng, SignalSpec};
pub use harmonics::{harmonic_analysis, harmonic_analysis_with};
pub use ride_through::{calc_ride_through_duration, RideThroughStart};
pub use rms::{calculate_rms, calculate_rms_of_signal, calculate_signal_power, drop_first_point};
pub use types::*;
pub use waveform::{cycle_rms, Waveform};

/// Runs every analysis stage on a capture with one shared configuration.
#[derive(Debug, Clone, Default)]
pub struct WaveformInsight {
    pub config: AnalysisConfig,
}

impl WaveformInsight {
    /*
    * @brief Create an analyzer from a validated configuration.
    * @param config Analysis parameters
    * @return The first validation problem when the configuration is rejected
    */
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        let mut errors = config.validate().into_iter();
        if let Some(first) = errors.next() {
            for other in errors {
                log::warn!("{}", other);
            }
            return Err(first);
        }
        Ok(Self { config })
    }

    fn sample_rate(waveform: &Waveform) -> Result<f64> {
        if waveform.sample_rate > 0.0 && waveform.sample_rate.is_finite() {
            Ok(waveform.sample_rate)
        } else {
            Err(WaveformError::InvalidSamplingRate(waveform.sample_rate))
        }
    }

    /// Sliding-window RMS of one channel.
    pub fn sliding_rms(&self, waveform: &Waveform, channel: &str) -> Result<RmsSeries> {
        let rms = &self.config.sliding_rms;
        calculate_rms_of_signal(
            waveform.channel(channel)?,
            rms.window_ms,
            Self::sample_rate(waveform)?,
            rms.overlap_ms,
        )
    }

    pub fn cycle_rms(&self, waveform: &mut Waveform, phase: &str) -> Result<PhaseRms> {
        waveform.compute_rms_data(phase).cloned()
    }

    pub fn frequency(&self, waveform: &Waveform, channel: &str) -> Result<FrequencyEstimate> {
        freq_from_crossings_with(
            &self.config.frequency,
            waveform.time()?,
            waveform.channel(channel)?,
            Self::sample_rate(waveform)?,
        )
    }

    /*
    * @brief IEEE 1459 decomposition of one phase.
    * @param waveform Capture holding AC_V_<phase> and AC_I_<phase>
    * @param phase Phase label
    */
    pub fn harmonics(&self, waveform: &Waveform, phase: &str) -> Result<PowerDecomposition> {
        harmonic_analysis_with(
            &self.config.harmonics,
            waveform.time()?,
            waveform.channel(&format!("{VOLTAGE_CHANNEL_PREFIX}{phase}"))?,
            waveform.channel(&format!("{CURRENT_CHANNEL_PREFIX}{phase}"))?,
            Self::sample_rate(waveform)?,
        )
    }

    /*
    * @brief Ride-through trip delay of one phase.
    * @param waveform Capture holding AC_V_<phase> and AC_I_<phase>
    * @param phase Phase label
    * @param trigger Trigger channel, the voltage RMS is used when None
    * @note The capture's own sample rate replaces the configured DAQ rate when known.
    */
    pub fn ride_through(&self, waveform: &Waveform, phase: &str, trigger: Option<&str>) -> Result<f64> {
        let mut config = self.config.ride_through.clone();
        if let Ok(fs) = Self::sample_rate(waveform) {
            config.sampling_frequency_hz = fs;
        }

        let start = match trigger {
            Some(name) => RideThroughStart::Trigger(waveform.channel(name)?),
            None => RideThroughStart::Voltage(
                waveform.channel(&format!("{VOLTAGE_CHANNEL_PREFIX}{phase}"))?,
            ),
        };

        calc_ride_through_duration(
            &config,
            waveform.time()?,
            waveform.channel(&format!("{CURRENT_CHANNEL_PREFIX}{phase}"))?,
            start,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = AnalysisConfig::default();
        config.sliding_rms.window_ms = 0.5;
        let err = WaveformInsight::new(config).unwrap_err();
        assert!(matches!(err, WaveformError::Config { ref field, .. } if field == "sliding_rms.window_ms"));
    }

    #[test]
    fn analyzer_runs_on_generated_capture() {
        let insight = WaveformInsight::new(AnalysisConfig::default()).unwrap();
        let mut wf = generate_waveform(&SignalSpec::default()).unwrap();

        let power = insight.harmonics(&wf, "1").unwrap();
        assert!((power.avg_p - 850.0).abs() < 1e-6, "{}", power.avg_p);

        let freq = insight.frequency(&wf, "AC_V_1").unwrap();
        assert!((freq.avg_freq - 60.0).abs() < 0.05);

        let rms = insight.sliding_rms(&wf, "AC_V_1").unwrap();
        assert!(!rms.is_empty());

        let cycles = insight.cycle_rms(&mut wf, "1").unwrap();
        assert!(!cycles.time.is_empty());
        assert!(wf.rms_data.contains_key("1"));
    }

    #[test]
    fn missing_sample_rate_is_reported() {
        let wf = Waveform::from_channels(
            0.0,
            0.0,
            vec!["Time".into(), "AC_V_1".into()],
            vec![vec![0.0, 1.0], vec![1.0, -1.0]],
        )
        .unwrap();
        let insight = WaveformInsight::default();
        assert!(matches!(
            insight.sliding_rms(&wf, "AC_V_1"),
            Err(WaveformError::InvalidSamplingRate(_))
        ));
    }
}
