use crate::waveform_insight::error::{Result, WaveformError};
use crate::waveform_insight::rms::{calculate_rms_of_signal, drop_first_point};
use crate::waveform_insight::types::{RideThroughConfig, RmsSeries};

/// How the start of the ride-through event is found.
#[derive(Debug, Clone, Copy)]
pub enum RideThroughStart<'a> {
    /// Raw AC voltage; the event starts when its RMS leaves the nominal window.
    Voltage(&'a [f64]),
    /// Grid simulator trigger channel, aligned with the time vector.
    Trigger(&'a [f64]),
}

/*
* @brief Sliding RMS with a ride-through window, first point dropped.
* @param config Ride-through parameters
* @param data Raw samples
*/
fn windowed_rms(config: &RideThroughConfig, data: &[f64]) -> Result<RmsSeries> {
    let series = calculate_rms_of_signal(
        data,
        config.window_ms(),
        config.sampling_frequency_hz,
        config.overlap_ms(),
    )?;
    Ok(drop_first_point(series))
}

fn event_start(config: &RideThroughConfig, time: &[f64], start: RideThroughStart<'_>) -> Result<f64> {
    match start {
        RideThroughStart::Voltage(voltage) => {
            let rms = windowed_rms(config, voltage)?;
            let low = config.nominal_voltage - config.voltage_window;
            let high = config.nominal_voltage + config.voltage_window;
            let start = rms
                .iter()
                .find(|&(_, v)| v <= low || v >= high)
                .map(|(t, _)| t);
            start.ok_or(WaveformError::NoVoltageDeviation)
        }
        RideThroughStart::Trigger(trigger) => time
            .iter()
            .zip(trigger.iter())
            .find(|&(_, &trig)| trig >= config.trigger_threshold)
            .map(|(&t, _)| t)
            .ok_or(WaveformError::NoTrigger),
    }
}

/*
* @brief Time between the start of a ride-through event and the trip of the equipment.
* @param config Ride-through parameters
* @param time Time vector of the capture
* @param ac_current Raw AC current, aligned with time
* @param start Source used to find the start of the event
* @return Trip delay in seconds, 0.0 when the equipment never trips
*/
pub fn calc_ride_through_duration(
    config: &RideThroughConfig,
    time: &[f64],
    ac_current: &[f64],
    start: RideThroughStart<'_>,
) -> Result<f64> {
    let event = event_start(config, time, start)?;

    let current_rms = windowed_rms(config, ac_current)?;
    let trip = current_rms
        .iter()
        .find(|&(_, i)| i <= config.trip_threshold)
        .map(|(t, _)| t);

    match trip {
        Some(trip_time) => {
            log::info!(
                "Ride-through: event at {:.4} s, trip at {:.4} s",
                event,
                trip_time
            );
            Ok(trip_time - event)
        }
        None => {
            log::info!("Ride-through: event at {:.4} s, no trip", event);
            Ok(0.0)
        }
    }
}
