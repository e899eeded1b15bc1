use std::fmt::Display;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::waveform_insight::error::{Result, WaveformError};
use crate::waveform_insight::rms::calculate_rms;
use crate::waveform_insight::types::*;

/// Segmentation state while walking a signal cycle by cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
enum CycleState {
    WaitingForNegative,          // Nothing seen below zero yet
    Scanning,                    // Negative seen, waiting for the rising edge
    Calculating { start: usize, neg: bool },
}

/*
* @brief Calculate the RMS of every full cycle of a signal.
* @param time Time vector
* @param data Signal buffer, same length as time
* @return One RMS value per cycle, time-stamped at the end of the cycle
* @note A cycle runs from one negative-to-positive transition to the next.
*/
pub fn cycle_rms(time: &[f64], data: &[f64]) -> Result<RmsSeries> {
    if time.len() != data.len() {
        return Err(WaveformError::LengthMismatch {
            what: "time vs signal",
            left: time.len(),
            right: data.len(),
        });
    }

    let mut series = RmsSeries::default();
    let mut state = CycleState::WaitingForNegative;

    for (i, &sample) in data.iter().enumerate() {
        let pos = sample >= 0.0;
        state = match state {
            CycleState::WaitingForNegative if !pos => CycleState::Scanning,
            CycleState::Scanning if pos => CycleState::Calculating { start: i, neg: false },
            CycleState::Calculating { start, .. } if !pos => CycleState::Calculating { start, neg: true },
            CycleState::Calculating { start, neg: true } => {
                series.time.push(time[i]);
                series.rms.push(calculate_rms(&data[start..i]));
                CycleState::Calculating { start: i, neg: false }
            }
            other => other,
        };
    }

    Ok(series)
}

/// Multi-channel waveform capture.
#[derive(Debug, Clone, Default)]
pub struct Waveform {
    pub start_time: f64,            // Waveform start time
    pub sample_count: usize,        // Samples per channel
    pub sample_rate: f64,           // Samples/second
    pub trigger_sample: usize,
    pub channels: Vec<String>,      // Channel names
    pub channel_data: Vec<Vec<f64>>,
    pub rms_data: PhaseRmsMap,      // Per-cycle RMS by phase
}

impl Waveform {
    pub fn new() -> Self {
        Self::default()
    }

    /*
    * @brief Build a waveform from already captured channels.
    * @param start_time Capture start time
    * @param sample_rate Samples/second
    * @param channels Channel names
    * @param channel_data One buffer per channel, all the same length
    */
    pub fn from_channels(
        start_time: f64,
        sample_rate: f64,
        channels: Vec<String>,
        channel_data: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if channels.len() != channel_data.len() {
            return Err(WaveformError::LengthMismatch {
                what: "channel names vs channel data",
                left: channels.len(),
                right: channel_data.len(),
            });
        }
        let sample_count = channel_data.first().map_or(0, Vec::len);
        if let Some(bad) = channel_data.iter().find(|c| c.len() != sample_count) {
            return Err(WaveformError::LengthMismatch {
                what: "channel lengths",
                left: sample_count,
                right: bad.len(),
            });
        }

        Ok(Self {
            start_time,
            sample_count,
            sample_rate,
            channels,
            channel_data,
            ..Default::default()
        })
    }

    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_csv_reader(BufReader::new(file))
    }

    /*
    * @brief Read a capture in CSV form.
    * @param reader CSV source, header row with channel names then one row per sample
    * @note Rows with a different number of fields than the header fail with ChannelData.
    */
    pub fn from_csv_reader(reader: impl Read) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = rdr.records();
        let header = match records.next() {
            Some(record) => record?,
            None => return Ok(Self::default()),
        };
        let channels: Vec<String> = header.iter().map(str::to_string).collect();
        let mut channel_data = vec![Vec::new(); channels.len()];

        for (idx, record) in records.enumerate() {
            let record = record?;
            let line = record.position().map_or(idx + 2, |p| p.line() as usize);
            if record.len() != channels.len() {
                return Err(WaveformError::ChannelData { line });
            }
            for (chan, value) in channel_data.iter_mut().zip(record.iter()) {
                let v = value.parse::<f64>().map_err(|_| WaveformError::ParseValue {
                    value: value.to_string(),
                    line,
                })?;
                chan.push(v);
            }
        }

        let mut waveform = Self::from_channels(0.0, 0.0, channels, channel_data)?;
        waveform.sample_rate = waveform.estimate_sample_rate().unwrap_or(0.0);
        Ok(waveform)
    }

    pub fn to_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        self.to_csv_writer(BufWriter::new(file))
    }

    pub fn to_csv_writer(&self, writer: impl Write) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new().from_writer(writer);

        wtr.write_record(&self.channels)?;
        for i in 0..self.sample_count {
            wtr.write_record(self.channel_data.iter().map(|c| c[i].to_string()))?;
        }

        wtr.flush()?;
        Ok(())
    }

    pub fn channel(&self, name: &str) -> Result<&[f64]> {
        self.channels
            .iter()
            .position(|c| c == name)
            .map(|idx| self.channel_data[idx].as_slice())
            .ok_or_else(|| WaveformError::ChannelNotFound(name.to_string()))
    }

    /// The `Time` channel, or `TIME` when the capture uses upper case.
    pub fn time(&self) -> Result<&[f64]> {
        TIME_CHANNELS
            .iter()
            .find_map(|name| self.channel(name).ok())
            .ok_or_else(|| WaveformError::ChannelNotFound(TIME_CHANNELS[0].to_string()))
    }

    /// Sample rate from the spacing of the first two time stamps.
    fn estimate_sample_rate(&self) -> Option<f64> {
        let time = self.time().ok()?;
        let dt = time.get(1)? - time.first()?;
        (dt > 0.0).then(|| 1.0 / dt)
    }

    pub fn compute_cycle_rms(&self, chan_id: &str) -> Result<RmsSeries> {
        let time = self.time()?;
        let data = self.channel(chan_id)?;
        cycle_rms(time, data)
    }

    /*
    * @brief Per-cycle voltage and current RMS of one phase.
    * @param phase Phase label, reads AC_V_<phase> and AC_I_<phase>
    * @return The stored per-phase RMS, truncated to the shorter series
    */
    pub fn compute_rms_data(&mut self, phase: impl Display) -> Result<&PhaseRms> {
        let phase = phase.to_string();
        let voltage = self.compute_cycle_rms(&format!("{VOLTAGE_CHANNEL_PREFIX}{phase}"))?;
        let current = self.compute_cycle_rms(&format!("{CURRENT_CHANNEL_PREFIX}{phase}"))?;
        let count = voltage.len().min(current.len());

        log::debug!("Phase {}: {} cycles", phase, count);

        let entry = PhaseRms {
            time: voltage.time[..count].to_vec(),
            voltage_rms: voltage.rms[..count].to_vec(),
            current_rms: current.rms[..count].to_vec(),
        };
        let rms = self.rms_data.entry(phase).or_default();
        *rms = entry;
        Ok(rms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAPTURE: &str = "Time, AC_V_1, AC_I_1\n\
                           0.0, -1.0, -2.0\n\
                           0.1, 1.0, 2.0\n\
                           0.2, 1.0, 2.0\n\
                           0.3, -1.0, -2.0\n\
                           0.4, -1.0, -2.0\n\
                           0.5, 1.0, 2.0\n\
                           0.6, 1.0, 2.0\n\
                           0.7, -1.0, -2.0\n\
                           0.8, 1.0, 2.0\n";

    #[test]
    fn cycle_rms_segments_on_rising_edges() {
        let time: Vec<f64> = (0..9).map(|n| n as f64).collect();
        let data = [-1.0, 1.0, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0, 1.0];
        let series = cycle_rms(&time, &data).unwrap();
        assert_eq!(series.time, vec![5.0, 8.0]);
        assert_eq!(series.rms, vec![1.0, 1.0]);
    }

    #[test]
    fn cycle_rms_waits_for_a_negative_sample() {
        let time: Vec<f64> = (0..6).map(|n| n as f64).collect();
        // Starts positive, the first segment only opens at index 3
        let data = [2.0, 2.0, -2.0, 3.0, -3.0, 3.0];
        let series = cycle_rms(&time, &data).unwrap();
        assert_eq!(series.time, vec![5.0]);
        assert_eq!(series.rms, vec![3.0]);
    }

    #[test]
    fn cycle_rms_rejects_short_time_vector() {
        let err = cycle_rms(&[0.0, 1.0, 2.0], &[-1.0, 1.0, -1.0, 1.0, -1.0, 1.0]).unwrap_err();
        assert!(
            matches!(err, WaveformError::LengthMismatch { left: 3, right: 6, .. }),
            "{err:?}"
        );
    }

    #[test]
    fn reads_csv_and_computes_phase_rms() {
        let mut wf = Waveform::from_csv_reader(CAPTURE.as_bytes()).unwrap();
        assert_eq!(wf.channels, vec!["Time", "AC_V_1", "AC_I_1"]);
        assert_eq!(wf.sample_count, 9);
        assert!((wf.sample_rate - 10.0).abs() < 1e-9);

        let phase = wf.compute_rms_data(1).unwrap().clone();
        assert_eq!(phase.time, vec![0.5, 0.8]);
        assert_eq!(phase.voltage_rms, vec![1.0, 1.0]);
        assert_eq!(phase.current_rms, vec![2.0, 2.0]);
        assert!(wf.rms_data.contains_key("1"));
    }

    #[test]
    fn upper_case_time_channel_is_accepted() {
        let wf = Waveform::from_channels(
            0.0,
            1.0,
            vec!["TIME".into(), "V".into()],
            vec![vec![0.0, 1.0, 2.0, 3.0], vec![-1.0, 1.0, -1.0, 1.0]],
        )
        .unwrap();
        let series = wf.compute_cycle_rms("V").unwrap();
        assert_eq!(series.time, vec![3.0]);
    }

    #[test]
    fn missing_channel_is_reported() {
        let wf = Waveform::from_csv_reader(CAPTURE.as_bytes()).unwrap();
        match wf.compute_cycle_rms("AC_V_2") {
            Err(WaveformError::ChannelNotFound(name)) => assert_eq!(name, "AC_V_2"),
            other => panic!("unexpected {other:?}"),
        }

        let no_time = Waveform::from_channels(0.0, 1.0, vec!["V".into()], vec![vec![1.0]]).unwrap();
        assert!(matches!(
            no_time.compute_cycle_rms("V"),
            Err(WaveformError::ChannelNotFound(_))
        ));
    }

    #[test]
    fn short_row_reports_line() {
        let err = Waveform::from_csv_reader("Time,V\n0.0,1.0\n0.1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, WaveformError::ChannelData { line: 3 }), "{err:?}");
    }

    #[test]
    fn bad_number_is_reported() {
        let err = Waveform::from_csv_reader("Time,V\n0.0,abc\n".as_bytes()).unwrap_err();
        assert!(matches!(err, WaveformError::ParseValue { line: 2, .. }), "{err:?}");
    }

    #[test]
    fn csv_round_trip_keeps_channels() {
        let wf = Waveform::from_csv_reader(CAPTURE.as_bytes()).unwrap();
        let mut out = Vec::new();
        wf.to_csv_writer(&mut out).unwrap();
        let back = Waveform::from_csv_reader(out.as_slice()).unwrap();
        assert_eq!(back.channels, wf.channels);
        assert_eq!(back.channel_data, wf.channel_data);
    }

    #[test]
    fn from_channels_rejects_ragged_data() {
        let err = Waveform::from_channels(
            0.0,
            1.0,
            vec!["Time".into(), "V".into()],
            vec![vec![0.0, 1.0], vec![1.0]],
        )
        .unwrap_err();
        assert!(matches!(err, WaveformError::LengthMismatch { .. }));
    }
}
