use std::path::PathBuf;

use clap::{Parser, Subcommand};

use waveform_insight::print;
use waveform_insight::{
    generate_waveform, AnalysisConfig, Result, SignalSpec, Waveform, WaveformInsight,
    VOLTAGE_CHANNEL_PREFIX,
};

/// Waveform Insight CLI
#[derive(Parser, Debug)]
#[command(author, version, about = "Power quality analysis of waveform captures", long_about = None)]
struct Args {
    /// Simulate a 60 Hz capture instead of reading a CSV file
    #[arg(short = 's', long)]
    simulate: bool,

    /// CSV capture with a Time column and AC_V_<phase>/AC_I_<phase> channels
    #[arg(short = 'i', long, required_unless_present = "simulate")]
    input: Option<PathBuf>,

    /// TOML analysis configuration
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Phase label of the voltage and current channels
    #[arg(short = 'p', long, default_value = "1")]
    phase: String,

    /// Write the analysed capture to a CSV file
    #[arg(long)]
    export: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sliding-window RMS of one channel
    Rms {
        /// Channel name, defaults to the phase voltage
        channel: Option<String>,
    },
    /// RMS of every full cycle of the phase voltage and current
    CycleRms,
    /// Zero-crossing frequency of one channel
    Frequency {
        /// Channel name, defaults to the phase voltage
        channel: Option<String>,
    },
    /// IEEE 1459 power decomposition of the phase
    Harmonics,
    /// Delay between a ride-through event and the equipment trip
    RideThrough {
        /// Trigger channel marking the event, the voltage RMS is used otherwise
        #[arg(long)]
        trigger: Option<String>,
    },
}

fn load_capture(args: &Args) -> Result<Waveform> {
    match &args.input {
        Some(path) if !args.simulate => {
            log::info!("Reading capture from {}", path.display());
            Waveform::from_csv(path)
        }
        _ => {
            log::info!("Simulating signals instead of reading a capture.");
            generate_waveform(&SignalSpec::default())
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => AnalysisConfig::from_toml_file(path)?,
        None => AnalysisConfig::default(),
    };
    let insight = WaveformInsight::new(config)?;
    let mut waveform = load_capture(&args)?;
    let phase_voltage = format!("{VOLTAGE_CHANNEL_PREFIX}{}", args.phase);

    log::info!(
        "Capture: {} channels, {} samples at {:.1} Hz",
        waveform.channels.len(),
        waveform.sample_count,
        waveform.sample_rate
    );

    match &args.command {
        Command::Rms { channel } => {
            let channel = channel.as_deref().unwrap_or(phase_voltage.as_str());
            let series = insight.sliding_rms(&waveform, channel)?;
            print::print_rms_series(channel, print::channel_unit(channel), &series);
        }
        Command::CycleRms => {
            let rms = insight.cycle_rms(&mut waveform, &args.phase)?;
            print::print_phase_rms(&args.phase, &rms);
        }
        Command::Frequency { channel } => {
            let channel = channel.as_deref().unwrap_or(phase_voltage.as_str());
            let estimate = insight.frequency(&waveform, channel)?;
            print::print_frequency(&estimate);
        }
        Command::Harmonics => {
            let power = insight.harmonics(&waveform, &args.phase)?;
            print::print_all(&power);
        }
        Command::RideThrough { trigger } => {
            let duration = insight.ride_through(&waveform, &args.phase, trigger.as_deref())?;
            log::info!("Ride-through duration: {:.4} s", duration);
        }
    }

    if let Some(path) = &args.export {
        waveform.to_csv(path)?;
        log::info!("Capture written to {}", path.display());
    }

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
