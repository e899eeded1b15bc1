pub mod waveform_insight;

pub use waveform_insight::*;
