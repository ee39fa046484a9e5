//! PPG Stress Estimation
//!
//! This crate estimates autonomic stress from the heart rate variability (HRV)
//! of a photoplethysmogram (PPG). A fully buffered, single-channel waveform is
//! band-limited with a zero-phase Butterworth bandpass, heartbeat peaks are
//! detected, RR intervals and time-domain HRV metrics (RMSSD, pNN50) are
//! computed, and the metrics are mapped to a stress label.
//!
//! Every stage is a pure function in its own module; [`pipeline`] composes them.
//! Loading waveforms and presenting results are left to the caller.
//!
//! All times are in seconds. RMSSD is reported in seconds; use
//! [`analysis::time::HrvResult::rmssd_ms`] for millisecond display.

pub mod analysis;
pub mod config;
pub mod detection;
pub mod error;
pub mod pipeline;
pub mod preprocessing;
pub mod waveform;

pub use analysis::stress::StressLabel;
pub use config::StressConfig;
pub use error::StressError;
pub use pipeline::{estimate_stress, StressPipeline, StressReport};
pub use waveform::Waveform;
