//! Tunable parameters of the stress pipeline.
//!
//! All tunables live in [`StressConfig`] and reach the algorithms only through
//! it. Defaults follow common PPG practice: a 0.5-5 Hz third-order bandpass,
//! at most one beat per 0.5 s (120 bpm) with a prominence of 0.05, and the
//! thresholds of [`StressThresholds::default`].
//!
//! The prominence is in the amplitude units of the filtered signal, so it has
//! to be revisited for every acquisition setup whose amplitude scale differs.
//!
//! # Example
//!
//! ```rust
//! use ppg_stress::config::StressConfig;
//!
//! let mut config = StressConfig::default();
//! config.filter.order = 2;
//! config.peaks.min_prominence = 0.02;
//! assert!(config.validate(125.0).is_ok());
//! assert!(config.validate(8.0).is_err(), "5 Hz is above Nyquist at 8 Hz.");
//! ```

use crate::analysis::stress::StressThresholds;
use crate::detection::peaks::PeakParams;
use crate::error::Result;
use crate::preprocessing::butterworth::FilterSpec;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_LOWCUT_HZ: f64 = 0.5;
pub const DEFAULT_HIGHCUT_HZ: f64 = 5.0;
pub const DEFAULT_FILTER_ORDER: usize = 3;
pub const DEFAULT_MIN_PEAK_DISTANCE_SECS: f64 = 0.5;
pub const DEFAULT_MIN_PEAK_PROMINENCE: f64 = 0.05;

/// Bandpass parameters; combined with the waveform's sample rate into a [`FilterSpec`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandpassConfig {
    /// Lower band edge in Hz.
    pub lowcut: f64,
    /// Upper band edge in Hz.
    pub highcut: f64,
    /// Order of the lowpass prototype.
    pub order: usize,
}

impl Default for BandpassConfig {
    fn default() -> Self {
        Self {
            lowcut: DEFAULT_LOWCUT_HZ,
            highcut: DEFAULT_HIGHCUT_HZ,
            order: DEFAULT_FILTER_ORDER,
        }
    }
}

impl BandpassConfig {
    pub fn spec(&self, fs: f64) -> Result<FilterSpec> {
        FilterSpec::new(self.lowcut, self.highcut, self.order, fs)
    }
}

/// Peak detection parameters; the distance is converted to samples per waveform.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakDetectionConfig {
    /// Minimum time between beats in seconds.
    pub min_distance_secs: f64,
    /// Minimum prominence in filtered-signal amplitude units.
    pub min_prominence: f64,
}

impl Default for PeakDetectionConfig {
    fn default() -> Self {
        Self {
            min_distance_secs: DEFAULT_MIN_PEAK_DISTANCE_SECS,
            min_prominence: DEFAULT_MIN_PEAK_PROMINENCE,
        }
    }
}

impl PeakDetectionConfig {
    pub fn params(&self, fs: f64) -> Result<PeakParams> {
        PeakParams::from_secs(self.min_distance_secs, self.min_prominence, fs)
    }
}

/// Complete configuration of one pipeline.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StressConfig {
    pub filter: BandpassConfig,
    pub peaks: PeakDetectionConfig,
    pub thresholds: StressThresholds,
}

impl StressConfig {
    /// Validates every part against a sample rate.
    ///
    /// # Errors
    ///
    /// Returns the first [`crate::StressError`] raised by the filter, peak or
    /// threshold validation.
    pub fn validate(&self, fs: f64) -> Result<()> {
        self.filter.spec(fs)?;
        self.peaks.params(fs)?;
        self.thresholds.validate()
    }
}
