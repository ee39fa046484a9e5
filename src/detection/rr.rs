//! Conversion of peak indices into inter-beat (RR) intervals.

use crate::detection::peaks::PeakSet;
use crate::error::{Result, StressError};
use crate::waveform::validate_fs;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Inter-beat intervals in seconds, in the temporal order of the peaks.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RrSequence {
    intervals: Vec<f64>,
}

impl RrSequence {
    pub fn as_slice(&self) -> &[f64] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// The intervals in milliseconds, for display next to millisecond-scale metrics.
    pub fn to_millis(&self) -> Vec<f64> {
        self.intervals.iter().map(|rr| rr * 1e3).collect()
    }
}

impl From<Vec<f64>> for RrSequence {
    fn from(intervals: Vec<f64>) -> Self {
        Self { intervals }
    }
}

/// Computes `rr[k] = (peak[k+1] - peak[k]) / fs`.
///
/// Intervals are neither reordered nor screened for implausible values.
///
/// # Errors
///
/// Returns [`StressError::InvalidWaveform`] if `fs` is not finite and positive,
/// and [`StressError::InsufficientPeaks`] if fewer than two peaks are given.
///
/// # Examples
///
/// ```
/// use ppg_stress::detection::peaks::PeakSet;
/// use ppg_stress::detection::rr::rr_intervals;
///
/// let peaks = PeakSet::from_indices(vec![100, 225, 345]);
/// let rr = rr_intervals(&peaks, 125.0).unwrap();
/// assert_eq!(rr.as_slice(), &[1.0, 0.96]);
/// ```
pub fn rr_intervals(peaks: &PeakSet, fs: f64) -> Result<RrSequence> {
    validate_fs(fs)?;
    if peaks.len() < 2 {
        return Err(StressError::InsufficientPeaks { found: peaks.len() });
    }
    let intervals = peaks
        .indices()
        .windows(2)
        .map(|w| (w[1] - w[0]) as f64 / fs)
        .collect();
    Ok(RrSequence { intervals })
}

/// Peak positions in seconds from the start of the waveform.
///
/// # Errors
///
/// Returns [`StressError::InvalidWaveform`] if `fs` is not finite and positive.
pub fn peak_times(peaks: &PeakSet, fs: f64) -> Result<Vec<f64>> {
    validate_fs(fs)?;
    Ok(peaks.indices().iter().map(|&i| i as f64 / fs).collect())
}
