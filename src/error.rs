//! Error taxonomy shared by all pipeline stages.
//!
//! Every stage returns a [`StressError`] on failure. The pipeline entry points in
//! [`crate::pipeline`] wrap these into [`anyhow::Error`] with stage context; the
//! typed error stays reachable through `downcast_ref::<StressError>()`.

use thiserror::Error;

/// Failure of a single pipeline stage.
///
/// All variants are terminal for the stage that produced them: the input cannot
/// produce the requested output, and nothing is retried or partially computed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StressError {
    /// The waveform supplied at the boundary fails basic sanity checks.
    #[error("invalid waveform: {reason}")]
    InvalidWaveform { reason: String },

    /// Cutoff frequencies, order or sample rate do not describe a realizable bandpass.
    #[error("invalid filter specification: {reason}")]
    InvalidFilterSpec { reason: String },

    /// The waveform is too short for the padding used by forward-backward filtering.
    #[error("signal too short for zero-phase filtering: {len} samples, need at least {min_len}")]
    SignalTooShort { len: usize, min_len: usize },

    /// Peak detection parameters are out of range.
    #[error("invalid peak detection parameters: {reason}")]
    InvalidPeakParams { reason: String },

    /// Fewer than two peaks were detected, so no RR interval exists.
    #[error("insufficient peaks: found {found}, need at least 2 to form an RR interval")]
    InsufficientPeaks { found: usize },

    /// Fewer than two RR intervals, so no successive difference exists.
    #[error("insufficient RR intervals: found {found}, need at least 2")]
    InsufficientIntervals { found: usize },

    /// RR intervals that cannot describe a heart rhythm.
    #[error("invalid RR intervals: {reason}")]
    InvalidIntervals { reason: String },

    /// Classification thresholds are inconsistent.
    #[error("invalid stress thresholds: {reason}")]
    InvalidThresholds { reason: String },
}

impl StressError {
    pub(crate) fn invalid_waveform(reason: impl Into<String>) -> Self {
        StressError::InvalidWaveform {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_filter_spec(reason: impl Into<String>) -> Self {
        StressError::InvalidFilterSpec {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_peak_params(reason: impl Into<String>) -> Self {
        StressError::InvalidPeakParams {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_intervals(reason: impl Into<String>) -> Self {
        StressError::InvalidIntervals {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_thresholds(reason: impl Into<String>) -> Self {
        StressError::InvalidThresholds {
            reason: reason.into(),
        }
    }
}

/// Result alias used by the individual stages.
pub type Result<T> = std::result::Result<T, StressError>;
