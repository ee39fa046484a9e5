//! Uniformly sampled single-channel waveform.

use crate::error::{Result, StressError};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A fully buffered, uniformly sampled signal.
///
/// A `Waveform` can only be built through [`Waveform::new`], which guarantees a
/// non-empty, finite sample sequence and a finite, positive sample rate. It is
/// immutable afterwards; stages that transform it return a new `Waveform`.
///
/// # Example
///
/// ```
/// use ppg_stress::waveform::Waveform;
///
/// let wave = Waveform::new(vec![0.0, 1.0, 0.0, -1.0], 4.0).unwrap();
/// assert_eq!(wave.len(), 4);
/// assert_eq!(wave.duration_secs(), 1.0);
/// assert!(Waveform::new(vec![], 4.0).is_err());
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawWaveform"))]
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f64>,
    fs: f64,
}

/// Unchecked wire form; deserialization goes through [`Waveform::new`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawWaveform {
    samples: Vec<f64>,
    fs: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawWaveform> for Waveform {
    type Error = StressError;

    fn try_from(raw: RawWaveform) -> Result<Self> {
        Waveform::new(raw.samples, raw.fs)
    }
}

/// Checks that `fs` is a usable sample rate.
pub(crate) fn validate_fs(fs: f64) -> Result<()> {
    if !fs.is_finite() || fs <= 0.0 {
        return Err(StressError::invalid_waveform(format!(
            "sample rate must be finite and positive, got {fs}"
        )));
    }
    Ok(())
}

impl Waveform {
    /// Creates a waveform from samples and a sample rate in Hz.
    ///
    /// # Errors
    ///
    /// Returns [`StressError::InvalidWaveform`] if `samples` is empty, contains
    /// NaN or infinite values, or if `fs` is not a finite positive number.
    pub fn new(samples: Vec<f64>, fs: f64) -> Result<Self> {
        validate_fs(fs)?;
        if samples.is_empty() {
            return Err(StressError::invalid_waveform("sample sequence is empty"));
        }
        if let Some(idx) = samples.iter().position(|x| !x.is_finite()) {
            return Err(StressError::invalid_waveform(format!(
                "sample {idx} is not finite"
            )));
        }
        Ok(Self { samples, fs })
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Sample rate in Hz.
    pub fn fs(&self) -> f64 {
        self.fs
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.fs
    }

    /// Consumes the waveform, returning the raw samples.
    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }
}
