//! This module provides functions to calculate time-domain measures of heart rate variability (HRV).
//!
//! All functions take RR intervals in seconds and report seconds (or percent, or
//! beats per minute). Currently the following metrics can be calculated:
//! - Root Mean Square of Successive Differences (RMSSD)
//! - Percentage of successive differences above a threshold (pNNx, pNN50)
//! - Standard Deviation of RR intervals (SDRR)
//! - Mean heart rate

use crate::detection::rr::RrSequence;
use crate::error::{Result, StressError};
use nalgebra::{DVector, DVectorView};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Successive-difference threshold of pNN50, in seconds.
pub const NN50_THRESHOLD_SECS: f64 = 0.05;

/// Successive differences `rr[k+1] - rr[k]`.
///
/// # Errors
///
/// Returns [`StressError::InsufficientIntervals`] for fewer than two intervals.
fn successive_diffs(data: &[f64]) -> Result<DVector<f64>> {
    if data.len() < 2 {
        return Err(StressError::InsufficientIntervals { found: data.len() });
    }
    let rr_points_a = DVectorView::from(&data[0..data.len() - 1]);
    let rr_points_b = DVectorView::from(&data[1..]);
    Ok(rr_points_b - rr_points_a)
}

/// Calculates the Root Mean Square of Successive Differences (RMSSD) from a slice of RR intervals.
///
/// RMSSD is a time-domain measure of heart rate variability, which is the square root of the mean
/// of the squares of the successive differences between adjacent RR intervals.
///
/// # Arguments
///
/// * `data` - A slice of RR intervals in seconds.
///
/// # Returns
///
/// * `Result<f64>` - The RMSSD in seconds.
///
/// # Errors
///
/// Returns [`StressError::InsufficientIntervals`] if the input slice contains fewer than two elements.
pub fn calc_rmssd(data: &[f64]) -> Result<f64> {
    let successive_diffs = successive_diffs(data)?;
    Ok((successive_diffs.dot(&successive_diffs) / (successive_diffs.len() as f64)).sqrt())
}

/// Calculates the percentage of successive differences whose magnitude exceeds `threshold`.
///
/// # Arguments
///
/// * `data` - A slice of RR intervals in seconds.
/// * `threshold` - Difference threshold in seconds; a difference counts when strictly larger.
///
/// # Errors
///
/// Returns [`StressError::InsufficientIntervals`] if the input slice contains fewer than two elements.
pub fn calc_pnnx(data: &[f64], threshold: f64) -> Result<f64> {
    let successive_diffs = successive_diffs(data)?;
    let count = successive_diffs
        .iter()
        .filter(|d| d.abs() > threshold)
        .count();
    Ok(100.0 * count as f64 / successive_diffs.len() as f64)
}

/// Calculates pNN50: the percentage of successive differences larger than 50 ms.
///
/// # Examples
///
/// ```
/// use ppg_stress::analysis::time::calc_pnn50;
/// let rr = [0.80, 0.90, 0.88, 0.70];
/// // diffs 0.10, -0.02, -0.18: two of three exceed 50 ms
/// assert!((calc_pnn50(&rr).unwrap() - 200.0 / 3.0).abs() < 1e-9);
/// ```
pub fn calc_pnn50(data: &[f64]) -> Result<f64> {
    calc_pnnx(data, NN50_THRESHOLD_SECS)
}

/// Calculates the Standard Deviation of RR intervals (SDRR) from a slice of RR intervals.
///
/// SDRR is a time-domain measure of heart rate variability, which is the standard deviation
/// of the RR intervals.
///
/// # Errors
///
/// Returns [`StressError::InsufficientIntervals`] if the input slice contains fewer than two elements.
pub fn calc_sdrr(data: &[f64]) -> Result<f64> {
    if data.len() < 2 {
        return Err(StressError::InsufficientIntervals { found: data.len() });
    }
    let variance = DVectorView::from(data).variance();
    Ok(variance.sqrt())
}

/// Mean heart rate in beats per minute, `60 / mean(rr)`.
///
/// # Errors
///
/// Returns [`StressError::InsufficientIntervals`] for an empty slice and
/// [`StressError::InvalidIntervals`] if the mean interval is not finite and positive.
pub fn calc_mean_heart_rate(data: &[f64]) -> Result<f64> {
    if data.is_empty() {
        return Err(StressError::InsufficientIntervals { found: 0 });
    }
    let mean = DVectorView::from(data).mean();
    if !mean.is_finite() || mean <= 0.0 {
        return Err(StressError::invalid_intervals(format!(
            "mean RR interval must be finite and positive, got {mean}"
        )));
    }
    Ok(60.0 / mean)
}

/// Time-domain HRV metrics of one RR sequence.
///
/// `rmssd` and `sdrr` are in seconds, `pnn50` in percent, `mean_heart_rate` in
/// beats per minute.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HrvResult {
    pub rmssd: f64,
    pub pnn50: f64,
    pub sdrr: f64,
    pub mean_heart_rate: f64,
}

impl HrvResult {
    /// Computes every metric of the struct.
    ///
    /// # Errors
    ///
    /// Returns [`StressError::InsufficientIntervals`] if the sequence holds fewer than two
    /// intervals, and [`StressError::InvalidIntervals`] as [`calc_mean_heart_rate`] does.
    pub fn from_rr(rr: &RrSequence) -> Result<Self> {
        let data = rr.as_slice();
        Ok(Self {
            rmssd: calc_rmssd(data)?,
            pnn50: calc_pnn50(data)?,
            sdrr: calc_sdrr(data)?,
            mean_heart_rate: calc_mean_heart_rate(data)?,
        })
    }

    /// RMSSD converted to milliseconds.
    pub fn rmssd_ms(&self) -> f64 {
        self.rmssd * 1e3
    }

    /// SDRR converted to milliseconds.
    pub fn sdrr_ms(&self) -> f64 {
        self.sdrr * 1e3
    }
}
