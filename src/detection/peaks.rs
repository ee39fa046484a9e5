//! Heartbeat peak detection on a filtered waveform.
//!
//! A sample qualifies as a peak when it is a strict local maximum whose
//! prominence reaches `min_prominence`. Qualifying peaks closer than
//! `min_distance` samples are thinned out, keeping the taller one.
//!
//! # Example
//!
//! ```rust
//! use ppg_stress::detection::peaks::{find_peaks, PeakParams};
//!
//! let signal = [0.0, 1.0, 0.0, 0.4, 0.0, 2.0, 0.0];
//! let params = PeakParams::new(3, 0.5).unwrap();
//! let peaks = find_peaks(&signal, &params).unwrap();
//! assert_eq!(peaks.indices(), &[1, 5]);
//! ```

use crate::error::{Result, StressError};
use log::debug;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters of the peak detector.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakParams {
    /// Minimum spacing between accepted peaks, in samples.
    pub min_distance: usize,
    /// Minimum prominence, in the amplitude units of the filtered signal.
    pub min_prominence: f64,
}

impl PeakParams {
    /// # Errors
    ///
    /// Returns [`StressError::InvalidPeakParams`] if `min_distance` is zero or
    /// `min_prominence` is negative or not finite.
    pub fn new(min_distance: usize, min_prominence: f64) -> Result<Self> {
        let params = Self {
            min_distance,
            min_prominence,
        };
        params.validate()?;
        Ok(params)
    }

    /// Derives the sample distance from a duration, as `floor(fs * secs)`.
    ///
    /// A typical choice is 0.5 s, which caps the detectable rate at 120 bpm.
    ///
    /// # Errors
    ///
    /// Returns [`StressError::InvalidPeakParams`] if the duration or `fs` is not
    /// positive, or if the resulting distance rounds down to zero samples.
    pub fn from_secs(min_distance_secs: f64, min_prominence: f64, fs: f64) -> Result<Self> {
        if !(min_distance_secs.is_finite() && min_distance_secs > 0.0) {
            return Err(StressError::invalid_peak_params(format!(
                "minimum distance must be positive, got {min_distance_secs} s"
            )));
        }
        if !(fs.is_finite() && fs > 0.0) {
            return Err(StressError::invalid_peak_params(format!(
                "sample rate must be positive, got {fs} Hz"
            )));
        }
        Self::new((fs * min_distance_secs).floor() as usize, min_prominence)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_distance == 0 {
            return Err(StressError::invalid_peak_params(
                "minimum distance must be at least one sample",
            ));
        }
        if !self.min_prominence.is_finite() || self.min_prominence < 0.0 {
            return Err(StressError::invalid_peak_params(format!(
                "minimum prominence must be finite and non-negative, got {}",
                self.min_prominence
            )));
        }
        Ok(())
    }
}

/// Strictly increasing sample indices of detected heartbeats.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "RawPeakSet"))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeakSet {
    indices: Vec<usize>,
}

/// Unchecked wire form; deserialization goes through [`PeakSet::from_indices`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawPeakSet {
    indices: Vec<usize>,
}

#[cfg(feature = "serde")]
impl From<RawPeakSet> for PeakSet {
    fn from(raw: RawPeakSet) -> Self {
        PeakSet::from_indices(raw.indices)
    }
}

impl PeakSet {
    /// Builds a peak set from indices, sorting and removing duplicates.
    pub fn from_indices(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Self { indices }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Peaks with an index strictly below `limit`.
    pub fn before(&self, limit: usize) -> &[usize] {
        let end = self.indices.partition_point(|&i| i < limit);
        &self.indices[..end]
    }
}

/// A local maximum together with its prominence.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    index: usize,
    height: f64,
    prominence: f64,
}

/// Finds heartbeat peaks in `signal`.
///
/// # Arguments
///
/// * `signal` - The filtered waveform samples.
/// * `params` - Minimum spacing and prominence.
///
/// Prominence is screened before distance selection, so a low-prominence
/// maximum never suppresses a prominent neighbor. `scipy.signal.find_peaks`
/// applies `distance` first, which can yield fewer peaks on the same input.
///
/// # Returns
///
/// The qualifying peaks in increasing index order. An empty set is not an error;
/// it is returned for short or flat signals and for signals without prominent
/// maxima.
///
/// # Errors
///
/// Returns [`StressError::InvalidPeakParams`] if `params` fails validation.
pub fn find_peaks(signal: &[f64], params: &PeakParams) -> Result<PeakSet> {
    params.validate()?;

    let candidates: Vec<Candidate> = local_maxima(signal)
        .map(|index| Candidate {
            index,
            height: signal[index],
            prominence: prominence(signal, index),
        })
        .filter(|c| c.prominence >= params.min_prominence)
        .collect();
    let n_candidates = candidates.len();

    let peaks = select_by_distance(candidates, params.min_distance);
    debug!(
        "detected {} peaks from {} prominent maxima in {} samples",
        peaks.len(),
        n_candidates,
        signal.len()
    );
    Ok(peaks)
}

/// Indices of strict local maxima; the first and last sample never qualify.
fn local_maxima(signal: &[f64]) -> impl Iterator<Item = usize> + '_ {
    signal
        .windows(3)
        .enumerate()
        .filter(|(_, w)| w[1] > w[0] && w[1] > w[2])
        .map(|(i, _)| i + 1)
}

/// Vertical drop from `signal[peak]` to the higher of the two surrounding minima.
///
/// Each side is searched until a sample at least as high as the peak, or the
/// end of the signal, is reached.
fn prominence(signal: &[f64], peak: usize) -> f64 {
    let height = signal[peak];
    let left_min = side_min(signal[..peak].iter().rev(), height);
    let right_min = side_min(signal[peak + 1..].iter(), height);
    height - left_min.max(right_min)
}

fn side_min<'a>(side: impl Iterator<Item = &'a f64>, height: f64) -> f64 {
    side.take_while(|&&x| x < height).fold(height, |m, &x| m.min(x))
}

/// Keeps the highest-priority peak of every cluster closer than `min_distance`.
///
/// Priority: larger height, then larger prominence, then earlier index.
fn select_by_distance(candidates: Vec<Candidate>, min_distance: usize) -> PeakSet {
    let mut priority: Vec<usize> = (0..candidates.len()).collect();
    priority.sort_by(|&a, &b| {
        let (ca, cb) = (&candidates[a], &candidates[b]);
        cb.height
            .total_cmp(&ca.height)
            .then_with(|| cb.prominence.total_cmp(&ca.prominence))
            .then_with(|| ca.index.cmp(&cb.index))
    });

    let mut keep = vec![true; candidates.len()];
    for &i in &priority {
        if !keep[i] {
            continue;
        }
        let index = candidates[i].index;
        // candidates are in index order, so neighbors are contiguous on both sides
        for j in (0..i).rev() {
            if index - candidates[j].index >= min_distance {
                break;
            }
            keep[j] = false;
        }
        for j in i + 1..candidates.len() {
            if candidates[j].index - index >= min_distance {
                break;
            }
            keep[j] = false;
        }
    }

    PeakSet {
        indices: candidates
            .iter()
            .zip(keep)
            .filter_map(|(c, k)| k.then_some(c.index))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn params(min_distance: usize, min_prominence: f64) -> PeakParams {
        PeakParams::new(min_distance, min_prominence).unwrap()
    }

    #[test]
    fn test_invalid_params() {
        assert!(PeakParams::new(0, 0.1).is_err());
        assert!(PeakParams::new(10, -0.1).is_err());
        assert!(PeakParams::new(10, f64::NAN).is_err());
        assert!(PeakParams::from_secs(0.5, 0.05, 1.0).is_err(), "0.5 samples rounds to zero.");
        assert!(PeakParams::from_secs(-0.5, 0.05, 125.0).is_err());
    }

    #[test]
    fn test_from_secs_floors() {
        let p = PeakParams::from_secs(0.5, 0.05, 125.0).unwrap();
        assert_eq!(p.min_distance, 62);
        let p = PeakParams::from_secs(0.5, 0.05, 250.0).unwrap();
        assert_eq!(p.min_distance, 125);
    }

    #[test]
    fn test_boundaries_never_qualify() {
        let signal = [3.0, 1.0, 2.0, 1.0, 3.0];
        let peaks = find_peaks(&signal, &params(1, 0.0)).unwrap();
        assert_eq!(peaks.indices(), &[2]);
    }

    #[test]
    fn test_plateau_is_not_strict_maximum() {
        let signal = [0.0, 1.0, 1.0, 0.0];
        let peaks = find_peaks(&signal, &params(1, 0.0)).unwrap();
        assert!(peaks.is_empty(), "A flat top has no strict maximum.");
    }

    #[test]
    fn test_empty_and_tiny_signals() {
        for signal in [&[][..], &[1.0][..], &[1.0, 2.0][..]] {
            let peaks = find_peaks(signal, &params(1, 0.0)).unwrap();
            assert!(peaks.is_empty());
        }
    }

    #[test]
    fn test_prominence() {
        let signal = [0.0, 2.0, 1.0, 3.0, 0.5, 1.5, 0.0];
        // peak 1: left min 0, right side stops at 3.0 with min 1.0 -> 2 - 1
        assert_eq!(prominence(&signal, 1), 1.0);
        // peak 3: global max, both sides run to the ends -> 3 - 0
        assert_eq!(prominence(&signal, 3), 3.0);
        // peak 5: left stops at 3.0 with min 0.5, right min 0 -> 1.5 - 0.5
        assert_eq!(prominence(&signal, 5), 1.0);
    }

    #[test]
    fn test_prominence_stops_at_equal_height() {
        let signal = [0.0, 2.0, 1.0, 2.0, -5.0];
        // left peak stops at the equal peak on the right: 2 - max(0, 1)
        assert_eq!(prominence(&signal, 1), 1.0);
    }

    #[test]
    fn test_min_prominence_filters() {
        let signal = [0.0, 2.0, 1.0, 3.0, 0.5, 1.5, 0.0];
        let peaks = find_peaks(&signal, &params(1, 1.5)).unwrap();
        assert_eq!(peaks.indices(), &[3]);
    }

    #[test]
    fn test_distance_keeps_taller_peak() {
        let signal = [0.0, 1.0, 0.0, 3.0, 0.0, 2.0, 0.0];
        let peaks = find_peaks(&signal, &params(3, 0.0)).unwrap();
        assert_eq!(peaks.indices(), &[3]);
        let peaks = find_peaks(&signal, &params(2, 0.0)).unwrap();
        assert_eq!(peaks.indices(), &[1, 3, 5]);
    }

    #[test]
    fn test_distance_tie_breaks_on_prominence() {
        // equal heights at 1 and 3; the one at 3 has the deeper valley on its right
        let signal = [1.5, 2.0, 0.0, 2.0, -1.0];
        assert_eq!(prominence(&signal, 1), 0.5);
        assert_eq!(prominence(&signal, 3), 2.0);
        let peaks = find_peaks(&signal, &params(3, 0.0)).unwrap();
        assert_eq!(peaks.indices(), &[3]);
    }

    #[test]
    fn test_distance_tie_breaks_on_index() {
        let signal = [0.0, 1.0, 0.0, 1.0, 0.0];
        let peaks = find_peaks(&signal, &params(3, 0.0)).unwrap();
        assert_eq!(peaks.indices(), &[1]);
    }

    #[test]
    fn test_periodic_signal() {
        let fs = 125.0;
        let rate = 1.2;
        let duration = 30.0;
        let signal: Vec<f64> = (0..(fs * duration) as usize)
            .map(|i| (2.0 * PI * rate * i as f64 / fs).sin())
            .collect();
        let p = PeakParams::from_secs(0.5, 0.05, fs).unwrap();
        let peaks = find_peaks(&signal, &p).unwrap();

        let expected = (duration * rate).floor() as i64;
        assert!((peaks.len() as i64 - expected).abs() <= 1);
        let period = fs / rate;
        for w in peaks.indices().windows(2) {
            let spacing = (w[1] - w[0]) as f64;
            assert!(
                (spacing - period).abs() <= 1.0,
                "Spacing {spacing} deviates from period {period}."
            );
        }
    }

    #[test]
    fn test_low_prominence_maximum_does_not_suppress_neighbor() {
        // index 3 is taller than index 1 but only 0.05 above its right-hand dip
        let signal = [0.0, 2.0, 0.0, 2.5, 2.45, 2.45, 2.45, 6.0, 0.0];
        let peaks = find_peaks(&signal, &params(3, 0.5)).unwrap();
        assert_eq!(peaks.indices(), &[1, 7]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_sorts_indices() {
        let peaks: PeakSet = serde_json::from_str(r#"{"indices":[500,10,500,90]}"#).unwrap();
        assert_eq!(peaks.indices(), &[10, 90, 500]);
    }

    #[test]
    fn test_before() {
        let peaks = PeakSet::from_indices(vec![900, 10, 1200, 500]);
        assert_eq!(peaks.indices(), &[10, 500, 900, 1200]);
        assert_eq!(peaks.before(1000), &[10, 500, 900]);
        assert_eq!(peaks.before(10), &[] as &[usize]);
    }
}
