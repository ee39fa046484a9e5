//! End-to-end stress estimation.
//!
//! [`StressPipeline`] composes the stages in order:
//!
//! 1. design the bandpass for the waveform's sample rate and filter with zero phase,
//! 2. detect peaks in the filtered waveform,
//! 3. convert peaks to RR intervals,
//! 4. compute the HRV metrics,
//! 5. classify.
//!
//! Each stage is also callable on its own through its module. Stage failures
//! are returned as [`anyhow::Error`] with the failing stage as context; the
//! underlying [`StressError`] is available through `downcast_ref`.
//!
//! # Example
//!
//! ```rust
//! use ppg_stress::pipeline::estimate_stress;
//! use ppg_stress::config::StressConfig;
//! use ppg_stress::waveform::Waveform;
//! use ppg_stress::StressError;
//!
//! let fs = 125.0;
//! let samples = (0..(30.0 * fs) as usize)
//!     .map(|i| (2.0 * std::f64::consts::PI * 1.2 * i as f64 / fs).sin())
//!     .collect::<Vec<f64>>();
//! let wave = Waveform::new(samples, fs).unwrap();
//! let report = estimate_stress(&wave, &StressConfig::default()).unwrap();
//! println!("{}: RMSSD {:.2} ms, pNN50 {:.2} %", report.label, report.hrv.rmssd_ms(), report.hrv.pnn50);
//!
//! let flat = Waveform::new(vec![0.0; 500], fs).unwrap();
//! let err = estimate_stress(&flat, &StressConfig::default()).unwrap_err();
//! assert!(matches!(err.downcast_ref::<StressError>(), Some(StressError::InsufficientPeaks { .. })));
//! ```

use crate::analysis::stress::{ClassificationStrategy, StressClassifier, StressLabel};
use crate::analysis::time::HrvResult;
use crate::config::StressConfig;
use crate::detection::peaks::{find_peaks, PeakSet};
use crate::detection::rr::{rr_intervals, RrSequence};
use crate::error::StressError;
use crate::preprocessing::filtfilt::filtfilt;
use crate::waveform::Waveform;
use anyhow::{Context, Result};
use log::debug;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Everything one pipeline run produced, for the presentation layer.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct StressReport {
    /// The bandpass-filtered waveform, same length and rate as the input.
    pub filtered: Waveform,
    pub peaks: PeakSet,
    pub rr: RrSequence,
    pub hrv: HrvResult,
    pub label: StressLabel,
}

impl StressReport {
    /// The first `n` filtered samples together with the peaks that fall inside them.
    pub fn preview(&self, n: usize) -> (&[f64], &[usize]) {
        let samples = self.filtered.samples();
        let n = n.min(samples.len());
        (&samples[..n], self.peaks.before(n))
    }
}

/// A configured pipeline; cheap to share across threads.
#[derive(Debug, Default)]
pub struct StressPipeline {
    config: StressConfig,
    classifier: ClassificationStrategy,
}

impl StressPipeline {
    /// A pipeline classifying with `config.thresholds`.
    pub fn new(config: StressConfig) -> Self {
        Self {
            classifier: ClassificationStrategy::Thresholds(config.thresholds),
            config,
        }
    }

    /// A pipeline classifying with `classifier`; `config.thresholds` is then unused.
    pub fn with_classifier(config: StressConfig, classifier: ClassificationStrategy) -> Self {
        Self { config, classifier }
    }

    pub fn config(&self) -> &StressConfig {
        &self.config
    }

    /// Runs every stage on one waveform.
    ///
    /// # Errors
    ///
    /// Fails with the first stage error: `InvalidFilterSpec`, `SignalTooShort`,
    /// `InvalidPeakParams`, `InsufficientPeaks`, `InsufficientIntervals` or
    /// `InvalidThresholds`, each wrapped with the name of the stage.
    /// Nothing is logged on failure; reporting the error is left to the caller.
    pub fn analyze(&self, waveform: &Waveform) -> Result<StressReport> {
        let fs = waveform.fs();
        if let ClassificationStrategy::Thresholds(thresholds) = &self.classifier {
            thresholds
                .validate()
                .context("invalid classification thresholds")?;
        }

        let coeffs = self
            .config
            .filter
            .spec(fs)
            .and_then(|spec| spec.design())
            .context("bandpass design failed")?;
        let filtered = filtfilt(&coeffs, waveform).context("zero-phase filtering failed")?;

        let params = self
            .config
            .peaks
            .params(fs)
            .context("invalid peak detection parameters")?;
        let peaks = find_peaks(filtered.samples(), &params).context("peak detection failed")?;
        debug!(
            "{} peaks in {:.1} s of signal at {} Hz",
            peaks.len(),
            waveform.duration_secs(),
            fs
        );

        let rr = rr_intervals(&peaks, fs).context("RR interval computation failed")?;
        let hrv = HrvResult::from_rr(&rr).context("HRV metric computation failed")?;
        let label = self.classifier.classify(&hrv);
        debug!(
            "RMSSD {:.4} s, pNN50 {:.2} %, mean HR {:.1} bpm -> {}",
            hrv.rmssd, hrv.pnn50, hrv.mean_heart_rate, label
        );

        Ok(StressReport {
            filtered,
            peaks,
            rr,
            hrv,
            label,
        })
    }

    /// Analyzes independent waveforms in parallel.
    ///
    /// Results are returned in input order; one failing waveform does not
    /// affect the others.
    pub fn analyze_batch(&self, waveforms: &[Waveform]) -> Vec<Result<StressReport>> {
        waveforms.par_iter().map(|w| self.analyze(w)).collect()
    }
}

/// One-shot convenience around [`StressPipeline::analyze`].
pub fn estimate_stress(waveform: &Waveform, config: &StressConfig) -> Result<StressReport> {
    StressPipeline::new(*config).analyze(waveform)
}

/// Validates raw boundary data and runs the pipeline on it.
///
/// # Errors
///
/// Fails with [`StressError::InvalidWaveform`] if the samples or sample rate
/// are unusable, otherwise as [`StressPipeline::analyze`].
pub fn estimate_stress_from_samples(
    samples: Vec<f64>,
    fs: f64,
    config: &StressConfig,
) -> Result<StressReport> {
    let waveform = Waveform::new(samples, fs).context("rejected input waveform")?;
    estimate_stress(&waveform, config)
}

/// Extracts the typed stage error from a pipeline error, if there is one.
pub fn stage_error(err: &anyhow::Error) -> Option<&StressError> {
    err.downcast_ref::<StressError>()
}
