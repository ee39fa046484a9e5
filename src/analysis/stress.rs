//! Classification of HRV metrics into a discrete stress level.
//!
//! The module includes:
//!
//! - `StressLabel` enum: The three stress levels.
//! - `StressThresholds` struct: The named threshold configuration, in seconds and percent.
//! - `StressClassifier` trait: Defines the interface for classification policies.
//! - `ThresholdClassifier` struct: The three-branch decision table.
//! - `ClassificationStrategy` enum: Selects the decision table or a user provided classifier.
//!
//! # Decision table
//!
//! Rules are evaluated top to bottom; the first match wins.
//!
//! | Label    | Rule                                                   |
//! |----------|--------------------------------------------------------|
//! | High     | `rmssd < rmssd_low` **or** `pnn50 < pnn50_low`         |
//! | Low      | `rmssd > rmssd_high` **and** `pnn50 > pnn50_high`      |
//! | Moderate | otherwise                                              |
//!
//! # Example
//!
//! ```rust
//! use ppg_stress::analysis::stress::{StressClassifier, StressLabel, ThresholdClassifier};
//! use ppg_stress::analysis::time::HrvResult;
//!
//! let hrv = HrvResult { rmssd: 0.055, pnn50: 25.0, ..Default::default() };
//! let label = ThresholdClassifier::default().classify(&hrv);
//! assert_eq!(label, StressLabel::Low);
//! assert_eq!(label.to_string(), "Low Stress");
//! ```

use crate::analysis::time::HrvResult;
use crate::error::{Result, StressError};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// RMSSD below this (seconds) indicates high stress.
pub const DEFAULT_RMSSD_LOW_SECS: f64 = 0.020;
/// RMSSD above this (seconds) is required for low stress.
pub const DEFAULT_RMSSD_HIGH_SECS: f64 = 0.040;
/// pNN50 below this (percent) indicates high stress.
pub const DEFAULT_PNN50_LOW_PCT: f64 = 3.0;
/// pNN50 above this (percent) is required for low stress.
pub const DEFAULT_PNN50_HIGH_PCT: f64 = 10.0;

/// Estimated autonomic stress level.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StressLabel {
    High,
    Moderate,
    Low,
}

impl fmt::Display for StressLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StressLabel::High => "High Stress",
            StressLabel::Moderate => "Moderate Stress",
            StressLabel::Low => "Low Stress",
        };
        f.write_str(label)
    }
}

/// Threshold configuration of [`ThresholdClassifier`].
///
/// RMSSD thresholds are in seconds, matching [`HrvResult::rmssd`]; pNN50
/// thresholds are in percent.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StressThresholds {
    pub rmssd_low: f64,
    pub rmssd_high: f64,
    pub pnn50_low: f64,
    pub pnn50_high: f64,
}

impl Default for StressThresholds {
    fn default() -> Self {
        Self {
            rmssd_low: DEFAULT_RMSSD_LOW_SECS,
            rmssd_high: DEFAULT_RMSSD_HIGH_SECS,
            pnn50_low: DEFAULT_PNN50_LOW_PCT,
            pnn50_high: DEFAULT_PNN50_HIGH_PCT,
        }
    }
}

impl StressThresholds {
    /// Checks that every threshold is finite and non-negative, that each low
    /// threshold does not exceed its high counterpart, and that the pNN50
    /// thresholds lie within 0-100 %.
    ///
    /// # Errors
    ///
    /// Returns [`StressError::InvalidThresholds`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        let all = [
            ("rmssd_low", self.rmssd_low),
            ("rmssd_high", self.rmssd_high),
            ("pnn50_low", self.pnn50_low),
            ("pnn50_high", self.pnn50_high),
        ];
        if let Some((name, value)) = all.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            return Err(StressError::invalid_thresholds(format!(
                "{name} must be finite and non-negative, got {value}"
            )));
        }
        if self.rmssd_low > self.rmssd_high {
            return Err(StressError::invalid_thresholds(format!(
                "rmssd_low ({}) exceeds rmssd_high ({})",
                self.rmssd_low, self.rmssd_high
            )));
        }
        if self.pnn50_low > self.pnn50_high {
            return Err(StressError::invalid_thresholds(format!(
                "pnn50_low ({}) exceeds pnn50_high ({})",
                self.pnn50_low, self.pnn50_high
            )));
        }
        if self.pnn50_high > 100.0 {
            return Err(StressError::invalid_thresholds(format!(
                "pnn50_high ({}) exceeds 100 %",
                self.pnn50_high
            )));
        }
        Ok(())
    }
}

/// A policy mapping HRV metrics to a stress label.
///
/// # Example
///
/// ```
/// use ppg_stress::analysis::stress::{StressClassifier, StressLabel};
/// use ppg_stress::analysis::time::HrvResult;
///
/// struct AlwaysModerate;
///
/// impl StressClassifier for AlwaysModerate {
///     fn classify(&self, _hrv: &HrvResult) -> StressLabel {
///         StressLabel::Moderate
///     }
/// }
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait StressClassifier {
    /// Classifies one set of HRV metrics. Must be a pure function of `hrv`.
    fn classify(&self, hrv: &HrvResult) -> StressLabel;
}

/// The three-branch decision table of the module documentation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThresholdClassifier {
    pub thresholds: StressThresholds,
}

impl ThresholdClassifier {
    /// # Errors
    ///
    /// Returns [`StressError::InvalidThresholds`] if `thresholds` fails validation.
    pub fn new(thresholds: StressThresholds) -> Result<Self> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }
}

impl StressClassifier for ThresholdClassifier {
    fn classify(&self, hrv: &HrvResult) -> StressLabel {
        let t = &self.thresholds;
        if hrv.rmssd < t.rmssd_low || hrv.pnn50 < t.pnn50_low {
            StressLabel::High
        } else if hrv.rmssd > t.rmssd_high && hrv.pnn50 > t.pnn50_high {
            StressLabel::Low
        } else {
            StressLabel::Moderate
        }
    }
}

/// Available classification strategies for the pipeline.
/// user provided classifiers can be passed via the `Custom` variant.
pub enum ClassificationStrategy {
    /// The decision table with the given thresholds.
    Thresholds(StressThresholds),
    /// A custom classifier that implements the `StressClassifier` trait.
    /// It must be `Send + Sync` so batches can be classified in parallel.
    Custom(Box<dyn StressClassifier + Send + Sync>),
}

impl Default for ClassificationStrategy {
    fn default() -> Self {
        ClassificationStrategy::Thresholds(StressThresholds::default())
    }
}

impl fmt::Debug for ClassificationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationStrategy::Thresholds(t) => f.debug_tuple("Thresholds").field(t).finish(),
            ClassificationStrategy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

// implement the trait for the enum to dispatch classification
impl StressClassifier for ClassificationStrategy {
    fn classify(&self, hrv: &HrvResult) -> StressLabel {
        match self {
            ClassificationStrategy::Thresholds(thresholds) => ThresholdClassifier {
                thresholds: *thresholds,
            }
            .classify(hrv),
            ClassificationStrategy::Custom(classifier) => classifier.classify(hrv),
        }
    }
}
