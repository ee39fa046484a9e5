/// This module contains submodules for heart rate variability (HRV) analysis.
///
/// The available submodules are:
///
/// - `stress`: Maps HRV metrics to a stress level.
/// - `time`: Provides time-domain analysis methods for HRV.
pub mod stress;
pub mod time;
