//! This module contains submodules for band-limiting the raw waveform.
//!
//! The `butterworth` submodule designs bandpass coefficients from cutoff frequencies.
//! The `filtfilt` submodule applies them with zero phase distortion.
pub mod butterworth;
pub mod filtfilt;
