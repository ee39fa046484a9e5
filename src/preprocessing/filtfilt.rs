//! Zero-phase forward-backward filtering over a cascade of second-order sections.
//!
//! The signal is extended at both ends by odd reflection, filtered forward with
//! steady-state initial conditions, reversed, filtered again and reversed back.
//! The squared magnitude response doubles the effective order while the phase
//! contributions of the two passes cancel, so peaks stay where they were.
//!
//! # Example
//!
//! ```rust
//! use ppg_stress::preprocessing::butterworth::FilterSpec;
//! use ppg_stress::preprocessing::filtfilt::filtfilt;
//! use ppg_stress::waveform::Waveform;
//!
//! let fs = 125.0;
//! let samples = (0..1250)
//!     .map(|i| (2.0 * std::f64::consts::PI * 1.2 * i as f64 / fs).sin())
//!     .collect::<Vec<f64>>();
//! let wave = Waveform::new(samples, fs).unwrap();
//! let coeffs = FilterSpec::new(0.5, 5.0, 3, fs).unwrap().design().unwrap();
//! let filtered = filtfilt(&coeffs, &wave).unwrap();
//! assert_eq!(filtered.len(), wave.len());
//! ```

use crate::error::{Result, StressError};
use crate::preprocessing::butterworth::{FilterCoefficients, SecondOrderSection};
use crate::waveform::Waveform;
use log::debug;

/// Number of edge samples added on each side before filtering.
pub fn pad_len(coeffs: &FilterCoefficients) -> usize {
    3 * coeffs.ntaps()
}

/// Shortest signal [`sosfiltfilt`] accepts for these coefficients.
pub fn min_signal_len(coeffs: &FilterCoefficients) -> usize {
    pad_len(coeffs) + 1
}

/// Applies `coeffs` forward and backward to a waveform.
///
/// # Returns
///
/// A new waveform with the same length and sample rate as `waveform`.
///
/// # Errors
///
/// Returns [`StressError::SignalTooShort`] if the waveform has no more samples
/// than the edge padding requires.
pub fn filtfilt(coeffs: &FilterCoefficients, waveform: &Waveform) -> Result<Waveform> {
    let filtered = sosfiltfilt(coeffs, waveform.samples())?;
    Waveform::new(filtered, waveform.fs())
}

/// Slice-level forward-backward filtering.
///
/// # Errors
///
/// Returns [`StressError::SignalTooShort`] if `data.len() <= pad_len(coeffs)`.
pub fn sosfiltfilt(coeffs: &FilterCoefficients, data: &[f64]) -> Result<Vec<f64>> {
    let sections = coeffs.sections();
    let n = data.len();
    let pad = pad_len(coeffs);
    if n <= pad {
        return Err(StressError::SignalTooShort {
            len: n,
            min_len: pad + 1,
        });
    }
    if sections.is_empty() {
        return Ok(data.to_vec());
    }

    let zi = cascade_step_state(sections);
    let extended = odd_extend(data, pad);

    let mut forward = run_cascade(sections, &extended, &zi);
    forward.reverse();
    let mut backward = run_cascade(sections, &forward, &zi);
    backward.reverse();

    debug!(
        "zero-phase filtered {} samples through {} sections (padding {})",
        n,
        sections.len(),
        pad
    );
    Ok(backward[pad..pad + n].to_vec())
}

/// Point-reflects `pad` samples about each end of `data`.
///
/// Requires `pad < data.len()`.
fn odd_extend(data: &[f64], pad: usize) -> Vec<f64> {
    let n = data.len();
    let first = data[0];
    let last = data[n - 1];
    let mut out = Vec::with_capacity(n + 2 * pad);
    out.extend((1..=pad).rev().map(|i| 2.0 * first - data[i]));
    out.extend_from_slice(data);
    out.extend((1..=pad).map(|i| 2.0 * last - data[n - 1 - i]));
    out
}

/// Per-section state for a unit step applied to the whole cascade.
///
/// Each section sees the step scaled by the DC gain of every section before it.
fn cascade_step_state(sections: &[SecondOrderSection]) -> Vec<[f64; 2]> {
    let mut scale = 1.0;
    sections
        .iter()
        .map(|s| {
            let [z1, z2] = s.step_state();
            let state = [z1 * scale, z2 * scale];
            scale *= s.dc_gain();
            state
        })
        .collect()
}

/// Runs the cascade once over `data`, starting every section from `zi * data[0]`.
fn run_cascade(sections: &[SecondOrderSection], data: &[f64], zi: &[[f64; 2]]) -> Vec<f64> {
    let x0 = data[0];
    sections
        .iter()
        .zip(zi)
        .fold(data.to_vec(), |signal, (section, state)| {
            run_section(section, &signal, [state[0] * x0, state[1] * x0])
        })
}

/// Transposed direct form II.
fn run_section(section: &SecondOrderSection, data: &[f64], zi: [f64; 2]) -> Vec<f64> {
    let [b0, b1, b2] = section.b;
    let [_, a1, a2] = section.a;
    let [mut z1, mut z2] = zi;
    data.iter()
        .map(|&x| {
            let y = b0 * x + z1;
            z1 = b1 * x - a1 * y + z2;
            z2 = b2 * x - a2 * y;
            y
        })
        .collect()
}
