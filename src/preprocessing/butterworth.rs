//! Butterworth bandpass filter design.
//!
//! The design follows the classic analog-prototype route:
//!
//! 1. Place the `N` poles of the normalized analog Butterworth lowpass on the
//!    left half of the unit circle.
//! 2. Pre-warp both band edges so the bilinear transform lands them exactly on
//!    the requested digital frequencies.
//! 3. Transform lowpass to bandpass (`N` zeros at the origin, `2N` poles).
//! 4. Map to the z-plane with the bilinear transform (`N` zeros at `z = 1`,
//!    `N` zeros at `z = -1`).
//! 5. Group conjugate poles into second-order sections.
//!
//! Sections are kept as the primary representation because the expanded
//! transfer function of a narrow low-frequency band (0.5 Hz at 125 Hz, say)
//! is badly conditioned.
//!
//! # Example
//!
//! ```rust
//! use ppg_stress::preprocessing::butterworth::FilterSpec;
//!
//! let spec = FilterSpec::new(0.5, 5.0, 3, 125.0).unwrap();
//! let coeffs = spec.design().unwrap();
//! assert_eq!(coeffs.sections().len(), 3);
//! assert_eq!(coeffs.numerator().len(), 7);
//! ```

use crate::error::{Result, StressError};
use log::{debug, trace};
use num_complex::Complex64;
use std::f64::consts::PI;

/// Sample rate of the normalized bilinear transform; cutoffs arrive as fractions
/// of Nyquist, so Nyquist maps to 1 and the transform runs at `fs = 2`.
const NORMALIZED_FS: f64 = 2.0;

/// Imaginary parts below this are treated as real poles when pairing sections.
const REAL_POLE_EPS: f64 = 1e-12;

/// Validated parameters of a bandpass design.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSpec {
    lowcut: f64,
    highcut: f64,
    order: usize,
    fs: f64,
}

impl FilterSpec {
    /// Creates a bandpass specification.
    ///
    /// # Arguments
    ///
    /// * `lowcut` - Lower -3 dB edge in Hz.
    /// * `highcut` - Upper -3 dB edge in Hz.
    /// * `order` - Order of the lowpass prototype; the bandpass has twice as many poles.
    /// * `fs` - Sample rate in Hz.
    ///
    /// # Errors
    ///
    /// Returns [`StressError::InvalidFilterSpec`] unless
    /// `0 < lowcut < highcut < fs / 2` and `order >= 1`. Out-of-range values are
    /// never clamped.
    pub fn new(lowcut: f64, highcut: f64, order: usize, fs: f64) -> Result<Self> {
        let spec = Self {
            lowcut,
            highcut,
            order,
            fs,
        };
        spec.validate()?;
        Ok(spec)
    }

    fn validate(&self) -> Result<()> {
        if !self.fs.is_finite() || self.fs <= 0.0 {
            return Err(StressError::invalid_filter_spec(format!(
                "sample rate must be finite and positive, got {}",
                self.fs
            )));
        }
        if self.order == 0 {
            return Err(StressError::invalid_filter_spec("order must be at least 1"));
        }
        if !self.lowcut.is_finite() || !self.highcut.is_finite() {
            return Err(StressError::invalid_filter_spec(
                "cutoff frequencies must be finite",
            ));
        }
        if self.lowcut <= 0.0 || self.highcut <= 0.0 {
            return Err(StressError::invalid_filter_spec(format!(
                "cutoff frequencies must be positive, got {} and {} Hz",
                self.lowcut, self.highcut
            )));
        }
        if self.lowcut >= self.highcut {
            return Err(StressError::invalid_filter_spec(format!(
                "lowcut ({} Hz) must be below highcut ({} Hz)",
                self.lowcut, self.highcut
            )));
        }
        let nyquist = self.nyquist();
        if self.highcut >= nyquist {
            return Err(StressError::invalid_filter_spec(format!(
                "highcut ({} Hz) must be below the Nyquist frequency ({} Hz)",
                self.highcut, nyquist
            )));
        }
        Ok(())
    }

    pub fn lowcut(&self) -> f64 {
        self.lowcut
    }

    pub fn highcut(&self) -> f64 {
        self.highcut
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn fs(&self) -> f64 {
        self.fs
    }

    pub fn nyquist(&self) -> f64 {
        0.5 * self.fs
    }

    /// Band edges as fractions of Nyquist, both in `(0, 1)`.
    pub fn normalized_band(&self) -> (f64, f64) {
        let nyquist = self.nyquist();
        (self.lowcut / nyquist, self.highcut / nyquist)
    }

    /// Designs the Butterworth bandpass for this specification.
    pub fn design(&self) -> Result<FilterCoefficients> {
        butter_bandpass(self)
    }
}

/// One biquad `H(z) = (b0 + b1 z^-1 + b2 z^-2) / (1 + a1 z^-1 + a2 z^-2)`.
///
/// `a[0]` is always 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecondOrderSection {
    pub b: [f64; 3],
    pub a: [f64; 3],
}

impl SecondOrderSection {
    /// Gain of the section at DC (`z = 1`).
    pub fn dc_gain(&self) -> f64 {
        self.b.iter().sum::<f64>() / self.a.iter().sum::<f64>()
    }

    /// Steady-state delay-line state for a unit step input, in the transposed
    /// direct form II used by [`crate::preprocessing::filtfilt`].
    pub fn step_state(&self) -> [f64; 2] {
        let [_, b1, b2] = self.b;
        let [_, a1, a2] = self.a;
        let g = self.dc_gain();
        [(b1 + b2) - (a1 + a2) * g, b2 - a2 * g]
    }
}

/// Coefficients of a designed IIR filter, held as a cascade of second-order sections.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCoefficients {
    sections: Vec<SecondOrderSection>,
}

impl FilterCoefficients {
    pub fn sections(&self) -> &[SecondOrderSection] {
        &self.sections
    }

    /// Number of taps of the equivalent transfer function, as used for edge padding.
    ///
    /// Trailing zero coefficients shared by numerator and denominator (first-order
    /// sections) do not count.
    pub fn ntaps(&self) -> usize {
        let zero_b2 = self.sections.iter().filter(|s| s.b[2] == 0.0).count();
        let zero_a2 = self.sections.iter().filter(|s| s.a[2] == 0.0).count();
        2 * self.sections.len() + 1 - zero_b2.min(zero_a2)
    }

    /// Numerator of the equivalent transfer function, highest power of `z^-1` last.
    pub fn numerator(&self) -> Vec<f64> {
        self.sections
            .iter()
            .fold(vec![1.0], |acc, s| poly_mul(&acc, &s.b))
    }

    /// Denominator of the equivalent transfer function, normalized so `a[0] == 1`.
    pub fn denominator(&self) -> Vec<f64> {
        self.sections
            .iter()
            .fold(vec![1.0], |acc, s| poly_mul(&acc, &s.a))
    }

    /// Magnitude response at `freq` Hz for a filter running at `fs` Hz.
    pub fn magnitude_at(&self, freq: f64, fs: f64) -> f64 {
        let z_inv = Complex64::from_polar(1.0, -2.0 * PI * freq / fs);
        self.sections
            .iter()
            .map(|s| {
                let num = s.b[0] + z_inv * (s.b[1] + z_inv * s.b[2]);
                let den = s.a[0] + z_inv * (s.a[1] + z_inv * s.a[2]);
                (num / den).norm()
            })
            .product()
    }
}

fn poly_mul(p: &[f64], q: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; p.len() + q.len() - 1];
    for (i, &pi) in p.iter().enumerate() {
        for (j, &qj) in q.iter().enumerate() {
            out[i + j] += pi * qj;
        }
    }
    out
}

/// Designs a digital Butterworth bandpass filter.
///
/// # Arguments
///
/// * `spec` - A validated [`FilterSpec`].
///
/// # Returns
///
/// `spec.order()` second-order sections. The overall gain is folded into the
/// first section; the response is unity at the geometric band center and
/// `1/sqrt(2)` at both edges.
///
/// # Errors
///
/// Returns [`StressError::InvalidFilterSpec`] if the specification is not
/// realizable; [`FilterSpec::new`] already rejects such specs, so this only
/// fires for hand-built values.
pub fn butter_bandpass(spec: &FilterSpec) -> Result<FilterCoefficients> {
    spec.validate()?;
    let order = spec.order;
    let (low, high) = spec.normalized_band();

    // pre-warped analog band edges
    let fs2 = 2.0 * NORMALIZED_FS;
    let warped_low = fs2 * (PI * low / NORMALIZED_FS).tan();
    let warped_high = fs2 * (PI * high / NORMALIZED_FS).tan();
    let bandwidth = warped_high - warped_low;
    let center = (warped_low * warped_high).sqrt();

    let analog_poles: Vec<Complex64> = (0..order)
        .flat_map(|k| {
            let m = 2.0 * k as f64 - (order as f64 - 1.0);
            let prototype = -Complex64::from_polar(1.0, PI * m / (2.0 * order as f64));
            let shifted = prototype * (bandwidth / 2.0);
            let spread = (shifted * shifted - center * center).sqrt();
            [shifted + spread, shifted - spread]
        })
        .collect();

    // gain of the bilinear map: N analog zeros at the origin contribute fs2^N
    let gain = {
        let num = (fs2 * bandwidth).powi(order as i32);
        let den: Complex64 = analog_poles.iter().map(|&p| fs2 - p).product();
        (num / den).re
    };

    let digital_poles: Vec<Complex64> = analog_poles
        .iter()
        .map(|&p| (fs2 + p) / (fs2 - p))
        .collect();

    let mut sections = pair_poles(&digital_poles)
        .into_iter()
        .map(|a| SecondOrderSection {
            b: [1.0, 0.0, -1.0],
            a,
        })
        .collect::<Vec<_>>();
    if let Some(first) = sections.first_mut() {
        first.b.iter_mut().for_each(|c| *c *= gain);
    }

    debug!(
        "designed order-{} Butterworth bandpass {}-{} Hz at {} Hz ({} sections, gain {:e})",
        order,
        spec.lowcut,
        spec.highcut,
        spec.fs,
        sections.len(),
        gain
    );
    for (idx, s) in sections.iter().enumerate() {
        trace!("section {}: b={:?} a={:?}", idx, s.b, s.a);
    }

    Ok(FilterCoefficients { sections })
}

/// Groups poles into real-coefficient quadratic denominators.
///
/// Each pole in the upper half plane is paired with its conjugate; real poles
/// are sorted and paired in order.
fn pair_poles(poles: &[Complex64]) -> Vec<[f64; 3]> {
    let mut denominators: Vec<[f64; 3]> = poles
        .iter()
        .filter(|p| p.im > REAL_POLE_EPS)
        .map(|p| [1.0, -2.0 * p.re, p.norm_sqr()])
        .collect();

    let mut real: Vec<f64> = poles
        .iter()
        .filter(|p| p.im.abs() <= REAL_POLE_EPS)
        .map(|p| p.re)
        .collect();
    real.sort_by(|a, b| a.total_cmp(b));
    denominators.extend(real.chunks(2).map(|pair| match *pair {
        [p1, p2] => [1.0, -(p1 + p2), p1 * p2],
        [p] => [1.0, -p, 0.0],
        _ => unreachable!("chunks(2) yields one or two poles"),
    }));
    denominators
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_spec() -> FilterSpec {
        FilterSpec::new(0.5, 5.0, 3, 125.0).unwrap()
    }

    #[test]
    fn test_invalid_specs() {
        let cases = [
            (5.0, 0.5, 3, 125.0),
            (5.0, 5.0, 3, 125.0),
            (0.0, 5.0, 3, 125.0),
            (-0.5, 5.0, 3, 125.0),
            (0.5, 62.5, 3, 125.0),
            (0.5, 70.0, 3, 125.0),
            (0.5, 5.0, 0, 125.0),
            (0.5, 5.0, 3, 0.0),
            (f64::NAN, 5.0, 3, 125.0),
        ];
        for (low, high, order, fs) in cases {
            let result = FilterSpec::new(low, high, order, fs);
            assert!(
                matches!(result, Err(StressError::InvalidFilterSpec { .. })),
                "Spec ({low}, {high}, {order}, {fs}) should be rejected."
            );
        }
    }

    #[test]
    fn test_normalized_band() {
        let (low, high) = default_spec().normalized_band();
        assert!((low - 0.008).abs() < 1e-12);
        assert!((high - 0.08).abs() < 1e-12);
    }

    #[test]
    fn test_section_count_and_taps() {
        for order in 1..=4 {
            let coeffs = FilterSpec::new(0.5, 5.0, order, 125.0)
                .unwrap()
                .design()
                .unwrap();
            assert_eq!(coeffs.sections().len(), order);
            assert_eq!(coeffs.ntaps(), 2 * order + 1);
            assert_eq!(coeffs.numerator().len(), 2 * order + 1);
            assert_eq!(coeffs.denominator().len(), 2 * order + 1);
        }
    }

    #[test]
    fn test_band_edges_at_minus_3db() {
        let spec = default_spec();
        let coeffs = spec.design().unwrap();
        let edge = std::f64::consts::FRAC_1_SQRT_2;
        assert!((coeffs.magnitude_at(0.5, 125.0) - edge).abs() < 1e-6);
        assert!((coeffs.magnitude_at(5.0, 125.0) - edge).abs() < 1e-6);
        let center = (0.5f64 * 5.0).sqrt();
        // the warped center sits close to the geometric mean of the edges
        assert!((coeffs.magnitude_at(center, 125.0) - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_stopband_attenuation() {
        let coeffs = default_spec().design().unwrap();
        assert!(coeffs.magnitude_at(0.0, 125.0) < 1e-9, "DC must be rejected.");
        assert!(coeffs.magnitude_at(20.0, 125.0) < 0.02);
        assert!(coeffs.magnitude_at(62.5, 125.0) < 1e-9, "Nyquist must be rejected.");
    }

    #[test]
    fn test_poles_inside_unit_circle() {
        let coeffs = default_spec().design().unwrap();
        for s in coeffs.sections() {
            // a quadratic 1 + a1 z^-1 + a2 z^-2 is stable iff |a2| < 1 and |a1| < 1 + a2
            assert!(s.a[2].abs() < 1.0, "Section {:?} is unstable.", s);
            assert!(s.a[1].abs() < 1.0 + s.a[2], "Section {:?} is unstable.", s);
            assert_eq!(s.a[0], 1.0);
        }
    }

    #[test]
    fn test_design_is_deterministic() {
        let a = default_spec().design().unwrap();
        let b = default_spec().design().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_step_state_is_steady() {
        let section = SecondOrderSection {
            b: [0.2, 0.3, 0.1],
            a: [1.0, -0.5, 0.25],
        };
        let [z1, z2] = section.step_state();
        let y = section.b[0] + z1;
        assert!((y - section.dc_gain()).abs() < 1e-12);
        let next_z1 = section.b[1] - section.a[1] * y + z2;
        let next_z2 = section.b[2] - section.a[2] * y;
        assert!((next_z1 - z1).abs() < 1e-12);
        assert!((next_z2 - z2).abs() < 1e-12);
    }
}
