//! Frequency-domain interpolation for S-parameters.
//!
//! Real and imaginary parts are interpolated independently. Targets outside
//! the measured band hold the nearest edge value.

use crate::error::{ComputationError, DspResult};
use num_complex::Complex64;

/// Interpolate `values` sampled at increasing `freqs` onto `target_freqs`.
///
/// A single measured point yields a constant response.
pub fn interpolate_linear(
    freqs: &[f64],
    values: &[Complex64],
    target_freqs: &[f64],
) -> DspResult<Vec<Complex64>> {
    if freqs.len() != values.len() {
        return Err(ComputationError::LengthMismatch {
            expected: freqs.len(),
            actual: values.len(),
        });
    }
    if freqs.is_empty() {
        return Err(ComputationError::InsufficientData { needed: 1, got: 0 });
    }

    Ok(target_freqs
        .iter()
        .map(|&target| interpolate_single(freqs, values, target))
        .collect())
}

/// Interpolate a single frequency point.
fn interpolate_single(freqs: &[f64], values: &[Complex64], target: f64) -> Complex64 {
    let last = freqs.len() - 1;
    if target <= freqs[0] {
        return values[0];
    }
    if target >= freqs[last] {
        return values[last];
    }

    // Find bracketing indices
    let mut lower = 0;
    let mut upper = last;

    while upper - lower > 1 {
        let mid = (lower + upper) / 2;
        if freqs[mid] <= target {
            lower = mid;
        } else {
            upper = mid;
        }
    }

    let f0 = freqs[lower];
    let f1 = freqs[upper];
    let frac = (target - f0) / (f1 - f0);

    values[lower] + (values[upper] - values[lower]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_interpolation() {
        let freqs = vec![1e9, 2e9, 3e9];
        let values = vec![
            Complex64::new(1.0, 0.0),
            Complex64::new(0.5, -0.5),
            Complex64::new(0.0, 0.0),
        ];

        let result = interpolate_linear(&freqs, &values, &[1.5e9, 2.5e9]).unwrap();

        assert!((result[0].re - 0.75).abs() < 1e-12);
        assert!((result[0].im + 0.25).abs() < 1e-12);
        assert!((result[1].re - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_band_holds_edges() {
        let freqs = vec![1e9, 2e9];
        let values = vec![Complex64::new(0.9, 0.1), Complex64::new(0.4, -0.2)];

        let result = interpolate_linear(&freqs, &values, &[0.0, 5e8, 3e9, 1e12]).unwrap();

        assert_eq!(result[0], values[0]);
        assert_eq!(result[1], values[0]);
        assert_eq!(result[2], values[1]);
        assert_eq!(result[3], values[1]);
    }

    #[test]
    fn test_single_point_is_constant() {
        let values = vec![Complex64::new(0.3, 0.3)];
        let result = interpolate_linear(&[1e9], &values, &[0.0, 1e9, 4e9]).unwrap();
        assert!(result.iter().all(|v| *v == values[0]));
    }

    #[test]
    fn test_empty_input_rejected() {
        let result = interpolate_linear(&[], &[], &[1.0]);
        assert!(matches!(
            result,
            Err(ComputationError::InsufficientData { .. })
        ));
    }
}
