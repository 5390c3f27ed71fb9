//! Real FFT/IFFT operations using realfft.
//!
//! Channel synthesis works on `num_bits * samples_per_bit` samples, which is
//! rarely a power of two, so these transforms accept any non-zero length.

use crate::error::{ComputationError, DspResult};
use num_complex::Complex64;
use realfft::RealFftPlanner;

/// FFT engine with a cached real-FFT planner.
pub struct FftEngine {
    real_planner: RealFftPlanner<f64>,
}

impl FftEngine {
    /// Create a new FFT engine.
    pub fn new() -> Self {
        Self {
            real_planner: RealFftPlanner::new(),
        }
    }

    /// Perform forward real-to-complex FFT.
    ///
    /// Input: N real samples
    /// Output: N/2 + 1 complex samples (Hermitian symmetry exploited)
    pub fn rfft(&mut self, data: &[f64]) -> DspResult<Vec<Complex64>> {
        let len = data.len();
        if len == 0 {
            return Err(ComputationError::InsufficientData { needed: 1, got: 0 });
        }

        let r2c = self.real_planner.plan_fft_forward(len);
        let mut input = data.to_vec();
        let mut output = r2c.make_output_vec();

        r2c.process(&mut input, &mut output)
            .map_err(|e| ComputationError::NumericalInstability(e.to_string()))?;

        Ok(output)
    }

    /// Perform inverse complex-to-real FFT, normalized by `1/N`.
    ///
    /// Input: N/2 + 1 complex samples
    /// Output: N real samples
    ///
    /// The DC bin (and the Nyquist bin for even N) must be real for a real
    /// output; their imaginary parts are discarded.
    pub fn irfft(&mut self, data: &[Complex64], output_len: usize) -> DspResult<Vec<f64>> {
        if output_len == 0 {
            return Err(ComputationError::InsufficientData { needed: 1, got: 0 });
        }

        let expected_input_len = output_len / 2 + 1;
        if data.len() != expected_input_len {
            return Err(ComputationError::LengthMismatch {
                expected: expected_input_len,
                actual: data.len(),
            });
        }

        let c2r = self.real_planner.plan_fft_inverse(output_len);
        let mut input = data.to_vec();
        input[0].im = 0.0;
        if output_len % 2 == 0 {
            input[expected_input_len - 1].im = 0.0;
        }
        let mut output = c2r.make_output_vec();

        c2r.process(&mut input, &mut output)
            .map_err(|e| ComputationError::NumericalInstability(e.to_string()))?;

        let scale = 1.0 / output_len as f64;
        for x in output.iter_mut() {
            *x *= scale;
        }

        Ok(output)
    }
}

impl Default for FftEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Bin frequencies of an `n`-point real FFT at `sample_rate`: `k * fs / n`
/// for `k = 0..=n/2`.
pub fn rfft_frequencies(n: usize, sample_rate: f64) -> Vec<f64> {
    let df = sample_rate / n as f64;
    (0..=n / 2).map(|k| k as f64 * df).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_rfft_irfft_roundtrip_odd_length() {
        let mut engine = FftEngine::new();

        let n = 1000 + 5;
        let signal: Vec<f64> = (0..n)
            .map(|i| {
                let t = i as f64 / n as f64;
                (2.0 * PI * 4.0 * t).sin() + 0.25
            })
            .collect();

        let spectrum = engine.rfft(&signal).unwrap();
        assert_eq!(spectrum.len(), n / 2 + 1);
        let recovered = engine.irfft(&spectrum, n).unwrap();

        for (orig, rec) in signal.iter().zip(recovered.iter()) {
            assert!((orig - rec).abs() < 1e-10);
        }
    }

    #[test]
    fn test_dc_bin_is_mean_times_n() {
        let mut engine = FftEngine::new();
        let spectrum = engine.rfft(&[1.0, 1.0, -1.0, 3.0]).unwrap();
        assert!((spectrum[0].re - 4.0).abs() < 1e-12);
        assert!(spectrum[0].im.abs() < 1e-12);
    }

    #[test]
    fn test_irfft_length_mismatch() {
        let mut engine = FftEngine::new();
        let result = engine.irfft(&[Complex64::new(1.0, 0.0); 3], 8);
        assert!(matches!(
            result,
            Err(ComputationError::LengthMismatch { expected: 5, actual: 3 })
        ));
    }

    #[test]
    fn test_rfft_frequencies() {
        let f = rfft_frequencies(8, 8e9);
        assert_eq!(f.len(), 5);
        assert!((f[1] - 1e9).abs() < 1e-3);
        assert!((f[4] - 4e9).abs() < 1e-3);
    }
}
