//! Time-domain channel synthesis.
//!
//! A PRBS baseband is shaped by a measured frequency response: the signal
//! spectrum is multiplied bin-by-bin with the response interpolated onto the
//! FFT grid, then transformed back to the time domain.

use crate::error::{ComputationError, DspResult};
use crate::fft::{rfft_frequencies, FftEngine};
use crate::interpolation::interpolate_linear;
use crate::prbs::{hold_upsample, prbs_symbols, PrbsOrder};
use num_complex::Complex64;

/// Default number of simulated bits.
pub const DEFAULT_NUM_BITS: usize = 1000;

/// Channel response synthesizer.
#[derive(Clone, Debug)]
pub struct ChannelSynthesizer {
    sample_rate: f64,
    bit_rate: f64,
    num_bits: usize,
    prbs_order: PrbsOrder,
}

impl ChannelSynthesizer {
    /// Synthesizer for PRBS-7 with the default bit count.
    pub fn new(sample_rate: f64, bit_rate: f64) -> Self {
        Self {
            sample_rate,
            bit_rate,
            num_bits: DEFAULT_NUM_BITS,
            prbs_order: PrbsOrder::Prbs7,
        }
    }

    pub fn with_num_bits(mut self, num_bits: usize) -> Self {
        self.num_bits = num_bits;
        self
    }

    pub fn with_prbs_order(mut self, order: PrbsOrder) -> Self {
        self.prbs_order = order;
        self
    }

    /// Samples per bit, `round(sample_rate / bit_rate)`.
    pub fn samples_per_bit(&self) -> DspResult<usize> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ComputationError::invalid(
                "sample_rate",
                format!("must be positive, got {}", self.sample_rate),
            ));
        }
        if !(self.bit_rate.is_finite() && self.bit_rate > 0.0) {
            return Err(ComputationError::invalid(
                "bit_rate",
                format!("must be positive, got {}", self.bit_rate),
            ));
        }

        let spb = (self.sample_rate / self.bit_rate).round() as usize;
        if spb == 0 {
            return Err(ComputationError::invalid(
                "sample_rate",
                format!(
                    "{} Hz gives less than one sample per bit at {} b/s",
                    self.sample_rate, self.bit_rate
                ),
            ));
        }
        Ok(spb)
    }

    /// The unshaped NRZ baseband: PRBS symbols held for `samples_per_bit`.
    pub fn baseband(&self) -> DspResult<Vec<f64>> {
        if self.num_bits == 0 {
            return Err(ComputationError::invalid("num_bits", "must be at least 1"));
        }
        let spb = self.samples_per_bit()?;
        Ok(hold_upsample(&prbs_symbols(self.prbs_order, self.num_bits), spb))
    }

    /// Apply the response sampled at `freqs` to the PRBS baseband.
    ///
    /// The output has exactly `num_bits * samples_per_bit` samples. FFT bins
    /// outside the measured band take the nearest measured value.
    pub fn synthesize(&self, freqs: &[f64], response: &[Complex64]) -> DspResult<Vec<f64>> {
        let baseband = self.baseband()?;
        let total_samples = baseband.len();

        let mut engine = FftEngine::new();
        let spectrum = engine.rfft(&baseband)?;
        let bins = rfft_frequencies(total_samples, self.sample_rate);
        let channel = interpolate_linear(freqs, response, &bins)?;

        tracing::debug!(
            "Synthesizing channel response: {} samples, {} bins from {} measured points",
            total_samples,
            bins.len(),
            freqs.len()
        );

        let shaped: Vec<Complex64> = spectrum
            .iter()
            .zip(channel.iter())
            .map(|(x, h)| x * h)
            .collect();

        engine.irfft(&shaped, total_samples)
    }
}
