//! Time-domain summary statistics and eye-diagram results.

use serde::{Deserialize, Serialize};

/// Minimum and maximum of a slice; `(+inf, -inf)` when empty.
pub fn min_max(samples: &[f64]) -> (f64, f64) {
    samples
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &v| {
            (min.min(v), max.max(v))
        })
}

/// Summary statistics of a time-domain sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WaveformStats {
    pub max: f64,
    pub min: f64,
    pub mean: f64,
    pub rms: f64,
}

impl WaveformStats {
    /// Compute statistics; an empty slice gives all zeros.
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let (min, max) = min_max(samples);
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let rms = (samples.iter().map(|v| v * v).sum::<f64>() / n).sqrt();
        Self { max, min, mean, rms }
    }
}

/// Eye-diagram metrics extracted from a time-domain signal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EyeDiagramParams {
    /// Peak-to-peak vertical extent of the folded eye.
    pub height: f64,

    /// Horizontal opening as a fraction of one UI, in `[0, 1]`.
    pub width: f64,

    /// Standard deviation of threshold-crossing positions, in samples.
    pub jitter: f64,

    /// Crossing level relative to the low/high levels, in `[0, 100]`.
    pub crossing_percentage: f64,
}
