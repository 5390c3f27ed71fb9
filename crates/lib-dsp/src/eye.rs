//! Eye diagram analysis.
//!
//! The signal is folded into a `(num_uis, samples_per_ui)` matrix, one row
//! per unit interval. Height comes from the global extremes; width and jitter
//! come from threshold crossings found row by row; the crossing percentage
//! comes from the two outermost peaks of a 100-bin amplitude histogram.

use crate::error::{ComputationError, DspResult};
use lib_types::waveform::{min_max, EyeDiagramParams};
use ndarray::{ArrayView1, ArrayView2};

/// Number of amplitude histogram bins.
pub const HISTOGRAM_BINS: usize = 100;

/// Eye diagram analyzer for a fixed sample/bit rate.
#[derive(Clone, Copy, Debug)]
pub struct EyeDiagramAnalyzer {
    sample_rate: f64,
    bit_rate: f64,
}

/// A threshold crossing between samples `index - 1` and `index` of a row.
#[derive(Clone, Copy, Debug)]
struct Crossing {
    index: usize,
    position: f64,
}

impl EyeDiagramAnalyzer {
    pub fn new(sample_rate: f64, bit_rate: f64) -> Self {
        Self {
            sample_rate,
            bit_rate,
        }
    }

    /// `floor(sample_rate / bit_rate)`.
    pub fn samples_per_ui(&self) -> DspResult<usize> {
        if !(self.bit_rate.is_finite() && self.bit_rate > 0.0) {
            return Err(ComputationError::invalid(
                "bit_rate",
                format!("must be positive, got {}", self.bit_rate),
            ));
        }
        let ratio = self.sample_rate / self.bit_rate;
        if !(ratio.is_finite() && ratio >= 1.0) {
            return Err(ComputationError::invalid(
                "sample_rate",
                format!("{} Hz gives no whole sample per UI", self.sample_rate),
            ));
        }
        Ok(ratio.floor() as usize)
    }

    /// Extract eye metrics from a time-domain signal.
    ///
    /// Trailing samples that do not fill a whole UI are dropped.
    pub fn analyze(&self, signal: &[f64]) -> DspResult<EyeDiagramParams> {
        let samples_per_ui = self.samples_per_ui()?;
        let eye = fold(signal, samples_per_ui)?;

        let (min, max) = min_max(&signal[..eye.len()]);
        let threshold = (max + min) / 2.0;
        let crossings = find_crossings(eye, threshold);

        tracing::debug!(
            "Folded eye: {} UIs of {} samples, {} crossings",
            eye.nrows(),
            samples_per_ui,
            crossings.len()
        );

        let width = eye_width(&crossings, samples_per_ui);
        let jitter = crossing_jitter(&crossings);
        let crossing_percentage = crossing_percentage(eye, min, max);

        Ok(EyeDiagramParams {
            height: max - min,
            width,
            jitter,
            crossing_percentage,
        })
    }
}

/// View `signal` as whole UIs, one per row.
fn fold(signal: &[f64], samples_per_ui: usize) -> DspResult<ArrayView2<'_, f64>> {
    let num_uis = signal.len() / samples_per_ui;
    if num_uis == 0 {
        return Err(ComputationError::InsufficientData {
            needed: samples_per_ui,
            got: signal.len(),
        });
    }

    ArrayView2::from_shape((num_uis, samples_per_ui), &signal[..num_uis * samples_per_ui])
        .map_err(|e| ComputationError::NumericalInstability(e.to_string()))
}

fn find_crossings(eye: ArrayView2<'_, f64>, threshold: f64) -> Vec<Crossing> {
    eye.rows()
        .into_iter()
        .flat_map(|row| row_crossings(row, threshold))
        .collect()
}

/// Rising (`prev < t <= curr`) and falling (`prev >= t > curr`) crossings.
fn row_crossings(row: ArrayView1<'_, f64>, threshold: f64) -> Vec<Crossing> {
    let mut out = Vec::new();
    for i in 1..row.len() {
        let (y1, y2) = (row[i - 1], row[i]);
        let rising = y1 < threshold && y2 >= threshold;
        let falling = y1 >= threshold && y2 < threshold;
        if rising || falling {
            let x1 = (i - 1) as f64;
            out.push(Crossing {
                index: i,
                position: x1 + (threshold - y1) / (y2 - y1),
            });
        }
    }
    out
}

fn eye_width(crossings: &[Crossing], samples_per_ui: usize) -> f64 {
    let Some(first) = crossings.first() else {
        tracing::debug!("No threshold crossings, eye width is 0");
        return 0.0;
    };
    let (lo, hi) = crossings
        .iter()
        .fold((first.index, first.index), |(lo, hi), c| (lo.min(c.index), hi.max(c.index)));

    (1.0 - (hi - lo) as f64 / samples_per_ui as f64).max(0.0)
}

/// Population standard deviation of interpolated crossing positions.
fn crossing_jitter(crossings: &[Crossing]) -> f64 {
    if crossings.is_empty() {
        return 0.0;
    }
    let n = crossings.len() as f64;
    let mean = crossings.iter().map(|c| c.position).sum::<f64>() / n;
    let var = crossings
        .iter()
        .map(|c| (c.position - mean).powi(2))
        .sum::<f64>()
        / n;
    var.sqrt()
}

fn crossing_percentage(eye: ArrayView2<'_, f64>, min: f64, max: f64) -> f64 {
    if max <= min {
        tracing::debug!("Flat signal, crossing percentage is 0");
        return 0.0;
    }

    let bin_width = (max - min) / HISTOGRAM_BINS as f64;
    let hist = histogram(eye.iter().copied(), min, bin_width);
    let peaks = find_peaks(&hist);

    if peaks.len() < 2 {
        tracing::debug!("{} histogram peak(s), crossing percentage is 0", peaks.len());
        return 0.0;
    }

    let low_level = min + peaks[0] as f64 * bin_width;
    let high_level = min + peaks[peaks.len() - 1] as f64 * bin_width;
    let crossing_level = low_level + 0.5 * (high_level - low_level);
    (crossing_level - low_level) / (high_level - low_level) * 100.0
}

/// Equal-width bins starting at `min`; the last bin includes its right edge.
fn histogram(samples: impl IntoIterator<Item = f64>, min: f64, bin_width: f64) -> Vec<usize> {
    let mut hist = vec![0usize; HISTOGRAM_BINS];
    for v in samples {
        let bin = ((v - min) / bin_width).floor() as usize;
        hist[bin.min(HISTOGRAM_BINS - 1)] += 1;
    }
    hist
}

/// Indices of local maxima.
///
/// Interior bins must be strictly greater than both neighbours; a flat top is
/// reported once, at its midpoint. An end bin is a peak when it exceeds its
/// only neighbour.
fn find_peaks(hist: &[usize]) -> Vec<usize> {
    let n = hist.len();
    let mut peaks = Vec::new();
    if n < 2 {
        return peaks;
    }

    if hist[0] > hist[1] {
        peaks.push(0);
    }

    let mut i = 1;
    while i + 1 < n {
        if hist[i - 1] < hist[i] {
            let mut ahead = i + 1;
            while ahead + 1 < n && hist[ahead] == hist[i] {
                ahead += 1;
            }
            if hist[ahead] < hist[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
                continue;
            }
        }
        i += 1;
    }

    if hist[n - 1] > hist[n - 2] {
        peaks.push(n - 1);
    }
    peaks
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Each UI holds +1 for its first half and -1 for its second half.
    fn square_wave(num_uis: usize, samples_per_ui: usize) -> Vec<f64> {
        (0..num_uis * samples_per_ui)
            .map(|i| if i % samples_per_ui < samples_per_ui / 2 { 1.0 } else { -1.0 })
            .collect()
    }

    #[test]
    fn test_ideal_square_wave() {
        let analyzer = EyeDiagramAnalyzer::new(8e9, 1e9);
        let eye = analyzer.analyze(&square_wave(50, 8)).unwrap();

        assert!((eye.height - 2.0).abs() < 1e-12);
        assert!(eye.jitter.abs() < 1e-12);
        assert!((eye.width - 1.0).abs() < 1e-12);
        assert!((eye.crossing_percentage - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_alternating_samples() {
        let signal: Vec<f64> = (0..64).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let eye = EyeDiagramAnalyzer::new(2e9, 1e9).analyze(&signal).unwrap();

        assert!((eye.height - 2.0).abs() < 1e-12);
        assert!(eye.jitter.abs() < 1e-12);
        assert!((eye.width - 1.0).abs() < 1e-12);
        assert!((eye.crossing_percentage - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_crossings_degrade_to_zero() {
        let signal = vec![0.3; 40];
        let eye = EyeDiagramAnalyzer::new(4e9, 1e9).analyze(&signal).unwrap();
        assert_eq!(eye.height, 0.0);
        assert_eq!(eye.width, 0.0);
        assert_eq!(eye.jitter, 0.0);
        assert_eq!(eye.crossing_percentage, 0.0);
    }

    #[test]
    fn test_crossing_spread_reduces_width() {
        // Transitions at sample 2 in one UI and sample 6 in the other.
        let mut signal = vec![1.0, 1.0, -1.0, -1.0, -1.0, -1.0, -1.0, -1.0];
        signal.extend([-1.0, -1.0, -1.0, -1.0, -1.0, -1.0, 1.0, 1.0]);
        let eye = EyeDiagramAnalyzer::new(8e9, 1e9).analyze(&signal).unwrap();

        assert!((eye.width - 0.5).abs() < 1e-12);
        // Positions 1.5 and 5.5
        assert!((eye.jitter - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_trailing_partial_ui_dropped() {
        let mut signal = square_wave(10, 4);
        signal.extend([5.0, 5.0]);
        let eye = EyeDiagramAnalyzer::new(4e9, 1e9).analyze(&signal).unwrap();
        assert!((eye.height - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_short_signal_and_bad_rates() {
        let analyzer = EyeDiagramAnalyzer::new(8e9, 1e9);
        assert!(matches!(
            analyzer.analyze(&[1.0; 5]),
            Err(ComputationError::InsufficientData { needed: 8, got: 5 })
        ));
        assert!(EyeDiagramAnalyzer::new(0.5e9, 1e9).samples_per_ui().is_err());
        assert!(EyeDiagramAnalyzer::new(1e9, 0.0).samples_per_ui().is_err());
    }

    #[test]
    fn test_find_peaks() {
        assert_eq!(find_peaks(&[5, 0, 0, 3, 0, 0, 7]), vec![0, 3, 6]);
        // Flat top counted once at its midpoint
        assert_eq!(find_peaks(&[0, 2, 2, 2, 0]), vec![2]);
        assert_eq!(find_peaks(&[0, 2, 2, 0]), vec![1]);
        // Plateau running into the end is not a peak
        assert_eq!(find_peaks(&[0, 1, 1]), Vec::<usize>::new());
        assert!(find_peaks(&[4, 4, 4]).is_empty());
    }

    #[test]
    fn test_histogram_last_bin_closed() {
        let hist = histogram([0.0, 50.5, 100.0], 0.0, 1.0);
        assert_eq!(hist[0], 1);
        assert_eq!(hist[50], 1);
        assert_eq!(hist[99], 1);
    }
}
