//! Derived network parameters.
//!
//! Every quantity is returned as `(frequency_hz, value)` pairs in the same
//! order as the input points. The port count is taken from the first point;
//! points with any other port count are skipped. Degenerate arithmetic (a reflection coefficient
//! of exactly one, a lossless zero transmission) is not masked: the result
//! carries the infinity or NaN produced by the division.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use crate::error::{ComputationError, DspResult};
use lib_types::sparams::FrequencyPoint;
use num_complex::Complex64;
use serde::Serialize;

/// Network-parameter analyzer over a borrowed set of frequency points.
pub struct NetworkAnalyzer<'a> {
    points: &'a [FrequencyPoint],
    num_ports: usize,
}

/// Precomputed return loss for every port and insertion loss for every
/// ordered port pair.
#[derive(Clone, Debug, Default, Serialize)]
pub struct NetworkSummary {
    /// Keyed by port index.
    pub return_loss: BTreeMap<String, Vec<(f64, f64)>>,

    /// Keyed by `"i_j"` for `i != j`.
    pub insertion_loss: BTreeMap<String, Vec<(f64, f64)>>,

    /// Empty unless the network has two ports.
    pub stability_factor: Vec<(f64, f64)>,
}

impl<'a> NetworkAnalyzer<'a> {
    pub fn new(points: &'a [FrequencyPoint]) -> Self {
        let num_ports = points.first().map_or(0, FrequencyPoint::num_ports);
        Self { points, num_ports }
    }

    pub fn num_ports(&self) -> usize {
        self.num_ports
    }

    /// `-20 log10 |S[port, port]|` in dB.
    pub fn return_loss(&self, port: usize) -> DspResult<Vec<(f64, f64)>> {
        self.check_port(port)?;
        Ok(self.map_entry(port, port, |s| -20.0 * s.norm().log10()))
    }

    /// `-20 log10 |S[port1, port2]|` in dB.
    pub fn insertion_loss(&self, port1: usize, port2: usize) -> DspResult<Vec<(f64, f64)>> {
        self.check_port(port1)?;
        self.check_port(port2)?;
        Ok(self.map_entry(port1, port2, |s| -20.0 * s.norm().log10()))
    }

    /// Port impedance `z0 (1 + S) / (1 - S)` from the reflection coefficient.
    pub fn impedance(&self, port: usize, z0: f64) -> DspResult<Vec<(f64, Complex64)>> {
        self.check_port(port)?;
        let one = Complex64::new(1.0, 0.0);
        Ok(self
            .entries(port, port)
            .map(|(f, s)| (f, (one + s) / (one - s) * z0))
            .collect())
    }

    /// Voltage standing wave ratio `(1 + |S|) / (1 - |S|)`.
    pub fn vswr(&self, port: usize) -> DspResult<Vec<(f64, f64)>> {
        self.check_port(port)?;
        Ok(self.map_entry(port, port, |s| {
            let mag = s.norm();
            (1.0 + mag) / (1.0 - mag)
        }))
    }

    /// Group delay of `S[port1, port2]` in seconds.
    ///
    /// Each consecutive phase step is wrapped into `(-π, π]` before
    /// differencing, and the delay is reported at the upper frequency of the
    /// step, so the output is one point shorter than the input.
    pub fn group_delay(&self, port1: usize, port2: usize) -> DspResult<Vec<(f64, f64)>> {
        self.check_port(port1)?;
        self.check_port(port2)?;

        let entries: Vec<(f64, Complex64)> = self.entries(port1, port2).collect();
        Ok(entries
            .windows(2)
            .map(|pair| {
                let (f1, s1) = pair[0];
                let (f2, s2) = pair[1];
                let delay = -wrap_phase(s2.arg() - s1.arg()) / (2.0 * PI * (f2 - f1));
                (f2, delay)
            })
            .collect())
    }

    /// Rollett stability factor K for two-port points.
    ///
    /// Points whose matrix is not 2x2 are skipped, so any other network
    /// yields an empty sequence.
    pub fn stability_factor(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .filter(|p| p.num_ports() == 2)
            .map(|p| {
                let s = &p.s_parameters;
                let (s11, s12, s21, s22) = (s[[0, 0]], s[[0, 1]], s[[1, 0]], s[[1, 1]]);
                let delta = s11 * s22 - s12 * s21;
                let k = (1.0 - s11.norm_sqr() - s22.norm_sqr() + delta.norm_sqr())
                    / (2.0 * (s12 * s21).norm());
                (p.frequency.0, k)
            })
            .collect()
    }

    /// Return loss for all ports, insertion loss for all ordered pairs.
    pub fn summary(&self) -> NetworkSummary {
        let mut summary = NetworkSummary {
            stability_factor: self.stability_factor(),
            ..Default::default()
        };

        for i in 0..self.num_ports {
            summary
                .return_loss
                .insert(i.to_string(), self.map_entry(i, i, |s| -20.0 * s.norm().log10()));
            for j in (0..self.num_ports).filter(|&j| j != i) {
                summary.insertion_loss.insert(
                    format!("{i}_{j}"),
                    self.map_entry(i, j, |s| -20.0 * s.norm().log10()),
                );
            }
        }

        summary
    }

    fn check_port(&self, port: usize) -> DspResult<()> {
        if port < self.num_ports {
            Ok(())
        } else {
            Err(ComputationError::PortOutOfRange {
                port,
                num_ports: self.num_ports,
            })
        }
    }

    /// `S[row, col]` of every point sharing the analyzer's port count.
    fn entries(&self, row: usize, col: usize) -> impl Iterator<Item = (f64, Complex64)> + '_ {
        self.points
            .iter()
            .filter(move |p| p.num_ports() == self.num_ports)
            .filter_map(move |p| p.s_parameters.get((row, col)).map(|s| (p.frequency.0, *s)))
    }

    fn map_entry(&self, row: usize, col: usize, f: impl Fn(Complex64) -> f64) -> Vec<(f64, f64)> {
        self.entries(row, col).map(|(freq, s)| (freq, f(s))).collect()
    }
}

/// Wrap a phase difference into `(-π, π]` with a single 2π correction.
fn wrap_phase(diff: f64) -> f64 {
    if diff > PI {
        diff - 2.0 * PI
    } else if diff < -PI {
        diff + 2.0 * PI
    } else {
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_types::units::Hertz;
    use ndarray::array;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    fn two_port(freq: f64, s11: Complex64, s21: Complex64, s22: Complex64) -> FrequencyPoint {
        FrequencyPoint::new(Hertz(freq), array![[s11, s21], [s21, s22]])
    }

    #[test]
    fn test_return_loss_and_vswr() {
        let points = vec![two_port(1e9, c(0.1, 0.0), c(0.9, 0.0), c(0.5, 0.0))];
        let analyzer = NetworkAnalyzer::new(&points);

        let rl = analyzer.return_loss(0).unwrap();
        assert_eq!(rl[0].0, 1e9);
        assert!((rl[0].1 - 20.0).abs() < 1e-9);

        let vswr = analyzer.vswr(1).unwrap();
        assert!((vswr[0].1 - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_insertion_loss_symmetric_for_reciprocal_network() {
        let points: Vec<_> = (1..=4)
            .map(|k| {
                let f = k as f64 * 1e9;
                let s21 = Complex64::from_polar(0.9 / k as f64, -0.3 * k as f64);
                two_port(f, c(0.05, 0.01), s21, c(0.07, -0.02))
            })
            .collect();
        let analyzer = NetworkAnalyzer::new(&points);

        let forward = analyzer.insertion_loss(0, 1).unwrap();
        let reverse = analyzer.insertion_loss(1, 0).unwrap();
        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_impedance_of_matched_and_open_port() {
        let points = vec![
            FrequencyPoint::new(Hertz(1e9), array![[c(0.0, 0.0)]]),
            FrequencyPoint::new(Hertz(2e9), array![[c(1.0, 0.0)]]),
        ];
        let analyzer = NetworkAnalyzer::new(&points);
        let z = analyzer.impedance(0, 50.0).unwrap();

        assert!((z[0].1 - c(50.0, 0.0)).norm() < 1e-12);
        let open = z[1].1;
        assert!(open.re.is_infinite() || open.re.is_nan());
    }

    #[test]
    fn test_group_delay_of_linear_phase() {
        // A 100 ps line: phase = -2π f τ, wrapped by arg() into (-π, π].
        let tau = 100e-12;
        let points: Vec<_> = (0..20)
            .map(|k| {
                let f = 1e9 + k as f64 * 0.5e9;
                let s21 = Complex64::from_polar(1.0, -2.0 * PI * f * tau);
                two_port(f, c(0.0, 0.0), s21, c(0.0, 0.0))
            })
            .collect();
        let analyzer = NetworkAnalyzer::new(&points);
        let gd = analyzer.group_delay(1, 0).unwrap();

        assert_eq!(gd.len(), points.len() - 1);
        assert_eq!(gd[0].0, points[1].frequency.0);
        for (_, delay) in gd {
            assert!((delay - tau).abs() < 1e-15);
        }
    }

    #[test]
    fn test_stability_factor_two_port() {
        // Matched, lossless thru: |Δ| = 1, K = (1 + 1) / 2 = 1
        let points = vec![two_port(1e9, c(0.0, 0.0), c(1.0, 0.0), c(0.0, 0.0))];
        let k = NetworkAnalyzer::new(&points).stability_factor();
        assert_eq!(k.len(), 1);
        assert!((k[0].1 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_stability_factor_empty_for_non_two_port() {
        let one_port = vec![FrequencyPoint::new(Hertz(1e9), array![[c(0.2, 0.0)]])];
        assert!(NetworkAnalyzer::new(&one_port).stability_factor().is_empty());
        assert!(NetworkAnalyzer::new(&[]).stability_factor().is_empty());
    }

    #[test]
    fn test_port_out_of_range() {
        let points = vec![two_port(1e9, c(0.1, 0.0), c(0.9, 0.0), c(0.1, 0.0))];
        let analyzer = NetworkAnalyzer::new(&points);
        assert!(matches!(
            analyzer.return_loss(2),
            Err(ComputationError::PortOutOfRange { port: 2, num_ports: 2 })
        ));
        assert!(analyzer.group_delay(0, 5).is_err());
    }

    #[test]
    fn test_mixed_port_counts_skip_foreign_points() {
        let points = vec![
            two_port(1e9, c(0.1, 0.0), c(0.9, 0.0), c(0.5, 0.0)),
            FrequencyPoint::new(Hertz(2e9), array![[c(0.3, 0.0)]]),
            two_port(3e9, c(0.1, 0.0), c(0.8, 0.0), c(0.5, 0.0)),
        ];
        let analyzer = NetworkAnalyzer::new(&points);
        assert_eq!(analyzer.num_ports(), 2);

        let rl = analyzer.return_loss(1).unwrap();
        assert_eq!(rl.iter().map(|(f, _)| *f).collect::<Vec<_>>(), vec![1e9, 3e9]);
        assert_eq!(analyzer.insertion_loss(1, 0).unwrap().len(), 2);
        assert_eq!(analyzer.impedance(1, 50.0).unwrap().len(), 2);
        assert_eq!(analyzer.vswr(0).unwrap().len(), 2);

        let gd = analyzer.group_delay(1, 0).unwrap();
        assert_eq!(gd.len(), 1);
        assert_eq!(gd[0].0, 3e9);

        let summary = analyzer.summary();
        assert_eq!(summary.return_loss["1"].len(), 2);
        assert_eq!(summary.stability_factor.len(), 2);

        // A one-port analyzer never touches the two-port points
        let rl = NetworkAnalyzer::new(&points[1..]).return_loss(0).unwrap();
        assert_eq!(rl.len(), 1);
        assert!(NetworkAnalyzer::new(&points[1..]).return_loss(1).is_err());
    }

    #[test]
    fn test_summary_keys() {
        let points = vec![two_port(1e9, c(0.1, 0.0), c(0.9, 0.0), c(0.1, 0.0))];
        let summary = NetworkAnalyzer::new(&points).summary();
        assert_eq!(summary.return_loss.len(), 2);
        assert!(summary.insertion_loss.contains_key("0_1"));
        assert!(summary.insertion_loss.contains_key("1_0"));
        assert_eq!(summary.stability_factor.len(), 1);
    }
}
