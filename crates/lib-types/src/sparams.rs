//! S-parameter (scattering parameter) data structures.
//!
//! A Touchstone dataset is an ordered list of frequency points, each carrying
//! an `N x N` complex matrix. This module also defines the serializable record
//! ("dict") form that stored or externally produced datasets arrive in.

use crate::units::{Hertz, Ohms};
use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// S-parameter matrix at a single frequency.
pub type SMatrix = Array2<Complex64>;

/// Frequency unit declared on the `#` option line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FrequencyUnit {
    #[default]
    Hz,
    KHz,
    MHz,
    GHz,
}

impl FrequencyUnit {
    /// Multiplier converting a value in this unit to Hz.
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::Hz => 1.0,
            Self::KHz => 1e3,
            Self::MHz => 1e6,
            Self::GHz => 1e9,
        }
    }
}

/// Network parameter type declared on the `#` option line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParameterType {
    #[default]
    S,
    Y,
    Z,
    H,
    G,
}

/// Data format in Touchstone files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DataFormat {
    /// Real/Imaginary
    #[default]
    RI,
    /// Magnitude/Angle (degrees)
    MA,
    /// dB/Angle (degrees)
    DB,
}

impl DataFormat {
    /// Convert a value pair to a complex number.
    pub fn to_complex(&self, val1: f64, val2: f64) -> Complex64 {
        match self {
            Self::RI => Complex64::new(val1, val2),
            Self::MA => Complex64::from_polar(val1, val2.to_radians()),
            Self::DB => {
                let magnitude = 10.0_f64.powf(val1 / 20.0);
                Complex64::from_polar(magnitude, val2.to_radians())
            }
        }
    }
}

/// Contents of the `#` option line.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TouchstoneHeader {
    pub unit: FrequencyUnit,
    pub parameter_type: ParameterType,
    pub format: DataFormat,
    #[serde(default = "default_reference_impedance")]
    pub reference_impedance: Ohms,
}

fn default_reference_impedance() -> Ohms {
    Ohms::Z0_50
}

impl Default for TouchstoneHeader {
    /// Header assumed when a file has no option line: values are taken
    /// literally as Hz and real/imaginary pairs.
    fn default() -> Self {
        Self {
            unit: FrequencyUnit::Hz,
            parameter_type: ParameterType::S,
            format: DataFormat::RI,
            reference_impedance: Ohms::Z0_50,
        }
    }
}

/// One frequency sample of a network.
#[derive(Clone, Debug, PartialEq)]
pub struct FrequencyPoint {
    pub frequency: Hertz,
    pub s_parameters: SMatrix,
}

impl FrequencyPoint {
    pub fn new(frequency: Hertz, s_parameters: SMatrix) -> Self {
        Self {
            frequency,
            s_parameters,
        }
    }

    /// Build a point from interleaved `(re, im)` values in row-major port order.
    ///
    /// The value at `2*(i*n + j)` is the real part of `S[i, j]` and the next one
    /// its imaginary part. Returns `None` unless `values.len() / 2` is a
    /// non-zero perfect square.
    pub fn from_interleaved(frequency: Hertz, values: &[f64]) -> Option<Self> {
        let num_ports = port_count_for_values(values.len())?;
        let matrix = Array2::from_shape_fn((num_ports, num_ports), |(i, j)| {
            let idx = 2 * (i * num_ports + j);
            Complex64::new(values[idx], values[idx + 1])
        });
        Some(Self::new(frequency, matrix))
    }

    /// Number of ports (matrix dimension).
    pub fn num_ports(&self) -> usize {
        self.s_parameters.nrows()
    }

    /// Flatten back to interleaved `(re, im)` values, row-major.
    pub fn interleaved(&self) -> Vec<f64> {
        self.s_parameters
            .iter()
            .flat_map(|c| [c.re, c.im])
            .collect()
    }
}

/// Port count implied by `value_count` S-parameter values (frequency excluded).
///
/// `value_count` must be `2 * n^2` for some `n >= 1`.
pub fn port_count_for_values(value_count: usize) -> Option<usize> {
    if value_count == 0 || value_count % 2 != 0 {
        return None;
    }
    let entries = value_count / 2;
    let n = (entries as f64).sqrt().round() as usize;
    (n * n == entries).then_some(n)
}

/// A parsed Touchstone file.
///
/// Immutable once built; re-parsing yields a new instance.
#[derive(Clone, Debug)]
pub struct TouchstoneDataset {
    header: TouchstoneHeader,
    frequency_points: Vec<FrequencyPoint>,
    num_ports: usize,
}

impl TouchstoneDataset {
    /// Assemble a dataset, checking every matrix is `num_ports x num_ports`.
    pub fn from_points(
        header: TouchstoneHeader,
        num_ports: usize,
        frequency_points: Vec<FrequencyPoint>,
    ) -> Result<Self, &'static str> {
        if num_ports == 0 {
            return Err("Port count must be at least 1");
        }
        if frequency_points
            .iter()
            .any(|p| p.s_parameters.dim() != (num_ports, num_ports))
        {
            return Err("Matrix dimensions don't match port count");
        }
        Ok(Self {
            header,
            frequency_points,
            num_ports,
        })
    }

    pub fn header(&self) -> &TouchstoneHeader {
        &self.header
    }

    pub fn frequency_points(&self) -> &[FrequencyPoint] {
        &self.frequency_points
    }

    pub fn num_ports(&self) -> usize {
        self.num_ports
    }

    /// Number of frequency points.
    pub fn len(&self) -> usize {
        self.frequency_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequency_points.is_empty()
    }

    /// Frequencies in Hz, in file order.
    pub fn frequencies(&self) -> Vec<f64> {
        self.frequency_points.iter().map(|p| p.frequency.0).collect()
    }

    /// Frequency range.
    pub fn frequency_range(&self) -> Option<(Hertz, Hertz)> {
        let first = self.frequency_points.first()?;
        let last = self.frequency_points.last()?;
        Some((first.frequency, last.frequency))
    }

    /// Get S-parameter at specific port indices across all frequencies.
    pub fn get_parameter(&self, row: usize, col: usize) -> Vec<Complex64> {
        self.frequency_points
            .iter()
            .map(|p| p.s_parameters[[row, col]])
            .collect()
    }

    /// Check if the network is reciprocal (S_ij = S_ji).
    pub fn is_reciprocal(&self, tolerance: f64) -> bool {
        self.frequency_points.iter().all(|p| {
            let m = &p.s_parameters;
            (0..self.num_ports).all(|i| {
                (i + 1..self.num_ports).all(|j| (m[[i, j]] - m[[j, i]]).norm() <= tolerance)
            })
        })
    }

    /// Check if every entry satisfies |S_ij| <= 1.
    pub fn is_passive(&self) -> bool {
        self.frequency_points
            .iter()
            .flat_map(|p| p.s_parameters.iter())
            .all(|v| v.norm() <= 1.0 + 1e-6)
    }

    /// Convert to the serializable record form.
    pub fn to_record(&self) -> SParameterRecord {
        SParameterRecord {
            header: Some(self.header),
            data_points: Some(
                self.frequency_points
                    .iter()
                    .map(|p| DataPointRecord {
                        frequency: p.frequency.0,
                        values: p.interleaved(),
                    })
                    .collect(),
            ),
            num_ports: Some(self.num_ports),
        }
    }
}

/// Serializable ("dict") form of a dataset.
///
/// Every field is optional so that incomplete records coming from storage can
/// still be deserialized and then reported on by the validator.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SParameterRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<TouchstoneHeader>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_points: Option<Vec<DataPointRecord>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_ports: Option<usize>,
}

/// One frequency point in record form: frequency plus interleaved `(re, im)` values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataPointRecord {
    pub frequency: f64,
    #[serde(default)]
    pub values: Vec<f64>,
}

impl From<&TouchstoneDataset> for SParameterRecord {
    fn from(dataset: &TouchstoneDataset) -> Self {
        dataset.to_record()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_format_conversion() {
        let ri = DataFormat::RI.to_complex(1.0, 0.0);
        assert!((ri.re - 1.0).abs() < 1e-10);
        assert!((ri.im - 0.0).abs() < 1e-10);

        let ma = DataFormat::MA.to_complex(1.0, 90.0);
        assert!(ma.re.abs() < 1e-10);
        assert!((ma.im - 1.0).abs() < 1e-10);

        let db = DataFormat::DB.to_complex(0.0, 0.0); // 0 dB = magnitude 1
        assert!((db.re - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_port_count_for_values() {
        assert_eq!(port_count_for_values(2), Some(1));
        assert_eq!(port_count_for_values(8), Some(2));
        assert_eq!(port_count_for_values(32), Some(4));
        assert_eq!(port_count_for_values(0), None);
        assert_eq!(port_count_for_values(6), None);
        assert_eq!(port_count_for_values(7), None);
    }

    #[test]
    fn test_interleaved_layout_is_row_major() {
        // S11, S12, S21, S22
        let values = [0.1, 0.0, 0.2, 0.0, 0.9, -0.1, 0.3, 0.05];
        let point = FrequencyPoint::from_interleaved(Hertz(1e9), &values).unwrap();

        assert_eq!(point.num_ports(), 2);
        assert!((point.s_parameters[[0, 1]].re - 0.2).abs() < 1e-12);
        assert!((point.s_parameters[[1, 0]].re - 0.9).abs() < 1e-12);
        assert!((point.s_parameters[[1, 0]].im + 0.1).abs() < 1e-12);
        assert_eq!(point.interleaved(), values.to_vec());
    }

    #[test]
    fn test_dataset_rejects_mismatched_matrix() {
        let point = FrequencyPoint::from_interleaved(Hertz(1e9), &[0.5, 0.0]).unwrap();
        let result = TouchstoneDataset::from_points(TouchstoneHeader::default(), 2, vec![point]);
        assert!(result.is_err());
    }

    #[test]
    fn test_dataset_basics() {
        let p1 = FrequencyPoint::from_interleaved(
            Hertz::from_ghz(1.0),
            &[0.1, 0.0, 0.9, 0.0, 0.9, 0.0, 0.1, 0.0],
        )
        .unwrap();
        let p2 = FrequencyPoint::from_interleaved(
            Hertz::from_ghz(2.0),
            &[0.2, 0.0, 0.8, 0.0, 0.8, 0.0, 0.2, 0.0],
        )
        .unwrap();
        let ds =
            TouchstoneDataset::from_points(TouchstoneHeader::default(), 2, vec![p1, p2]).unwrap();

        assert_eq!(ds.len(), 2);
        assert!(ds.is_passive());
        assert!(ds.is_reciprocal(1e-12));
        let (lo, hi) = ds.frequency_range().unwrap();
        assert!((lo.as_ghz() - 1.0).abs() < 1e-12);
        assert!((hi.as_ghz() - 2.0).abs() < 1e-12);
        assert!((ds.get_parameter(1, 0)[1].re - 0.8).abs() < 1e-12);

        let record = ds.to_record();
        assert_eq!(record.num_ports, Some(2));
        assert_eq!(record.data_points.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_record_tolerates_missing_fields() {
        let record: SParameterRecord =
            serde_json::from_str(r#"{"data_points": [{"frequency": 1.0, "values": [0.5, 0.0]}]}"#)
                .unwrap();
        assert!(record.header.is_none());
        assert!(record.num_ports.is_none());
        assert_eq!(record.data_points.unwrap()[0].values.len(), 2);
    }
}
