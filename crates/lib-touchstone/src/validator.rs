//! Structural and physical checks on S-parameter data.
//!
//! The validator never modifies or drops data; it only reports. All checks
//! run on every call, so a single pass returns every applicable violation.

use crate::error::ValidationError;
use lib_types::sparams::{ParameterType, SParameterRecord, TouchstoneDataset};

/// Default bound on |S_ij|: unity plus 10% for measurement noise.
pub const DEFAULT_MAGNITUDE_LIMIT: f64 = 1.1;

/// Validator for parsed datasets and their record form.
#[derive(Clone, Copy, Debug)]
pub struct SParameterValidator {
    magnitude_limit: f64,
}

impl Default for SParameterValidator {
    fn default() -> Self {
        Self {
            magnitude_limit: DEFAULT_MAGNITUDE_LIMIT,
        }
    }
}

impl SParameterValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different bound for the magnitude check.
    pub fn with_magnitude_limit(magnitude_limit: f64) -> Self {
        Self { magnitude_limit }
    }

    pub fn magnitude_limit(&self) -> f64 {
        self.magnitude_limit
    }

    /// Validate a parsed dataset. An empty list means valid.
    pub fn validate(&self, dataset: &TouchstoneDataset) -> Vec<String> {
        self.validate_record(&dataset.to_record())
    }

    /// Validate a dataset in record form. An empty list means valid.
    pub fn validate_record(&self, record: &SParameterRecord) -> Vec<String> {
        let mut errors = check_structure(record);
        errors.extend(validate_frequency_range(record));
        errors.extend(validate_port_data(record));
        errors.extend(self.check_magnitudes(record));

        tracing::debug!("Validation finished with {} violation(s)", errors.len());
        errors
    }

    /// Like [`validate`](Self::validate) but as a `Result`.
    pub fn ensure_valid(&self, dataset: &TouchstoneDataset) -> Result<(), ValidationError> {
        let errors = self.validate(dataset);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { errors })
        }
    }

    fn check_magnitudes(&self, record: &SParameterRecord) -> Vec<String> {
        // Y/Z/H/G data is not normalized, so the bound only applies to S.
        let parameter_type = record
            .header
            .map(|h| h.parameter_type)
            .unwrap_or_default();
        if parameter_type != ParameterType::S {
            tracing::debug!(
                "Skipping magnitude check for {:?}-parameters",
                parameter_type
            );
            return Vec::new();
        }

        let Some(points) = record.data_points.as_ref() else {
            return Vec::new();
        };

        points
            .iter()
            .enumerate()
            .filter_map(|(i, point)| {
                point
                    .values
                    .chunks_exact(2)
                    .map(|pair| pair[0].hypot(pair[1]))
                    .find(|&mag| mag > self.magnitude_limit)
                    .map(|mag| {
                        format!(
                            "Point {} ({} Hz): S-parameter magnitude {:.4} exceeds {}",
                            i, point.frequency, mag, self.magnitude_limit
                        )
                    })
            })
            .collect()
    }
}

fn check_structure(record: &SParameterRecord) -> Vec<String> {
    let mut errors = Vec::new();
    if record.header.is_none() {
        errors.push("Missing required field: header".to_string());
    }
    if record.data_points.is_none() {
        errors.push("Missing required field: data_points".to_string());
    }
    if record.num_ports.is_none() {
        errors.push("Missing required field: num_ports".to_string());
    }
    errors
}

/// Frequencies must be non-empty, strictly increasing, and start at or above 0 Hz.
pub fn validate_frequency_range(record: &SParameterRecord) -> Vec<String> {
    let Some(points) = record.data_points.as_ref() else {
        return Vec::new();
    };

    let mut errors = Vec::new();
    if points.is_empty() {
        errors.push("Frequency data must not be empty".to_string());
        return errors;
    }

    if let Some(i) = points
        .windows(2)
        .position(|w| !(w[0].frequency < w[1].frequency))
    {
        errors.push(format!(
            "Frequencies must be strictly increasing (point {}: {} Hz is not below point {}: {} Hz)",
            i,
            points[i].frequency,
            i + 1,
            points[i + 1].frequency
        ));
    }

    if points[0].frequency < 0.0 {
        errors.push(format!(
            "Frequency must not be negative (first point is {} Hz)",
            points[0].frequency
        ));
    }

    errors
}

/// Every point must carry exactly `2 * num_ports^2` values.
///
/// Reports the first offending point only.
pub fn validate_port_data(record: &SParameterRecord) -> Vec<String> {
    let (Some(num_ports), Some(points)) = (record.num_ports, record.data_points.as_ref()) else {
        return Vec::new();
    };

    let expected = 2 * num_ports * num_ports;
    points
        .iter()
        .enumerate()
        .find(|(_, p)| p.values.len() != expected)
        .map(|(i, p)| {
            vec![format!(
                "Point {} has {} values, expected {} for {} ports",
                i,
                p.values.len(),
                expected,
                num_ports
            )]
        })
        .unwrap_or_default()
}
