//! Simulation parameters and their validation.

use std::collections::BTreeMap;

use crate::error::{ComError, ComResult};
use lib_dsp::channel::DEFAULT_NUM_BITS;
use lib_dsp::PrbsOrder;
use serde::{Deserialize, Serialize};

/// Requested COM simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    /// `(start, end)` in Hz, inclusive on both ends.
    pub frequency_range: (f64, f64),

    /// Logical name to 0-based port index.
    pub port_mapping: BTreeMap<String, usize>,

    #[serde(default)]
    pub settings: Settings,
}

/// Solver settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Required by validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<f64>,

    /// Required by validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u32>,

    /// Samples per second.
    #[serde(default = "default_rate")]
    pub sample_rate: f64,

    /// Bits per second.
    #[serde(default = "default_rate")]
    pub bit_rate: f64,

    #[serde(default = "default_num_bits")]
    pub num_bits: usize,

    #[serde(default)]
    pub prbs_order: PrbsOrder,

    /// Column of the S-matrix driving every mapped port. When unset, each
    /// port uses its own reflection term `S[p, p]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_port: Option<usize>,

    /// Unrecognized keys, kept as given.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn default_rate() -> f64 {
    1e9
}

fn default_num_bits() -> usize {
    DEFAULT_NUM_BITS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            resolution: None,
            max_iterations: None,
            sample_rate: default_rate(),
            bit_rate: default_rate(),
            num_bits: default_num_bits(),
            prbs_order: PrbsOrder::default(),
            drive_port: None,
            extra: BTreeMap::new(),
        }
    }
}

impl SimulationParameters {
    pub fn new(frequency_range: (f64, f64), port_mapping: BTreeMap<String, usize>) -> Self {
        Self {
            frequency_range,
            port_mapping,
            settings: Settings::default(),
        }
    }

    /// List every violation; empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let (start, end) = self.frequency_range;
        let s = &self.settings;

        if !(start < end) {
            errors.push(format!(
                "Start frequency ({start}) must be less than end frequency ({end})"
            ));
        }
        if self.port_mapping.is_empty() {
            errors.push("Port mapping must not be empty".to_string());
        }
        if s.resolution.is_none() {
            errors.push("Missing required setting: resolution".to_string());
        }
        if s.max_iterations.is_none() {
            errors.push("Missing required setting: max_iterations".to_string());
        }
        if !(s.sample_rate.is_finite() && s.sample_rate > 0.0) {
            errors.push(format!("sample_rate must be positive, got {}", s.sample_rate));
        }
        if !(s.bit_rate.is_finite() && s.bit_rate > 0.0) {
            errors.push(format!("bit_rate must be positive, got {}", s.bit_rate));
        } else if s.sample_rate < s.bit_rate {
            errors.push(format!(
                "sample_rate ({}) must be at least bit_rate ({})",
                s.sample_rate, s.bit_rate
            ));
        }
        if s.num_bits == 0 {
            errors.push("num_bits must be at least 1".to_string());
        }

        errors
    }

    /// Validate and wrap, or return every violation.
    pub fn into_validated(self) -> ComResult<ValidatedParameters> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(ValidatedParameters(self))
        } else {
            Err(ComError::InvalidParameters(errors))
        }
    }
}

/// Parameters that passed [`SimulationParameters::validate`].
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedParameters(SimulationParameters);

impl ValidatedParameters {
    pub fn get(&self) -> &SimulationParameters {
        &self.0
    }
}

impl TryFrom<SimulationParameters> for ValidatedParameters {
    type Error = ComError;

    fn try_from(params: SimulationParameters) -> ComResult<Self> {
        params.into_validated()
    }
}
