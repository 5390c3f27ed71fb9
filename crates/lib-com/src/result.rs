//! Simulation result types.

use std::collections::BTreeMap;

use lib_types::waveform::{EyeDiagramParams, WaveformStats};
use serde::{Deserialize, Serialize};

/// Value of [`SimulationResult::simulation_type`].
pub const SIMULATION_TYPE: &str = "com";

/// Completed analysis of one mapped port.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortResult {
    pub port: usize,
    pub time_data: Vec<f64>,
    pub eye_params: EyeDiagramParams,
    pub analysis: WaveformStats,
}

/// Entry of [`SimulationResult::port_results`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortOutcome {
    Completed(PortResult),
    Failed { port: usize, error: String },
}

impl PortOutcome {
    pub fn port(&self) -> usize {
        match self {
            Self::Completed(r) => r.port,
            Self::Failed { port, .. } => *port,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn result(&self) -> Option<&PortResult> {
        match self {
            Self::Completed(r) => Some(r),
            Self::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Completed(_) => None,
            Self::Failed { error, .. } => Some(error),
        }
    }
}

/// Aggregate result of a COM run.
///
/// `success` is true when at least one port completed. Failed ports keep an
/// entry carrying the error instead of a result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub simulation_type: String,
    pub parameter_id: String,
    pub port_results: BTreeMap<String, PortOutcome>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SimulationResult {
    /// Assemble from per-port outcomes, deriving `success` and `error`.
    pub fn from_outcomes(
        parameter_id: impl Into<String>,
        port_results: BTreeMap<String, PortOutcome>,
    ) -> Self {
        let success = port_results.values().any(PortOutcome::is_completed);
        let error = if success {
            None
        } else if port_results.is_empty() {
            Some("No ports were analyzed".to_string())
        } else {
            let failures: Vec<String> = port_results
                .iter()
                .filter_map(|(name, o)| o.error().map(|e| format!("{name}: {e}")))
                .collect();
            Some(format!("No port produced a result ({})", failures.join("; ")))
        };

        Self {
            simulation_type: SIMULATION_TYPE.to_string(),
            parameter_id: parameter_id.into(),
            port_results,
            success,
            error,
        }
    }

    /// Completed ports only.
    pub fn completed(&self) -> impl Iterator<Item = (&str, &PortResult)> {
        self.port_results
            .iter()
            .filter_map(|(name, o)| o.result().map(|r| (name.as_str(), r)))
    }

    /// Failed ports with their error messages.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.port_results
            .iter()
            .filter_map(|(name, o)| o.error().map(|e| (name.as_str(), e)))
    }
}
