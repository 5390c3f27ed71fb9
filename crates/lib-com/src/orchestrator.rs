//! COM analysis orchestration.
//!
//! Every mapped port is checked against the network before any computation
//! starts. Ports that pass are analyzed in parallel on the rayon pool; a
//! failure is recorded against its own port and never aborts the others.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{ComError, ComResult};
use crate::params::{Settings, ValidatedParameters};
use crate::result::{PortOutcome, PortResult, SimulationResult};
use lib_dsp::{ChannelSynthesizer, EyeDiagramAnalyzer};
use lib_touchstone::{parse_touchstone, SParameterValidator};
use lib_types::sparams::{FrequencyPoint, TouchstoneDataset};
use lib_types::waveform::WaveformStats;
use lib_types::Complex64;
use rayon::prelude::*;

/// Cooperative cancellation flag shared between a caller and a run.
///
/// Checked before each port starts; a port already in progress runs to
/// completion.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Frequency points inside the requested band.
struct Band<'a> {
    freqs: Vec<f64>,
    points: Vec<&'a FrequencyPoint>,
}

impl<'a> Band<'a> {
    fn select(dataset: &'a TouchstoneDataset, (start, end): (f64, f64)) -> Self {
        let points: Vec<&FrequencyPoint> = dataset
            .frequency_points()
            .iter()
            .filter(|p| p.frequency.0 >= start && p.frequency.0 <= end)
            .collect();
        let freqs = points.iter().map(|p| p.frequency.0).collect();
        Self { freqs, points }
    }

    fn response(&self, row: usize, col: usize) -> Vec<Complex64> {
        self.points
            .iter()
            .map(|p| p.s_parameters[[row, col]])
            .collect()
    }
}

/// Drives channel synthesis and eye analysis across a port mapping.
pub struct ComAnalysisOrchestrator {
    params: ValidatedParameters,
    cancel: CancellationToken,
}

impl ComAnalysisOrchestrator {
    pub fn new(params: ValidatedParameters) -> Self {
        Self {
            params,
            cancel: CancellationToken::new(),
        }
    }

    /// Use a caller-owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn params(&self) -> &ValidatedParameters {
        &self.params
    }

    /// Parse Touchstone content, report validation problems, then run.
    ///
    /// Validation findings are logged as warnings and do not stop the run.
    pub fn run_content(&self, content: &str, parameter_id: &str) -> ComResult<SimulationResult> {
        let dataset = parse_touchstone(content)?;
        let violations = SParameterValidator::new().validate(&dataset);
        for violation in &violations {
            tracing::warn!("S-parameter validation: {}", violation);
        }
        self.run(&dataset, parameter_id)
    }

    /// Analyze every mapped port of `dataset`.
    ///
    /// Returns [`ComError::Cancelled`] only when cancellation left no port
    /// completed; every other failure is recorded per port.
    pub fn run(
        &self,
        dataset: &TouchstoneDataset,
        parameter_id: &str,
    ) -> ComResult<SimulationResult> {
        self.run_with(dataset, parameter_id, analyze_port)
    }

    fn run_with<F>(
        &self,
        dataset: &TouchstoneDataset,
        parameter_id: &str,
        analyze: F,
    ) -> ComResult<SimulationResult>
    where
        F: Fn(&Band<'_>, usize, &Settings) -> ComResult<PortResult> + Sync,
    {
        let params = self.params.get();
        let settings = &params.settings;

        tracing::info!(
            "Starting COM analysis '{}': {} mapped ports on a {}-port network",
            parameter_id,
            params.port_mapping.len(),
            dataset.num_ports()
        );

        let mut outcomes = BTreeMap::new();
        let mut runnable = Vec::new();
        for (name, &port) in &params.port_mapping {
            match check_port(name, port, settings.drive_port, dataset.num_ports()) {
                Ok(()) => runnable.push((name.clone(), port)),
                Err(e) => {
                    tracing::warn!("Port '{}' rejected: {}", name, e);
                    outcomes.insert(
                        name.clone(),
                        PortOutcome::Failed {
                            port,
                            error: e.to_string(),
                        },
                    );
                }
            }
        }

        let band = Band::select(dataset, params.frequency_range);
        tracing::debug!("Selected {} frequency points in band", band.points.len());

        let computed: Vec<(String, usize, ComResult<PortResult>)> = runnable
            .into_par_iter()
            .map(|(name, port)| {
                let result = if self.cancel.is_cancelled() {
                    Err(ComError::Cancelled)
                } else {
                    analyze(&band, port, settings)
                };
                (name, port, result)
            })
            .collect();

        let mut cancelled = false;
        for (name, port, result) in computed {
            let outcome = match result {
                Ok(r) => PortOutcome::Completed(r),
                Err(e) => {
                    cancelled |= matches!(e, ComError::Cancelled);
                    tracing::warn!("Port '{}' (index {}) failed: {}", name, port, e);
                    PortOutcome::Failed {
                        port,
                        error: e.to_string(),
                    }
                }
            };
            outcomes.insert(name, outcome);
        }

        let result = SimulationResult::from_outcomes(parameter_id, outcomes);
        if cancelled {
            tracing::info!("COM analysis '{}' cancelled", parameter_id);
            if !result.success {
                return Err(ComError::Cancelled);
            }
        }

        tracing::info!(
            "COM analysis '{}' finished: {} completed, {} failed",
            parameter_id,
            result.completed().count(),
            result.failures().count()
        );
        Ok(result)
    }
}

fn check_port(
    name: &str,
    port: usize,
    drive_port: Option<usize>,
    num_ports: usize,
) -> ComResult<()> {
    for p in std::iter::once(port).chain(drive_port) {
        if p >= num_ports {
            return Err(ComError::PortMapping {
                name: name.to_string(),
                port: p,
                num_ports,
            });
        }
    }
    Ok(())
}

fn analyze_port(band: &Band<'_>, port: usize, settings: &Settings) -> ComResult<PortResult> {
    let drive = settings.drive_port.unwrap_or(port);
    let response = band.response(port, drive);

    let time_data = ChannelSynthesizer::new(settings.sample_rate, settings.bit_rate)
        .with_num_bits(settings.num_bits)
        .with_prbs_order(settings.prbs_order)
        .synthesize(&band.freqs, &response)?;
    let eye_params = EyeDiagramAnalyzer::new(settings.sample_rate, settings.bit_rate)
        .analyze(&time_data)?;
    let analysis = WaveformStats::from_samples(&time_data);

    tracing::debug!(
        "Port {} (driven from {}) analyzed: eye height {:.4}",
        port,
        drive,
        eye_params.height
    );

    Ok(PortResult {
        port,
        time_data,
        eye_params,
        analysis,
    })
}
