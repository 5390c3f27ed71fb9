//! # lib-com
//!
//! COM (Channel Operating Margin) simulation over Touchstone channels.
//!
//! A run takes validated [`SimulationParameters`] and a parsed dataset,
//! synthesizes a PRBS response for every mapped port, extracts eye metrics,
//! and assembles a JSON-serializable [`SimulationResult`]. Ports are analyzed
//! independently; one failing port never aborts the others.

pub mod error;
pub mod fingerprint;
pub mod orchestrator;
pub mod params;
pub mod result;

pub use error::{ComError, ComResult};
pub use fingerprint::simulation_fingerprint;
pub use orchestrator::{CancellationToken, ComAnalysisOrchestrator};
pub use params::{Settings, SimulationParameters, ValidatedParameters};
pub use result::{PortOutcome, PortResult, SimulationResult, SIMULATION_TYPE};
