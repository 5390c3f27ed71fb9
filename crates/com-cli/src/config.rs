//! Simulation configuration loading and validation.

use anyhow::{Context, Result};
use lib_com::SimulationParameters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level simulation configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Simulation name/description.
    pub name: String,

    /// Touchstone file; relative paths are resolved against the config file.
    pub touchstone: PathBuf,

    /// Identifier echoed into the result. Defaults to the Touchstone file stem.
    #[serde(default)]
    pub parameter_id: Option<String>,

    /// COM simulation parameters.
    pub parameters: SimulationParameters,

    /// Output configuration.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Output configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Write one waveform CSV per completed port.
    #[serde(default = "default_true")]
    pub waveforms: bool,

    /// Write network-parameter summary of the channel.
    #[serde(default)]
    pub network_summary: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            waveforms: true,
            network_summary: false,
        }
    }
}

fn default_true() -> bool {
    true
}

impl SimulationConfig {
    pub fn parameter_id(&self) -> String {
        self.parameter_id.clone().unwrap_or_else(|| {
            self.touchstone
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.name.clone())
        })
    }
}

/// Load configuration from a file.
pub fn load_config(path: &Path) -> Result<SimulationConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config = parse_config(&content, path)?;

    if config.touchstone.is_relative() {
        if let Some(dir) = path.parent() {
            config.touchstone = dir.join(&config.touchstone);
        }
    }

    validate_config(&config)?;

    Ok(config)
}

fn parse_config(content: &str, path: &Path) -> Result<SimulationConfig> {
    if path.extension().map_or(false, |e| e == "json") {
        serde_json::from_str(content).with_context(|| "Failed to parse config as JSON")
    } else {
        // Assume TOML
        toml::from_str(content).with_context(|| "Failed to parse config as TOML")
    }
}

/// Validate configuration.
fn validate_config(config: &SimulationConfig) -> Result<()> {
    if !config.touchstone.exists() {
        anyhow::bail!("Touchstone file not found: {:?}", config.touchstone);
    }

    let errors = config.parameters.validate();
    if !errors.is_empty() {
        anyhow::bail!("Invalid simulation parameters:\n  {}", errors.join("\n  "));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_dsp::PrbsOrder;

    const TOML_CONFIG: &str = r#"
name = "lane sweep"
touchstone = "channel.s4p"

[parameters]
frequency_range = [1e6, 2e10]

[parameters.port_mapping]
lane0 = 0
lane1 = 1

[parameters.settings]
resolution = 1e6
max_iterations = 100
sample_rate = 32e9
bit_rate = 4e9
prbs_order = 15
"#;

    #[test]
    fn test_parse_toml() {
        let config = parse_config(TOML_CONFIG, Path::new("sim.toml")).unwrap();
        assert_eq!(config.name, "lane sweep");
        assert_eq!(config.parameters.port_mapping["lane1"], 1);
        assert_eq!(config.parameters.settings.prbs_order, PrbsOrder::Prbs15);
        assert_eq!(config.parameters.settings.num_bits, 1000);
        assert!(config.output.waveforms);
        assert!(config.parameters.validate().is_empty());
        assert_eq!(config.parameter_id(), "channel");
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{
            "name": "single",
            "touchstone": "/data/thru.s2p",
            "parameter_id": "sp-17",
            "parameters": {"frequency_range": [0, 1e10], "port_mapping": {"rx": 1}}
        }"#;
        let config = parse_config(json, Path::new("sim.json")).unwrap();
        assert_eq!(config.parameter_id(), "sp-17");
        // resolution and max_iterations are missing
        assert_eq!(config.parameters.validate().len(), 2);
    }

    #[test]
    fn test_missing_touchstone_rejected() {
        let mut config = parse_config(TOML_CONFIG, Path::new("sim.toml")).unwrap();
        config.touchstone = PathBuf::from("/nonexistent/channel.s4p");
        assert!(validate_config(&config).is_err());
    }
}
