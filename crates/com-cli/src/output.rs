//! Result output formatting and writing.

use crate::OutputFormat;
use anyhow::Result;
use lib_com::SimulationResult;
use lib_types::waveform::EyeDiagramParams;
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

/// Write simulation results to the output directory.
///
/// `result.json` always holds the full result. Eye metrics follow `format`,
/// and each completed port optionally gets its waveform as CSV.
pub fn write_results(
    result: &SimulationResult,
    output_dir: &Path,
    format: OutputFormat,
    waveforms: bool,
) -> Result<()> {
    let json_path = output_dir.join("result.json");
    std::fs::write(&json_path, serde_json::to_string_pretty(result)?)?;
    tracing::info!("Wrote result to {:?}", json_path);

    let metrics_path = output_dir.join(match format {
        OutputFormat::Text => "eye_metrics.txt",
        OutputFormat::Json => "eye_metrics.json",
        OutputFormat::Csv => "eye_metrics.csv",
    });
    std::fs::write(&metrics_path, format_port_metrics(result, format)?)?;
    tracing::info!("Wrote eye metrics to {:?}", metrics_path);

    if waveforms {
        for (name, port) in result.completed() {
            let wf_path = output_dir.join(format!("waveform_{name}.csv"));
            let mut f = std::io::BufWriter::new(std::fs::File::create(&wf_path)?);
            writeln!(f, "sample,value")?;
            for (i, v) in port.time_data.iter().enumerate() {
                writeln!(f, "{},{}", i, v)?;
            }
            f.flush()?;
            tracing::debug!("Wrote waveform to {:?}", wf_path);
        }
    }

    Ok(())
}

/// Per-port eye metrics and failures.
pub fn format_port_metrics(result: &SimulationResult, format: OutputFormat) -> Result<String> {
    let mut out = String::new();
    match format {
        OutputFormat::Text => {
            writeln!(out, "COM Simulation: {}", result.parameter_id)?;
            writeln!(out, "==================")?;
            writeln!(out, "Success: {}", result.success)?;
            if let Some(err) = &result.error {
                writeln!(out, "Error:   {}", err)?;
            }
            for (name, port) in result.completed() {
                writeln!(out, "\n[{}] port {}", name, port.port)?;
                out.push_str(&format_eye(&port.eye_params, format)?);
                writeln!(out, "Mean:           {:.6}", port.analysis.mean)?;
                writeln!(out, "RMS:            {:.6}", port.analysis.rms)?;
            }
            for (name, err) in result.failures() {
                writeln!(out, "\n[{}] FAILED: {}", name, err)?;
            }
        }
        OutputFormat::Json => {
            let metrics: serde_json::Map<String, serde_json::Value> = result
                .port_results
                .iter()
                .map(|(name, outcome)| {
                    let value = match outcome.result() {
                        Some(r) => serde_json::json!({
                            "port": r.port,
                            "eye_params": r.eye_params,
                            "analysis": r.analysis,
                        }),
                        None => serde_json::json!({
                            "port": outcome.port(),
                            "error": outcome.error(),
                        }),
                    };
                    (name.clone(), value)
                })
                .collect();
            writeln!(out, "{}", serde_json::to_string_pretty(&metrics)?)?;
        }
        OutputFormat::Csv => {
            writeln!(out, "name,port,height,width,jitter,crossing_percentage,error")?;
            for (name, outcome) in &result.port_results {
                match outcome.result() {
                    Some(r) => {
                        let e = &r.eye_params;
                        writeln!(
                            out,
                            "{},{},{},{},{},{},",
                            name, r.port, e.height, e.width, e.jitter, e.crossing_percentage
                        )?;
                    }
                    None => {
                        let err = outcome.error().unwrap_or_default().replace('"', "'");
                        writeln!(out, "{},{},,,,,\"{}\"", name, outcome.port(), err)?;
                    }
                }
            }
        }
    }
    Ok(out)
}

/// A single set of eye metrics.
pub fn format_eye(eye: &EyeDiagramParams, format: OutputFormat) -> Result<String> {
    let mut out = String::new();
    match format {
        OutputFormat::Text => {
            writeln!(out, "Eye Height:     {:.6}", eye.height)?;
            writeln!(out, "Eye Width (UI): {:.4}", eye.width)?;
            writeln!(out, "Jitter:         {:.6} samples", eye.jitter)?;
            writeln!(out, "Crossing:       {:.2} %", eye.crossing_percentage)?;
        }
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(eye)?)?;
        }
        OutputFormat::Csv => {
            writeln!(out, "metric,value")?;
            writeln!(out, "height,{}", eye.height)?;
            writeln!(out, "width,{}", eye.width)?;
            writeln!(out, "jitter,{}", eye.jitter)?;
            writeln!(out, "crossing_percentage,{}", eye.crossing_percentage)?;
        }
    }
    Ok(out)
}

/// Frequency-indexed columns as a table.
///
/// Every column must have one value per frequency.
pub fn format_series(
    freqs: &[f64],
    columns: &[(&str, Vec<f64>)],
    format: OutputFormat,
) -> Result<String> {
    let mut out = String::new();
    match format {
        OutputFormat::Text => {
            write!(out, "{:>14}", "freq_ghz")?;
            for (name, _) in columns {
                write!(out, " {:>14}", name)?;
            }
            writeln!(out)?;
            for (i, f) in freqs.iter().enumerate() {
                write!(out, "{:>14.6}", f / 1e9)?;
                for (_, values) in columns {
                    write!(out, " {:>14.6}", values[i])?;
                }
                writeln!(out)?;
            }
        }
        OutputFormat::Json => {
            let mut table = serde_json::Map::new();
            table.insert("frequency_hz".to_string(), serde_json::json!(freqs));
            for (name, values) in columns {
                table.insert(name.to_string(), serde_json::json!(values));
            }
            writeln!(out, "{}", serde_json::to_string_pretty(&table)?)?;
        }
        OutputFormat::Csv => {
            write!(out, "frequency_hz")?;
            for (name, _) in columns {
                write!(out, ",{}", name)?;
            }
            writeln!(out)?;
            for (i, f) in freqs.iter().enumerate() {
                write!(out, "{}", f)?;
                for (_, values) in columns {
                    write!(out, ",{}", values[i])?;
                }
                writeln!(out)?;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_com::{PortOutcome, PortResult};
    use lib_types::waveform::WaveformStats;
    use std::collections::BTreeMap;

    fn sample_result() -> SimulationResult {
        let ok = PortOutcome::Completed(PortResult {
            port: 0,
            time_data: vec![1.0, -1.0],
            eye_params: EyeDiagramParams {
                height: 2.0,
                width: 1.0,
                jitter: 0.0,
                crossing_percentage: 50.0,
            },
            analysis: WaveformStats::from_samples(&[1.0, -1.0]),
        });
        let bad = PortOutcome::Failed {
            port: 9,
            error: "Port mapping 'b': port 9 out of range for 2-port network".to_string(),
        };
        SimulationResult::from_outcomes(
            "sp",
            BTreeMap::from([("a".to_string(), ok), ("b".to_string(), bad)]),
        )
    }

    #[test]
    fn test_csv_metrics() {
        let csv = format_port_metrics(&sample_result(), OutputFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "a,0,2,1,0,50,");
        assert!(lines[2].starts_with("b,9,,,,,\""));
    }

    #[test]
    fn test_text_metrics_lists_failures() {
        let text = format_port_metrics(&sample_result(), OutputFormat::Text).unwrap();
        assert!(text.contains("[a] port 0"));
        assert!(text.contains("[b] FAILED"));
    }

    #[test]
    fn test_series_csv() {
        let csv = format_series(
            &[1e9, 2e9],
            &[("rl_db", vec![20.0, 18.5])],
            OutputFormat::Csv,
        )
        .unwrap();
        assert_eq!(csv, "frequency_hz,rl_db\n1000000000,20\n2000000000,18.5\n");
    }
}
