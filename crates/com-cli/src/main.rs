//! sparam-com: Touchstone analysis and COM eye simulation.
//!
//! This is the command-line entry point over the workspace libraries.

mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lib_com::{simulation_fingerprint, ComAnalysisOrchestrator};
use lib_dsp::prbs::{generate_bits, hold_upsample, run_length_stats, to_nrz, PrbsOrder, PrbsState};
use lib_dsp::{EyeDiagramAnalyzer, NetworkAnalyzer};
use lib_touchstone::{parse_touchstone_file, SParameterValidator};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "sparam-com")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and validate a Touchstone file
    Parse {
        /// Path to the .sNp file
        file: PathBuf,

        /// S-parameter magnitude bound for validation
        #[arg(long, default_value_t = lib_touchstone::DEFAULT_MAGNITUDE_LIMIT)]
        magnitude_limit: f64,
    },

    /// Compute network parameters for a port or port pair
    Analyze {
        /// Path to the .sNp file
        file: PathBuf,

        /// Port index (0-based)
        #[arg(short, long, default_value = "0")]
        port: usize,

        /// Second port for insertion loss and group delay (0-based)
        #[arg(long)]
        port2: Option<usize>,

        /// Reference impedance for the port impedance (ohms)
        #[arg(long, default_value = "50.0")]
        z0: f64,

        /// Print return/insertion loss for every port instead
        #[arg(long)]
        summary: bool,
    },

    /// Run a COM simulation
    Simulate {
        /// Path to the simulation configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Output directory for results
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },

    /// Generate a PRBS waveform
    GeneratePrbs {
        /// PRBS order (7, 9, 11, 15, 23, 31)
        #[arg(short, long, default_value = "7")]
        order: u8,

        /// Number of bits to generate
        #[arg(short, long, default_value = "1000")]
        bits: usize,

        /// Samples per bit
        #[arg(short, long, default_value = "1")]
        samples_per_bit: usize,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compute eye diagram metrics from a waveform
    Eye {
        /// Path to waveform CSV (`value` or `sample,value` rows)
        waveform: PathBuf,

        /// Sample rate (Hz)
        #[arg(long, default_value = "1e9")]
        sample_rate: f64,

        /// Bit rate (b/s)
        #[arg(long, default_value = "1e9")]
        bit_rate: f64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Parse { file, magnitude_limit } => {
            parse(&file, magnitude_limit)?;
        }
        Commands::Analyze { file, port, port2, z0, summary } => {
            analyze(&file, port, port2, z0, summary, cli.format)?;
        }
        Commands::Simulate { config, output } => {
            run_simulation(&config, &output, cli.format)?;
        }
        Commands::GeneratePrbs { order, bits, samples_per_bit, output } => {
            generate_prbs(order, bits, samples_per_bit, output)?;
        }
        Commands::Eye { waveform, sample_rate, bit_rate } => {
            compute_eye(&waveform, sample_rate, bit_rate, cli.format)?;
        }
    }

    Ok(())
}

fn parse(file: &Path, magnitude_limit: f64) -> Result<()> {
    tracing::info!("Parsing Touchstone file: {:?}", file);

    let ts = parse_touchstone_file(file)
        .with_context(|| format!("Failed to parse {:?}", file))?;
    let header = ts.header();

    println!("Touchstone File");
    println!("  Ports: {}", ts.num_ports());
    println!("  Unit: {:?}", header.unit);
    println!("  Parameter: {:?}", header.parameter_type);
    println!("  Format: {:?}", header.format);
    println!("  Z0: {} ohms", header.reference_impedance.0);
    println!("  Frequency points: {}", ts.len());

    if let Some((f_min, f_max)) = ts.frequency_range() {
        println!("  Frequency range: {:.2} MHz - {:.2} GHz", f_min.as_mhz(), f_max.as_ghz());
    }

    println!("  Passive: {}", if ts.is_passive() { "Yes" } else { "No" });
    println!("  Reciprocal: {}", if ts.is_reciprocal(1e-6) { "Yes" } else { "No" });

    let violations = SParameterValidator::with_magnitude_limit(magnitude_limit).validate(&ts);
    if violations.is_empty() {
        println!("\nValidation: OK");
    } else {
        println!("\nValidation: {} problem(s)", violations.len());
        for v in &violations {
            println!("  - {}", v);
        }
    }

    Ok(())
}

fn analyze(
    file: &Path,
    port: usize,
    port2: Option<usize>,
    z0: f64,
    summary: bool,
    format: OutputFormat,
) -> Result<()> {
    let ts = parse_touchstone_file(file)
        .with_context(|| format!("Failed to parse {:?}", file))?;
    let analyzer = NetworkAnalyzer::new(ts.frequency_points());

    if summary {
        print!("{}", serde_json::to_string_pretty(&analyzer.summary())?);
        println!();
        return Ok(());
    }

    let freqs = ts.frequencies();
    let values = |series: Vec<(f64, f64)>| series.into_iter().map(|(_, v)| v).collect::<Vec<_>>();

    let impedance = analyzer.impedance(port, z0)?;
    let mut columns = vec![
        ("return_loss_db", values(analyzer.return_loss(port)?)),
        ("vswr", values(analyzer.vswr(port)?)),
        ("z_re", impedance.iter().map(|(_, z)| z.re).collect()),
        ("z_im", impedance.iter().map(|(_, z)| z.im).collect()),
    ];
    if let Some(p2) = port2 {
        columns.push(("insertion_loss_db", values(analyzer.insertion_loss(port, p2)?)));
    }
    if ts.num_ports() == 2 {
        columns.push(("k_factor", values(analyzer.stability_factor())));
    }
    print!("{}", output::format_series(&freqs, &columns, format)?);

    if let Some(p2) = port2 {
        let delay = analyzer.group_delay(port, p2)?;
        let delay_freqs: Vec<f64> = delay.iter().map(|(f, _)| *f).collect();
        let delay_ps: Vec<f64> = delay.iter().map(|(_, d)| d * 1e12).collect();
        println!();
        print!(
            "{}",
            output::format_series(&delay_freqs, &[("group_delay_ps", delay_ps)], format)?
        );
    }

    Ok(())
}

fn run_simulation(config_path: &Path, output_dir: &Path, format: OutputFormat) -> Result<()> {
    tracing::info!("Loading configuration from {:?}", config_path);

    let config = config::load_config(config_path)?;
    let content = std::fs::read_to_string(&config.touchstone)
        .with_context(|| format!("Failed to read {:?}", config.touchstone))?;
    let fingerprint = simulation_fingerprint(&content, &config.parameters)?;
    tracing::info!("Simulation '{}' (fingerprint {})", config.name, fingerprint);

    let params = config.parameters.clone().into_validated()?;
    let orchestrator = ComAnalysisOrchestrator::new(params);
    let result = orchestrator.run_content(&content, &config.parameter_id())?;

    std::fs::create_dir_all(output_dir)?;
    output::write_results(&result, output_dir, format, config.output.waveforms)?;
    std::fs::write(output_dir.join("fingerprint.txt"), format!("{fingerprint}\n"))?;

    if config.output.network_summary {
        let ts = lib_touchstone::parse_touchstone(&content)?;
        let summary = NetworkAnalyzer::new(ts.frequency_points()).summary();
        std::fs::write(
            output_dir.join("network_summary.json"),
            serde_json::to_string_pretty(&summary)?,
        )?;
    }

    print!("{}", output::format_port_metrics(&result, OutputFormat::Text)?);
    tracing::info!("Simulation complete. Results written to {:?}", output_dir);

    if !result.success {
        anyhow::bail!(result.error.unwrap_or_else(|| "Simulation failed".to_string()));
    }
    Ok(())
}

fn generate_prbs(
    order: u8,
    bits: usize,
    samples_per_bit: usize,
    output: Option<PathBuf>,
) -> Result<()> {
    let order = PrbsOrder::try_from(order).map_err(anyhow::Error::msg)?;
    anyhow::ensure!(samples_per_bit > 0, "samples_per_bit must be at least 1");

    tracing::info!("Generating PRBS-{} with {} bits", order.bits(), bits);

    let (seq, _) = generate_bits(PrbsState::seeded(order), bits);
    let waveform = hold_upsample(&to_nrz(&seq), samples_per_bit);
    let runs = run_length_stats(&seq);

    println!("Generated PRBS-{} waveform:", order.bits());
    println!("  Bits: {}", bits);
    println!("  Samples: {}", waveform.len());
    println!("  Samples/bit: {}", samples_per_bit);
    println!("  Longest runs: {} ones, {} zeros", runs.max_ones_run(), runs.max_zeros_run());

    if let Some(output_path) = output {
        // Write as CSV
        let mut writer = std::io::BufWriter::new(std::fs::File::create(&output_path)?);
        writeln!(writer, "sample,value")?;
        for (i, &v) in waveform.iter().enumerate() {
            writeln!(writer, "{},{}", i, v)?;
        }
        writer.flush()?;
        println!("  Written to: {:?}", output_path);
    }

    Ok(())
}

fn compute_eye(
    waveform_path: &Path,
    sample_rate: f64,
    bit_rate: f64,
    format: OutputFormat,
) -> Result<()> {
    tracing::info!("Computing eye diagram from {:?}", waveform_path);

    let content = std::fs::read_to_string(waveform_path)
        .with_context(|| format!("Failed to read {:?}", waveform_path))?;
    let samples = read_waveform_csv(&content)?;

    let eye = EyeDiagramAnalyzer::new(sample_rate, bit_rate).analyze(&samples)?;
    print!("{}", output::format_eye(&eye, format)?);

    Ok(())
}

/// Values from the last column; non-numeric rows (headers) are skipped.
fn read_waveform_csv(content: &str) -> Result<Vec<f64>> {
    let samples: Vec<f64> = content
        .lines()
        .filter_map(|line| line.split(',').last())
        .filter_map(|field| field.trim().parse().ok())
        .collect();
    anyhow::ensure!(!samples.is_empty(), "No numeric samples found");
    Ok(samples)
}
