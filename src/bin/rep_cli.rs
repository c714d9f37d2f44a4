use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rep_tracker::config::AppConfig;
use rep_tracker::fixtures::synthetic::SyntheticTraceSpec;
use rep_tracker::fixtures::{ExpectationDiff, ReplayReport, TraceCatalog, TraceProcessor};
use rep_tracker::ConfigError;

#[derive(Parser, Debug)]
#[command(
    name = "rep_cli",
    about = "Deterministic marker-trace harness for the rep tracker"
)]
struct Cli {
    /// Override directory containing trace fixtures (defaults to ./fixtures of the crate)
    #[arg(long, global = true)]
    fixtures_dir: Option<PathBuf>,
    /// Log verbosity written to stderr
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a trace and optionally compare against expectations
    Replay {
        #[arg(long)]
        fixture: String,
        #[arg(long)]
        expect: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Include every frame's result in the report
        #[arg(long, default_value_t = false)]
        frames: bool,
        #[command(flatten)]
        tuning: TuningArgs,
    },
    /// Stream per-frame results for a trace to stdout as JSON lines
    Stream {
        #[arg(long)]
        fixture: String,
        #[command(flatten)]
        tuning: TuningArgs,
    },
    /// Generate a seeded synthetic trace
    Synth(SynthArgs),
    /// List available traces on disk
    DumpFixtures,
}

/// Detector overrides applied on top of the config file and the trace.
#[derive(Args, Debug, Clone)]
struct TuningArgs {
    /// JSON config file (defaults to $REP_TRACKER_CONFIG or built-in defaults)
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    top: Option<f64>,
    #[arg(long)]
    bottom: Option<f64>,
    #[arg(long)]
    min_frames: Option<u32>,
    #[arg(long)]
    marker_id: Option<u32>,
}

#[derive(Args, Debug, Clone)]
struct SynthArgs {
    #[arg(long)]
    output: PathBuf,
    #[arg(long)]
    name: Option<String>,
    #[arg(long, default_value_t = 5)]
    reps: u32,
    #[arg(long, default_value_t = 7)]
    seed: u64,
    /// Noise amplitude in pixels
    #[arg(long, default_value_t = 6.0)]
    noise: f64,
    /// Probability that the tracked marker is missing on a frame
    #[arg(long, default_value_t = 0.05)]
    dropout: f64,
    /// Probability of a single-frame spike in the standing half
    #[arg(long, default_value_t = 0.02)]
    spikes: f64,
    /// Frames per dip; values below 8 are raised to 8
    #[arg(long, default_value_t = 40)]
    frames_per_rep: u32,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let catalog = cli
        .fixtures_dir
        .map(TraceCatalog::new)
        .unwrap_or_default();

    match cli.command {
        Commands::Replay {
            fixture,
            expect,
            output,
            frames,
            tuning,
        } => run_replay(&catalog, &fixture, expect, output, frames, &tuning),
        Commands::Stream { fixture, tuning } => run_stream(&catalog, &fixture, &tuning),
        Commands::Synth(args) => run_synth(args),
        Commands::DumpFixtures => run_dump(&catalog),
    }
}

fn init_logging(level: LogLevel) {
    // stdout carries JSON; logs go to stderr
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::from(level))
        .with_writer(std::io::stderr)
        .init();
}

fn run_replay(
    catalog: &TraceCatalog,
    fixture: &str,
    override_expect: Option<PathBuf>,
    output_path: Option<PathBuf>,
    keep_frames: bool,
    tuning: &TuningArgs,
) -> Result<ExitCode> {
    let data = catalog.load(fixture, override_expect)?;
    let processor = TraceProcessor::new(base_config(tuning)).with_frames(keep_frames);
    let config = apply_overrides(processor.config_for(&data.trace), tuning)?;
    let report = processor
        .run_with_config(&data.trace, &config)
        .with_context(|| format!("replaying fixture {}", fixture))?;

    emit_report(&report, output_path)?;

    if let Some(expectations) = data.expectations {
        match expectations.verify(&report) {
            Ok(()) => Ok(ExitCode::from(0)),
            Err(diff) => {
                emit_diff(&diff)?;
                Ok(ExitCode::from(2))
            }
        }
    } else {
        Ok(ExitCode::from(0))
    }
}

fn run_stream(catalog: &TraceCatalog, fixture: &str, tuning: &TuningArgs) -> Result<ExitCode> {
    let data = catalog.load(fixture, None)?;
    let processor = TraceProcessor::new(base_config(tuning)).with_frames(true);
    let config = apply_overrides(processor.config_for(&data.trace), tuning)?;
    let report = processor
        .run_with_config(&data.trace, &config)
        .with_context(|| format!("replaying fixture {}", fixture))?;

    for record in report.frames {
        println!("{}", serde_json::to_string(&record)?);
    }

    Ok(ExitCode::from(0))
}

fn run_synth(args: SynthArgs) -> Result<ExitCode> {
    let spec = SyntheticTraceSpec {
        name: args.name.unwrap_or_else(|| format!("synthetic-{}", args.seed)),
        reps: args.reps,
        frames_per_rep: args.frames_per_rep,
        noise_px: args.noise,
        dropout_probability: args.dropout,
        spike_probability: args.spikes,
        seed: args.seed,
        ..SyntheticTraceSpec::default()
    };
    let trace = spec.generate();
    trace.write_json_file(&args.output)?;

    println!(
        "Wrote {} frames ({} reps) to {}",
        trace.frames.len(),
        spec.expected_reps(),
        args.output.display()
    );
    Ok(ExitCode::from(0))
}

fn run_dump(catalog: &TraceCatalog) -> Result<ExitCode> {
    let traces = catalog.discover()?;
    if traces.is_empty() {
        println!("No fixtures found under {}", catalog.root().display());
        return Ok(ExitCode::from(0));
    }

    for metadata in traces {
        if let Some(expect) = metadata.expect_path {
            println!("{} -> {}", metadata.name, expect.display());
        } else {
            println!("{}", metadata.name);
        }
    }
    Ok(ExitCode::from(0))
}

fn base_config(tuning: &TuningArgs) -> AppConfig {
    match &tuning.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::load(),
    }
}

/// Command-line overrides win over both the config file and the trace.
fn apply_overrides(mut config: AppConfig, tuning: &TuningArgs) -> Result<AppConfig, ConfigError> {
    let detector = &mut config.tracking.detector;
    if let Some(top) = tuning.top {
        detector.top_threshold = top;
    }
    if let Some(bottom) = tuning.bottom {
        detector.bottom_threshold = bottom;
    }
    if let Some(frames) = tuning.min_frames {
        detector.min_frames_below = frames;
    }
    if let Some(id) = tuning.marker_id {
        config.tracking.tracked_marker_id = id;
    }
    config.validate()?;
    Ok(config)
}

fn emit_report(report: &ReplayReport, output_path: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;

    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    Ok(())
}

fn emit_diff(diff: &ExpectationDiff) -> Result<()> {
    let json = serde_json::to_string_pretty(&diff.to_json())?;
    eprintln!("{json}");
    Ok(())
}
