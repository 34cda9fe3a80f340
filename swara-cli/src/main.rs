//! # Swara - Sung Note Analyzer
//!
//! Command line front end for `swara-core`. Decodes a recording, runs the
//! file or live-input pipeline, and prints the stable notes it found, with
//! absolute note names or sargam labels relative to a chosen root key.
//!
//! ## Commands
//! - `analyze`: note timeline of a WAV file (table or JSON)
//! - `at`: the note sounding at a playback position
//! - `record`: capture a microphone take and analyze it (feature `mic`)
//! - `show-config` / `validate-config`: inspect analysis presets

#[cfg(feature = "mic")]
mod capture;
mod report;
mod wav;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use swara_core::{
    AnalysisConfig, LabelConfig, NoteLabeler, Pipeline, SampleBuffer, TracingObserver,
    find_active_note,
};
use tracing::info;

/// Stable-note analysis for sung and played melodies
#[derive(Parser)]
#[command(name = "swara")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Log pipeline stages
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every analyzing command.
#[derive(Args, Clone)]
struct AnalysisArgs {
    /// Use the live-input preset (normalization, overlap, smoothing, gap fill)
    #[arg(long)]
    live: bool,

    /// JSON analysis configuration; overrides the preset
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root key for scale-degree labels, e.g. C, F#, Bb
    #[arg(short, long)]
    root: Option<String>,

    /// Print sargam labels instead of note names
    #[arg(long)]
    sargam: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the stable notes of a WAV file
    Analyze {
        input: PathBuf,

        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the note active at a playback position
    At {
        input: PathBuf,

        /// Position in seconds
        seconds: f64,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },
    /// Record from the default microphone and analyze the take
    #[cfg(feature = "mic")]
    Record {
        /// Take length in seconds
        #[arg(short, long, default_value_t = 5.0)]
        seconds: f32,

        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print a preset configuration as JSON
    ShowConfig {
        /// Show the live-input preset
        #[arg(long)]
        live: bool,
    },
    /// Check a JSON configuration file
    ValidateConfig { config: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "swara=debug,swara_core=debug" } else { "swara=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Analyze { input, analysis, json } => {
            let buffer = wav::load(&input)?;
            print_analysis(buffer, &analysis, json)?;
        }
        Commands::At { input, seconds, analysis } => {
            let buffer = wav::load(&input)?;
            let (pipeline, labeler) = build_pipeline(&analysis)?;
            let notes = pipeline.analyze(buffer);
            match find_active_note(&notes, seconds) {
                Some(note) => println!(
                    "{:.3}s: {} ({:.2} Hz, {:+.1} cents)",
                    seconds,
                    labeler.label(note),
                    note.average_frequency,
                    note.cents_deviation
                ),
                None => println!("{:.3}s: no note", seconds),
            }
        }
        #[cfg(feature = "mic")]
        Commands::Record { seconds, mut analysis, json } => {
            analysis.live = true;
            info!(seconds, "recording");
            let buffer = capture::record(seconds)?;
            print_analysis(buffer, &analysis, json)?;
        }
        Commands::ShowConfig { live } => {
            let config = if live { AnalysisConfig::live_input() } else { AnalysisConfig::file() };
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::ValidateConfig { config } => {
            let config = load_config(&config)?;
            config.validate()?;
            println!("Configuration is valid");
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn print_analysis(buffer: SampleBuffer, args: &AnalysisArgs, json: bool) -> Result<()> {
    let (pipeline, labeler) = build_pipeline(args)?;
    info!(
        seconds = buffer.duration(),
        sample_rate = buffer.sample_rate(),
        live = args.live,
        "analyzing"
    );
    let analysis = pipeline.run(buffer);

    if json {
        println!("{}", report::to_json(&analysis, &labeler)?);
    } else {
        print!("{}", report::to_table(&analysis, &labeler));
    }
    Ok(())
}

fn build_pipeline(args: &AnalysisArgs) -> Result<(Pipeline, NoteLabeler)> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None if args.live => AnalysisConfig::live_input(),
        None => AnalysisConfig::file(),
    };
    let labeler = NoteLabeler::from_config(&LabelConfig {
        root_key: args.root.clone(),
        use_scale_degrees: args.sargam,
    });
    let pipeline = Pipeline::new(config)?
        .with_labeler(labeler)
        .with_observer(TracingObserver);
    Ok((pipeline, labeler))
}

/// Loads an analysis configuration from a JSON file.
///
/// Missing fields take their value from the file-analysis preset.
fn load_config(path: &Path) -> Result<AnalysisConfig> {
    let mut file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut data = String::new();
    file.read_to_string(&mut data)?;
    let config: AnalysisConfig = serde_json::from_str(&data)
        .with_context(|| format!("invalid configuration in {}", path.display()))?;
    Ok(config)
}
