//! Normpipe - security event normalization pipeline
//!
//! Command-line front end: builds the plugin registries and feeds batch
//! documents or JSONL event streams through them.

mod config;
mod ingest;

use clap::{Parser, Subcommand, ValueEnum};
use config::PipeConfig;
use normpipe_core::{Pipeline, Registry};
use normpipe_processor::BatchProcessor;
use std::path::PathBuf;
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "normpipe")]
#[command(version)]
#[command(about = "Security event normalization pipeline", long_about = None)]
struct Cli {
    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "NORMPIPE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize and enrich events from a file or stdin
    Run {
        /// Input file, `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Output file, `-` for stdout
        #[arg(short, long, default_value = "-")]
        output: String,

        /// Input format
        #[arg(short, long, default_value = "jsonl")]
        format: Format,

        /// Recover JSON blocks from malformed payloads
        #[arg(long)]
        salvage: bool,
    },

    /// List the registered plugin tables
    Plugins,
}

/// Supported input formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    /// One raw JSON event per line
    Jsonl,
    /// A single {"records": [...]} batch document
    Batch,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration file
    let config = load_config(cli.config.clone());

    // Setup logging - CLI verbose flag takes precedence, then config
    let log_level = if cli.verbose > 0 {
        match cli.verbose {
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    } else {
        match config.pipeline.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN,
        }
    };

    // Logs go to stderr; stdout is the data channel.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run {
            input,
            output,
            format,
            salvage,
        } => run_command(&config, &input, &output, format, salvage).await,
        Commands::Plugins => plugins_command().await,
    }
}

/// Load configuration from file/env, with fallback to defaults
fn load_config(cli_path: Option<PathBuf>) -> PipeConfig {
    match PipeConfig::load(cli_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load configuration: {}, using defaults", e);
            PipeConfig::default()
        }
    }
}

/// A pipeline over the build-time plugin tables. Registration errors abort
/// startup; the pipeline never runs with a partial plugin set.
fn build_pipeline() -> anyhow::Result<Pipeline> {
    Ok(Pipeline::new(
        Registry::load(normpipe_normalize::plugins())?,
        Registry::load(normpipe_enrich::plugins())?,
    ))
}

async fn run_command(
    config: &PipeConfig,
    input: &str,
    output: &str,
    format: Format,
    salvage: bool,
) -> anyhow::Result<()> {
    // The CLI flag enables salvage on top of whatever the config says
    let salvage = salvage || config.processor.salvage_json;
    let processor = BatchProcessor::new(build_pipeline()?).with_salvage(salvage);

    let text = ingest::read_input(input)?;
    let rendered = match format {
        Format::Jsonl => ingest::run_jsonl(&processor, &text)?,
        Format::Batch => ingest::run_batch(&processor, &text)?,
    };
    ingest::write_output(output, &rendered)
}

async fn plugins_command() -> anyhow::Result<()> {
    let pipeline = build_pipeline()?;

    print_stage("normalization", pipeline.normalization());
    print_stage("enrichment", pipeline.enrichment());
    println!();

    Ok(())
}

fn print_stage(stage: &str, registry: &Registry) {
    println!();
    println!("{} ({} plugins):", stage, registry.len());
    for entry in registry.plugins() {
        println!(
            "  {:<18} priority {:>4}   criteria {:?}",
            entry.name, entry.priority, entry.criteria
        );
    }
}
