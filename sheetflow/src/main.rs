use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sheetflow::config::AnalyzerConfig;
use sheetflow::events::{LoggingEventSink, NoOpEventSink};
use sheetflow::observability::init_tracing;
use sheetflow::ocr::TesseractEngine;
use sheetflow::pipeline::AnalyzePipeline;
use sheetflow::removal::{remove_handwriting, ThresholdParams};
use sheetflow::storage::LocalArtifactStore;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "sheetflow", version, about = "Worksheet analysis: handwriting removal and answer OCR")]
struct Cli {
    /// Configuration file (TOML, or JSON by extension).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs the full pipeline on a worksheet photo and prints the result.
    Analyze {
        path: PathBuf,
        /// Subject identifier; a random one is generated if omitted.
        #[arg(long)]
        subject_id: Option<String>,
        /// Print the whole context, not just the result.
        #[arg(long)]
        full: bool,
        /// Log lifecycle events.
        #[arg(long)]
        events: bool,
    },
    /// Removes handwriting and writes the cleaned page as PNG.
    Remove {
        path: PathBuf,
        out: PathBuf,
        #[arg(long)]
        block_size: Option<u32>,
        #[arg(long)]
        bias: Option<i32>,
        #[arg(long)]
        kernel_size: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs)?;

    let config = match &cli.config {
        Some(path) => AnalyzerConfig::load_from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => AnalyzerConfig::default(),
    };

    match cli.command {
        Commands::Analyze {
            path,
            subject_id,
            full,
            events,
        } => {
            let engine = Arc::new(TesseractEngine::new(&config.ocr.binary, &config.ocr.language));
            let store = Arc::new(
                LocalArtifactStore::new(&config.storage.root, &config.storage.url_prefix)
                    .with_addressing(config.storage.addressing),
            );
            let pipeline = if events {
                AnalyzePipeline::with_components(&config, engine, store, Arc::new(LoggingEventSink::default()))?
            } else {
                AnalyzePipeline::with_components(&config, engine, store, Arc::new(NoOpEventSink))?
            };

            let subject_id = subject_id.unwrap_or_else(|| Uuid::new_v4().to_string());
            let result = pipeline
                .analyze(subject_id, &path)
                .await
                .with_context(|| format!("analyzing {}", path.display()))?;

            println!("{}", result.to_json(full)?);
        }
        Commands::Remove {
            path,
            out,
            block_size,
            bias,
            kernel_size,
        } => {
            let defaults = config.removal.threshold_params();
            let params = ThresholdParams {
                block_size: block_size.unwrap_or(defaults.block_size),
                bias: bias.unwrap_or(defaults.bias),
                kernel_size: kernel_size.unwrap_or(defaults.kernel_size),
            };

            let image = image::open(&path).with_context(|| format!("decoding {}", path.display()))?;
            let cleaned = remove_handwriting(&image, &params);
            cleaned
                .save_with_format(&out, image::ImageFormat::Png)
                .with_context(|| format!("writing {}", out.display()))?;
            tracing::info!(input = %path.display(), output = %out.display(), "Wrote cleaned page");
        }
    }

    Ok(())
}
