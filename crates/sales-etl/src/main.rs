//! CLI entry point for the sales ETL pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use sales_etl::io::{LocalDirExtractor, LocalDirLoader};
use sales_etl::{Pipeline, PipelineConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Batch ETL pipeline for retail sales analytics",
    long_about = "Extracts raw sales and product files, cleans and merges them,\n\
                  computes the analytical tables and loads everything into the\n\
                  configured warehouse targets. Set RUST_LOG to control verbosity."
)]
struct Cli {
    /// Path to the pipeline configuration (JSON)
    #[arg(short, long)]
    config: PathBuf,

    /// Override the configured source location with a local directory
    #[arg(long)]
    source_dir: Option<PathBuf>,

    /// Directory where destination tables are written
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,
}

fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let mut config = PipelineConfig::from_path(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(source_dir) = &cli.source_dir {
        config.source.location = source_dir.display().to_string();
    }

    info!("Running pipeline against {}", config.source.location);
    let pipeline = Pipeline::builder()
        .config(config)
        .extractor(Arc::new(LocalDirExtractor))
        .loader(Arc::new(LocalDirLoader::new(&cli.output_dir)))
        .build()?;

    match pipeline.run() {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => {
            error!("Pipeline run failed: {e}");
            Err(e.into())
        }
    }
}
