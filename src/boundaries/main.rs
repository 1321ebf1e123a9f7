//! Town boundary generator.
//!
//! Dissolves every town's parcel noise contours into one outline and writes
//! them as a single GeoJSON FeatureCollection.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use noisemap::{BoundaryBuilder, Config};

#[derive(Parser, Debug)]
#[command(name = "boundaries")]
#[command(about = "Generate town boundaries from parcel noise data")]
struct Args {
    /// Data root containing parcels/noise_by_town
    #[arg(default_value = "static/data")]
    data_root: PathBuf,

    /// Output GeoJSON file
    #[arg(default_value = "static/data/town_boundaries.geojson")]
    output: PathBuf,

    /// Optional TOML config overriding the geometry constants
    #[arg(long)]
    config: Option<PathBuf>,

    /// Build towns in parallel
    #[arg(long)]
    parallel: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = Config::load_or_default(args.config.as_ref())?;
    if args.parallel {
        config.boundaries.parallel = true;
    }
    info!(
        "Buffer {} / simplify {} / parallel {}",
        config.boundaries.buffer_margin,
        config.boundaries.simplify_tolerance,
        config.boundaries.parallel
    );

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} towns ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    let builder = BoundaryBuilder::new(config.boundaries);
    let report = builder
        .run(&args.data_root, &args.output, &pb)
        .context("Town boundary generation failed")?;

    info!(
        "Processed {} towns, emitted {} features",
        report.towns_found(),
        report.built()
    );

    Ok(())
}
