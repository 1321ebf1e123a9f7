//! Simplified noise map generator.
//!
//! Samples a handful of features from every noise-band file listed in
//! `directory_map.json` into one lightweight GeoJSON layer.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use noisemap::{Config, Sampler};

#[derive(Parser, Debug)]
#[command(name = "sample")]
#[command(about = "Build a sampled noise layer from per-town noise files")]
struct Args {
    /// Directory holding directory_map.json and the town folders
    #[arg(default_value = "static/data/parcels/noise_by_town")]
    noise_dir: PathBuf,

    /// Output GeoJSON file
    #[arg(default_value = "static/data/parcels/simplified_noise_map.geojson")]
    output: PathBuf,

    /// Optional TOML config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Features sampled per noise file
    #[arg(long)]
    per_file: Option<usize>,

    /// RNG seed for reproducible sampling
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = Config::load_or_default(args.config.as_ref())?;
    if let Some(per_file) = args.per_file {
        config.sampler.per_file = per_file;
    }
    if args.seed.is_some() {
        config.sampler.seed = args.seed;
    }

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} towns ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    let mut sampler = Sampler::from_config(config.sampler, config.boundaries.no_data_prefix);
    let stats = sampler
        .run(&args.noise_dir, &args.output, &pb)
        .context("Noise sampling failed")?;

    info!(
        "Sampled {} features from {} towns",
        stats.total_features_added, stats.towns_with_features
    );

    Ok(())
}
