//! schedule-extractor - Driver record extraction from photographed schedules
//!
//! Reads OCR detections for a schedule photo, reconstructs the table rows,
//! and prints one formatted block per identified driver for copy-paste into
//! the dispatch system.

mod analysis;
mod config;
mod extractor;
mod vision;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ExtractorConfig;
use crate::extractor::ScheduleExtractor;
use crate::vision::DetectionDump;

/// schedule-extractor - Driver record extraction from schedule photos
#[derive(Parser, Debug)]
#[command(name = "schedule-extractor")]
#[command(about = "Extracts driver/vehicle records from a photographed work schedule")]
struct Args {
    /// Path to the schedule photo (PNG or JPEG)
    image: Option<PathBuf>,

    /// OCR detection dump (JSON) produced for the image
    #[arg(short, long)]
    detections: Option<PathBuf>,

    /// Configuration file (defaults to the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the extracted records to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the default configuration to the user config dir and exit
    #[arg(long)]
    write_default_config: bool,
}

fn main() -> Result<()> {
    // Initialize logging (RUST_LOG overrides the default level)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if args.write_default_config {
        let path = config::default_config_path()?;
        config::save_config(&ExtractorConfig::default(), &path)?;
        info!("Wrote default configuration to {:?}", path);
        return Ok(());
    }

    let image_path = args
        .image
        .context("missing schedule image path (see --help)")?;
    let dump_path = args
        .detections
        .context("missing OCR detection dump; pass --detections <file.json>")?;

    let config = load_or_default_config(args.config.as_deref());
    let extractor = ScheduleExtractor::new(&config)?;

    let image = image::open(&image_path)
        .with_context(|| format!("failed to open schedule image {image_path:?}"))?;
    info!(
        "Loaded schedule image {:?} ({}x{})",
        image_path,
        image.width(),
        image.height()
    );

    let engine = DetectionDump::load(&dump_path)
        .with_context(|| format!("failed to load detection dump {dump_path:?}"))?;

    let result = extractor
        .extract(&engine, &image)
        .context("extraction failed")?;

    if result.driver_count == 0 {
        warn!("No driver records found in the image");
    } else {
        info!("{} drivers identified", result.driver_count);
    }

    match args.output {
        Some(path) => {
            std::fs::write(&path, &result.text)
                .with_context(|| format!("failed to write output to {path:?}"))?;
            info!("Wrote extracted records to {:?}", path);
        }
        None => print!("{}", result.text),
    }

    Ok(())
}

/// Load configuration from an explicit path, the user config dir, or fall
/// back to the built-in defaults.
fn load_or_default_config(explicit: Option<&std::path::Path>) -> ExtractorConfig {
    if let Some(path) = explicit {
        match config::load_config(path) {
            Ok(cfg) => {
                info!("Loaded configuration from {:?}", path);
                return cfg;
            }
            Err(err) => {
                warn!("Failed to load configuration from {:?}: {err:#}", path);
            }
        }
    } else if let Ok(path) = config::default_config_path() {
        if path.exists() {
            if let Ok(cfg) = config::load_config(&path) {
                info!("Loaded configuration from {:?}", path);
                return cfg;
            }
        }
    }

    info!("Using default configuration");
    ExtractorConfig::default()
}
