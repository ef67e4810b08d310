//! Bloom - Main entry point
//!
//! Loads the headline font through its fallback chain while the scene
//! animates, then runs a headless frame loop.

mod config;
mod font_fetch;
mod frame_loop;
mod scene;

use anyhow::{Context, Result};
use bloom_core::{AttemptOutcome, FallbackLoader, TracingObserver};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::font_fetch::FontAcquirer;

#[derive(Parser, Debug)]
#[command(name = "bloom")]
#[command(about = "Floating-sphere scene with a fallback-loaded headline font")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "bloom.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Number of frames to run (0 runs until Ctrl-C)
    #[arg(short, long)]
    frames: Option<u64>,

    /// Seed for the sphere and bubble fields
    #[arg(short, long)]
    seed: Option<u64>,

    /// Load the font once, report the outcome, and exit
    #[arg(long)]
    load_once: bool,

    /// Write a default configuration file and exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Bloom v{}", env!("CARGO_PKG_VERSION"));

    if args.init_config {
        config::save_default_config(&args.config)
            .with_context(|| format!("Failed to write {}", args.config.display()))?;
        println!("Wrote default configuration to {}", args.config.display());
        return Ok(());
    }

    let mut config = config::load_config(&args.config)?;
    if let Some(frames) = args.frames {
        config.render.frames = frames;
    }

    let seed = args
        .seed
        .or(config.scene.seed)
        .unwrap_or_else(rand::random::<u64>);

    info!(
        sources = config.font.sources.len(),
        seed = seed,
        "Configuration loaded"
    );

    let acquirer = FontAcquirer::new(
        Duration::from_secs(config.font.timeout_secs),
        config.font.cache_dir(),
    )?;
    let loader = Arc::new(FallbackLoader::with_observer(
        acquirer,
        TracingObserver::new("Font"),
    ));

    let (updates_tx, updates_rx) = mpsc::unbounded_channel();
    let load = scene::spawn_headline_load(&loader, &config, seed, updates_tx);

    if args.load_once {
        let report = load.await.context("Font load task failed")?;
        println!("Font load {:?} after {} attempt(s):", report.state, report.attempts.len());
        for (index, attempt) in report.attempts.iter().enumerate() {
            match &attempt.outcome {
                AttemptOutcome::Loaded => println!("  {}. {} - loaded", index + 1, attempt.source),
                AttemptOutcome::Failed(e) => {
                    println!("  {}. {} - failed: {}", index + 1, attempt.source, e)
                }
            }
        }
        return Ok(());
    }

    let mut scene = scene::initial_scene(&config, seed);
    frame_loop::run(&mut scene, updates_rx, &config.render).await?;

    let headline = match &scene.headline {
        Some(h) if h.is_placeholder() => "placeholder",
        Some(_) => "text",
        None => "pending",
    };
    info!(
        headline = headline,
        bubbles = scene.bubbles.as_ref().map(Vec::len).unwrap_or(0),
        "Scene finished"
    );

    Ok(())
}
