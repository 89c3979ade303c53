//! Strictly Chess - console entry point.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use std::path::Path;
use strictly_chess::{
    SessionSettings, StdinSource, TimeControlPreset, run_console, spawn_session,
};
use strum::IntoEnumIterator;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Play {
            config,
            mode,
            difficulty,
            time_control,
            computer_side,
            seed,
            log_file,
        } => {
            init_logging(&log_file)?;
            let mut settings = SessionSettings::load(config.as_deref())?;
            if let Some(mode) = mode {
                settings = settings.with_mode(mode);
            }
            if let Some(difficulty) = difficulty {
                settings = settings.with_difficulty(difficulty);
            }
            if let Some(time_control) = time_control {
                settings = settings.with_time_control(time_control);
            }
            if let Some(side) = computer_side {
                settings = settings.with_computer_side(side);
            }
            if let Some(seed) = seed {
                settings = settings.with_seed(seed);
            }
            run_play(settings).await
        }
        Command::Presets => {
            for preset in TimeControlPreset::iter() {
                println!("{:<14} {}", preset.to_string(), preset.description());
            }
            Ok(())
        }
    }
}

/// Logs go to a file so they never interleave with the console.
fn init_logging(path: &Path) -> Result<()> {
    let log_file = std::fs::File::create(path)?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,strictly_chess=debug")),
        )
        .with_writer(std::sync::Arc::new(log_file))
        .with_ansi(false)
        .try_init(); // Don't panic if already initialized
    Ok(())
}

/// Runs one console session until the player quits.
#[instrument(skip(settings))]
async fn run_play(settings: SessionSettings) -> Result<()> {
    info!(?settings, "Starting Strictly Chess");

    let controller = settings.build_controller()?;
    let (handle, events, task) = spawn_session(controller);
    handle.start_new_match(None).await?;

    run_console(
        handle,
        events,
        StdinSource::new(),
        std::io::stdout(),
        *settings.low_time_threshold_secs(),
    )
    .await?;

    task.await??;
    info!("Goodbye");
    Ok(())
}
