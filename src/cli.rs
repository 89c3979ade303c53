//! Command-line interface for strictly_chess.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use strictly_chess::{Difficulty, GameMode, Side, TimeControl};

/// Strictly Chess - chess sessions with dual clocks and a computer opponent
#[derive(Parser, Debug)]
#[command(name = "strictly_chess")]
#[command(about = "Play chess in the terminal against a friend or the computer", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a match on the console
    Play {
        /// Settings file (TOML). Falls back to $STRICTLY_CHESS_CONFIG.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// human-vs-human or human-vs-computer
        #[arg(short, long)]
        mode: Option<GameMode>,

        /// easy, medium or hard
        #[arg(short, long)]
        difficulty: Option<Difficulty>,

        /// Preset (blitz-3, blitz-5, rapid-10, classical-30, unlimited) or seconds
        #[arg(short, long)]
        time_control: Option<TimeControl>,

        /// Side the computer plays
        #[arg(long)]
        computer_side: Option<Side>,

        /// Seed for reproducible computer play
        #[arg(long)]
        seed: Option<u64>,

        /// Log file (the console owns stdout)
        #[arg(long, default_value = "strictly_chess.log")]
        log_file: PathBuf,
    },

    /// List the time-control presets
    Presets,
}
