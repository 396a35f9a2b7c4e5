use aniplay::models::QualityTier;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aniplay")]
#[command(author, version, about = "Episode playback controller for an anime streaming client")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch episode metadata from the catalog
    Episode {
        /// Series alias, as used in episode page URLs
        alias: String,
        season: u32,
        number: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Play an episode on the headless player and report what happened
    Play {
        alias: String,
        season: u32,
        number: u32,

        /// Read episode metadata from a JSON file instead of the catalog
        #[arg(long)]
        episode_file: Option<PathBuf>,

        /// Next episode number, used together with --episode-file
        #[arg(long)]
        next: Option<u32>,

        /// Seconds of playback between simulated time updates
        #[arg(long, default_value = "5")]
        step: f64,

        /// Quality to start with (1080p, 720p, 480p)
        #[arg(long)]
        quality: Option<QualityTier>,

        /// Persist auto-skip of openings before playing
        #[arg(long)]
        auto_skip: Option<bool>,

        /// Persist auto-advance to the next episode before playing
        #[arg(long)]
        auto_next: Option<bool>,
    },

    /// Inspect saved resume positions
    Progress {
        #[command(subcommand)]
        action: ProgressAction,
    },

    /// Show player settings, changing them first if options are given
    Settings {
        #[arg(long)]
        quality: Option<QualityTier>,

        #[arg(long)]
        volume: Option<f64>,

        #[arg(long)]
        speed: Option<f64>,

        #[arg(long)]
        auto_skip: Option<bool>,

        #[arg(long)]
        auto_next: Option<bool>,
    },
}

#[derive(Subcommand)]
pub enum ProgressAction {
    /// List saved positions, oldest first
    List,

    /// Forget every saved position
    Clear,
}
