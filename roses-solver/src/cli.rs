//! Command-line interface for the roses solver.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Roses Solver - win/loss analyzer for the roses take-away game
#[derive(Parser, Debug)]
#[command(name = "solver")]
#[command(about = "Win/loss analyzer for the roses take-away game", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,

    /// TOML file with analyzer settings (flags override it)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub search: SearchArgs,
}

/// Analyzer overrides shared by every subcommand
#[derive(Args, Debug, Default, Clone)]
pub struct SearchArgs {
    /// Give up after this many search nodes
    #[arg(long, global = true)]
    pub max_nodes: Option<u64>,

    /// Give up below this recursion depth
    #[arg(long, global = true)]
    pub max_depth: Option<u32>,

    /// Give up after this many milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Search positions with an empty bush instead of classifying them
    #[arg(long, global = true)]
    pub no_closed_form: bool,

    /// Cache winning positions only above this total rose count
    #[arg(long, global = true)]
    pub win_cache_threshold: Option<u64>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze one position for the player to move
    Analyze {
        /// Rose counts in color order (red blue green purple orange cyan),
        /// space or comma separated
        #[arg(required = true, num_args = 1.., allow_negative_numbers = true)]
        counts: Vec<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Analyze every distinct position of a family (color order ignored)
    Sweep {
        /// Number of bushes
        #[arg(long, default_value = "6")]
        piles: usize,

        /// Largest count per bush
        #[arg(long, default_value = "4")]
        max_count: u32,

        /// Keep one cache across the whole sweep
        #[arg(long)]
        shared_cache: bool,

        /// Re-check every verdict with the closed form disabled
        #[arg(long)]
        verify: bool,

        /// Seconds between progress lines
        #[arg(long, default_value = "5")]
        log_interval_secs: u64,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}
