//! Roses Solver
//!
//! Decides positions of the roses take-away game from the command line,
//! one at a time or as a sweep over a whole family of positions.

mod cli;
mod config;
mod stats;
mod sweep;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use roses_core::{Analyzer, AnalyzerConfig, Position, SearchStats};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::sweep::{SweepOptions, SweepReport};

/// JSON shape of a single analysis.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeReport {
    position: Position,
    is_winning: bool,
    witness_move: Option<Position>,
    suggested_move: Option<String>,
    stats: SearchStats,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref(), &cli.search)?;

    // Set up SIGINT handler for graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        warn!("Interrupt received, stopping search...");
        r.store(false, Ordering::SeqCst);
    })
    .context("Error setting Ctrl-C handler")?;

    match cli.command {
        Command::Analyze { counts, json } => run_analyze(&counts, json, config, running),
        Command::Sweep {
            piles,
            max_count,
            shared_cache,
            verify,
            log_interval_secs,
            json,
        } => {
            let options = SweepOptions {
                piles,
                max_count,
                shared_cache,
                verify,
                log_interval_secs,
            };
            let report = sweep::run(&options, &config, running);
            print_sweep(&report, json)
        }
    }
}

fn run_analyze(
    counts: &[String],
    json: bool,
    config: AnalyzerConfig,
    running: Arc<AtomicBool>,
) -> Result<()> {
    let position: Position = counts
        .join(" ")
        .parse()
        .context("invalid position")?;

    info!(%position, bucket = position.bucket(), "analyzing");
    let start = Instant::now();
    let mut analyzer = Analyzer::new(config).with_cancel_flag(running);
    let verdict = analyzer.analyze(&position)?;
    let stats = *analyzer.stats();
    info!(
        nodes = stats.nodes_visited,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "analysis complete"
    );

    let suggested = verdict.suggested_move(&position);
    if json {
        let report = AnalyzeReport {
            position,
            is_winning: verdict.is_winning,
            witness_move: verdict.witness_move,
            suggested_move: suggested.map(|m| m.to_string()),
            stats,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Position: {}", position);
    if verdict.is_winning {
        println!("Result: winning for the player to move");
        if let Some(witness) = &verdict.witness_move {
            match suggested {
                Some(mov) => println!("Move to: {} ({})", witness, mov),
                None => println!("Move to: {}", witness),
            }
        }
    } else {
        println!("Result: losing for the player to move");
    }
    println!("Nodes visited: {}", stats.nodes_visited);
    Ok(())
}

fn print_sweep(report: &SweepReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!(
        "Swept {}/{} positions of {} bushes with up to {} roses",
        report.analyzed, report.total, report.piles, report.max_count
    );
    println!("Wins: {}  Losses: {}", report.wins, report.losses);
    println!("Losing positions:");
    for position in &report.losing {
        println!("  {}", position);
    }
    if !report.inconclusive.is_empty() {
        println!("Inconclusive: {}", report.inconclusive.len());
    }
    if !report.disagreements.is_empty() {
        println!("Disagreements with full search:");
        for position in &report.disagreements {
            println!("  {}", position);
        }
    }
    if report.cancelled {
        println!("Sweep was interrupted before completion.");
    }
    Ok(())
}
