// cimeter-cli - Headless tick-loop driver
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # cimeter-cli
//!
//! Runs the index engine over the synthetic source and prints one line per
//! tick.
//!
//! ## Usage
//!
//! ```bash
//! # 500 ticks with the unified five-component weights
//! cimeter-cli --unified --steps 500
//!
//! # Calibrate for 10 s of input time first, 2-back task, JSON output
//! cimeter-cli --calibrate-ms 10000 --task --json --seed 7
//!
//! # Custom config file
//! cimeter-cli --config index.json --logistic 0.5
//! ```

mod run;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// cimeter tick-loop driver
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Ticks to run after calibration
    #[arg(short, long, default_value = "500")]
    pub steps: u64,

    /// Seed for both the engine and the synthetic source
    #[arg(long)]
    pub seed: Option<u64>,

    /// JSON index config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// JSON simulation config file
    #[arg(long)]
    pub sim_config: Option<PathBuf>,

    /// Use the unified five-component preset
    #[arg(long)]
    pub unified: bool,

    /// Logistic aggregation with this threshold
    #[arg(long)]
    pub logistic: Option<f64>,

    /// Calibrate over this many ms of input time before the run
    #[arg(long)]
    pub calibrate_ms: Option<u64>,

    /// Enable the 2-back task effects
    #[arg(long)]
    pub task: bool,

    /// Emit synthetic reference scores and report correlations
    #[arg(long)]
    pub references: bool,

    /// One JSON snapshot per line instead of text
    #[arg(long)]
    pub json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("cimeter v{}", cimeter::VERSION);

    let mut stdout = std::io::stdout().lock();
    match run::run(&args, &mut stdout) {
        Ok(summary) => {
            info!(
                ticks = summary.ticks,
                final_index = summary.final_index,
                "run complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
