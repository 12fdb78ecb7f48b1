// cimeter-cli - Headless tick-loop driver
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Config assembly and the tick loop.

use crate::Args;
use cimeter::{AggregationMode, IndexConfig, IndexEngine, IndexError, IndexSnapshot, SignalSource};
use cimeter_sim::{SimConfig, SimError, SyntheticSource};
use std::io::Write;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// What a finished run reports.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub ticks: u64,
    pub final_index: f64,
    pub last: Option<IndexSnapshot>,
}

/// Index config from file or preset, with command-line overrides.
pub fn index_config(args: &Args) -> Result<IndexConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => IndexConfig::load(path)?,
        None if args.unified => IndexConfig::unified(),
        None => IndexConfig::default(),
    };
    if let Some(threshold) = args.logistic {
        config.aggregation = AggregationMode::Logistic { threshold };
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate()?;
    Ok(config)
}

/// Simulation config from file or defaults, with command-line overrides.
pub fn sim_config(args: &Args) -> Result<SimConfig, CliError> {
    let mut config = match &args.sim_config {
        Some(path) => SimConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => SimConfig::default(),
    };
    if args.task {
        config.task_mode = true;
    }
    if args.references {
        config.references = true;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate()?;
    Ok(config)
}

/// Optional calibration, then `args.steps` ticks written to `out`.
pub fn run<W: Write>(args: &Args, out: &mut W) -> Result<RunSummary, CliError> {
    let mut engine = IndexEngine::new(index_config(args)?)?;
    let mut source = SyntheticSource::new(sim_config(args)?)?;

    if let Some(duration_ms) = args.calibrate_ms {
        let baseline = engine.calibrate(&mut source, duration_ms)?;
        let (index, coherence, compressibility) = baseline.means();
        info!(
            samples = baseline.samples,
            index, coherence, compressibility, "baseline ready"
        );
    }

    let mut last = None;
    for step in 0..args.steps {
        let snapshot = engine.tick(&source.next_input())?;
        if args.json {
            writeln!(out, "{}", snapshot.to_json()?)?;
        } else {
            writeln!(out, "{}", format_line(step, &snapshot))?;
        }
        last = Some(snapshot);
    }

    if !args.json {
        if let Some(snapshot) = &last {
            write_contributions(out, snapshot)?;
        }
    }

    Ok(RunSummary {
        ticks: args.steps,
        final_index: engine.index(),
        last,
    })
}

fn format_line(step: u64, snapshot: &IndexSnapshot) -> String {
    let mut line = format!(
        "Step {}: index={:.3} inst={:.3} scale={:.1} [{}]",
        step,
        snapshot.index,
        snapshot.instantaneous,
        snapshot.external_score,
        snapshot.state.flag()
    );
    let c = &snapshot.correlations;
    if c.clinical != 0.0 || c.complexity != 0.0 || c.behavioral != 0.0 {
        line.push_str(&format!(
            " rho(clin={:.2} pci={:.2} beh={:.2})",
            c.clinical, c.complexity, c.behavioral
        ));
    }
    line
}

fn write_contributions<W: Write>(out: &mut W, snapshot: &IndexSnapshot) -> std::io::Result<()> {
    writeln!(out, "Contributions:")?;
    for (component, value) in snapshot.contributions.iter() {
        writeln!(out, "  {:<10} {:+.4}", component.name(), value)?;
    }
    Ok(())
}
