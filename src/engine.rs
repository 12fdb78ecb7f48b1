// cimeter - Consciousness index meter
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! IndexEngine - tick orchestration, calibration and reference tracking.

use crate::aggregate::{self, IndexAggregator};
use crate::baseline::{CalibrationBaseline, CalibrationState, Calibrator};
use crate::config::IndexConfig;
use crate::error::{IndexError, Result};
use crate::input::{SignalSource, TickInput};
use crate::network::Network;
use crate::pipeline;
use crate::reference::ReferenceTracker;
use crate::snapshot::{IndexSnapshot, SNAPSHOT_VERSION};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

/// Main engine. Owns the aggregator, the network and the random source.
///
/// Ticks are synchronous and must be serialized by the host.
pub struct IndexEngine<R: Rng = StdRng> {
    config: IndexConfig,
    aggregator: IndexAggregator,
    network: Network,
    calibrator: Calibrator,
    references: ReferenceTracker,
    rng: R,

    /// Total ticks processed.
    tick_count: u64,
    /// Last output snapshot.
    last_output: Option<IndexSnapshot>,
}

impl IndexEngine<StdRng> {
    /// Build from config, seeding from `config.seed` or OS entropy.
    pub fn new(config: IndexConfig) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> IndexEngine<R> {
    /// Build with an injected random source.
    pub fn with_rng(config: IndexConfig, mut rng: R) -> Result<Self> {
        config.validate()?;
        let aggregator = IndexAggregator::from_config(&config)?;
        let network = Network::from_config(&config.network, &mut rng)?;
        let calibrator = Calibrator::new(&config.calibration);
        let references = ReferenceTracker::new(config.references.window);

        Ok(Self {
            config,
            aggregator,
            network,
            calibrator,
            references,
            rng,
            tick_count: 0,
            last_output: None,
        })
    }

    /// Process one tick of input.
    pub fn tick(&mut self, input: &TickInput) -> Result<IndexSnapshot> {
        let metrics =
            pipeline::compute_metrics(input, &mut self.network, &self.config, &mut self.rng)?;
        let output = self.aggregator.update(&metrics.scores)?;
        let contributions = self.aggregator.explain(&metrics.scores)?;
        self.tick_count += 1;

        let mut flags = Vec::new();
        let completed = self.calibrator.process(
            output.smoothed,
            metrics.coherence(),
            metrics.compressibility,
            input.timestamp_ms,
        );
        if let Some(baseline) = &completed {
            flags.push("CALIBRATION_COMPLETE".to_string());
            if baseline.capped {
                flags.push("CALIBRATION_CAPPED".to_string());
            }
        }
        flags.push(self.calibrator.state().flag().to_string());
        if input.signals.channel_count() < 2 {
            flags.push("SINGLE_CHANNEL".to_string());
        }
        if input.resources.is_empty() {
            flags.push("NO_RESOURCES".to_string());
        }

        self.references.record(output.smoothed, &input.references);
        let correlations = self.references.correlations()?;

        let scale = self.config.scale;
        let snapshot = IndexSnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            timestamp_ms: input.timestamp_ms,
            tick: self.tick_count,
            state: self.calibrator.state(),
            index: output.smoothed,
            instantaneous: output.instantaneous,
            components: metrics.scores,
            contributions,
            external_score: aggregate::map_to_external_scale(
                output.smoothed,
                scale.low,
                scale.high,
            ),
            compressibility: metrics.compressibility,
            entropy: metrics.entropy,
            info_energy_j: metrics.info_energy_j,
            correlations,
            baseline: self.calibrator.baseline().cloned(),
            flags,
        };

        debug!(
            tick = self.tick_count,
            index = snapshot.index,
            state = ?snapshot.state,
            "tick processed"
        );
        self.last_output = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Open a calibration window that later ticks complete.
    pub fn request_calibration(&mut self, duration_ms: u64) {
        self.calibrator.start(duration_ms);
    }

    /// Run ticks from `source` until the calibration window closes.
    ///
    /// The window closes after `duration_ms` of input time or after
    /// `calibration.max_samples` ticks, whichever comes first. Calling this
    /// again runs a fresh window.
    ///
    /// If a tick fails, the error is returned and the engine stays
    /// `Calibrating` with a partial window. The next `calibrate` or
    /// `request_calibration` discards it.
    pub fn calibrate<S: SignalSource + ?Sized>(
        &mut self,
        source: &mut S,
        duration_ms: u64,
    ) -> Result<CalibrationBaseline> {
        self.calibrator.start(duration_ms);
        let max_samples = self.config.calibration.max_samples;

        for _ in 0..max_samples {
            let input = source.next_input();
            self.tick(&input)?;
            if self.calibrator.state() == CalibrationState::Ready {
                if let Some(baseline) = self.calibrator.baseline() {
                    return Ok(baseline.clone());
                }
            }
        }

        Err(IndexError::InvalidConfig(format!(
            "calibration did not complete within {} samples",
            max_samples
        )))
    }

    /// Reset the smoothed index to its initial value and open a new
    /// calibration window.
    pub fn recalibrate(&mut self, duration_ms: u64) {
        info!(index = self.aggregator.value(), "recalibration requested");
        self.aggregator.reset();
        self.calibrator.start(duration_ms);
    }

    /// Current smoothed index.
    pub fn index(&self) -> f64 {
        self.aggregator.value()
    }

    pub fn calibration_state(&self) -> CalibrationState {
        self.calibrator.state()
    }

    pub fn calibration_progress(&self) -> f64 {
        self.calibrator.progress()
    }

    pub fn baseline(&self) -> Option<&CalibrationBaseline> {
        self.calibrator.baseline()
    }

    pub fn last_output(&self) -> Option<&IndexSnapshot> {
        self.last_output.as_ref()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn aggregator(&self) -> &IndexAggregator {
        &self.aggregator
    }

    /// Reset all state and rebuild the network from the current RNG.
    pub fn reset(&mut self) -> Result<()> {
        self.network = Network::from_config(&self.config.network, &mut self.rng)?;
        self.aggregator.reset();
        self.calibrator.reset();
        self.references.clear();
        self.tick_count = 0;
        self.last_output = None;
        Ok(())
    }
}
