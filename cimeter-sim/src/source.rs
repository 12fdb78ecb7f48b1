// cimeter-sim - Synthetic acquisition
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Tick-by-tick synthetic source.

use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::signals;
use cimeter::{SignalBuffer, SignalSource, TickInput};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use tracing::debug;

/// Produces one [`TickInput`] per call from a seeded generator.
pub struct SyntheticSource {
    config: SimConfig,
    rng: StdRng,
    noise: Normal<f64>,
    resource_spread: Normal<f64>,
    tick: u64,
}

impl SyntheticSource {
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        let noise = Normal::new(0.0, config.noise_std)
            .map_err(|e| SimError::InvalidConfig(format!("noise_std: {}", e)))?;
        let resource_spread = Normal::new(0.0, config.resource_std)
            .map_err(|e| SimError::InvalidConfig(format!("resource_std: {}", e)))?;
        let rng = match config.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            config,
            rng,
            noise,
            resource_spread,
            tick: 0,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Ticks produced so far.
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Switch the 2-back task effects on or off from the next tick.
    pub fn set_task_mode(&mut self, task_mode: bool) {
        self.config.task_mode = task_mode;
    }

    /// Timestamp of the next tick.
    pub fn next_timestamp_ms(&self) -> u64 {
        self.config.start_time_ms + self.tick * self.config.tick_interval_ms
    }

    fn generate(&mut self) -> TickInput {
        let timestamp_ms = self.next_timestamp_ms();
        let start_s = timestamp_ms as f64 / 1000.0;

        let levels = signals::gamma_levels(&self.config, &mut self.rng);
        let eeg = signals::synthetic_eeg(
            &self.config,
            &levels,
            start_s,
            &self.noise,
            &mut self.rng,
        );
        let resources =
            signals::synthetic_resources(&self.config, &self.resource_spread, &mut self.rng);
        let readings = signals::synthetic_readings(&self.config, &mut self.rng);

        let mut input = TickInput::new(timestamp_ms, SignalBuffer::from_matrix(&eeg))
            .with_resources(resources)
            .with_toxins(self.config.toxins)
            .with_readings(readings);

        if self.config.references {
            input = input.with_references(signals::synthetic_references(
                &levels,
                self.config.task_mode,
                &mut self.rng,
            ));
        }

        self.tick += 1;
        debug!(
            tick = self.tick,
            timestamp_ms,
            task_mode = self.config.task_mode,
            "synthetic tick"
        );
        input
    }
}

impl SignalSource for SyntheticSource {
    fn next_input(&mut self) -> TickInput {
        self.generate()
    }
}

impl Iterator for SyntheticSource {
    type Item = TickInput;

    fn next(&mut self) -> Option<TickInput> {
        Some(self.generate())
    }
}
