// cimeter-sim - Synthetic acquisition
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Simulation configuration.

use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};

/// Synthetic acquisition configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// EEG-like channels per tick.
    pub channels: usize,
    /// Samples per channel per tick.
    pub samples: usize,
    /// Sample rate (Hz).
    pub sample_rate_hz: f64,
    /// Carrier frequency of the gamma component (Hz).
    pub gamma_hz: f64,
    /// Resting gamma level per channel, in [0,1].
    pub gamma_level: f64,
    /// Std of Gaussian sensor noise added to every sample.
    pub noise_std: f64,
    /// Spread of the per-channel carrier phase (radians).
    pub phase_jitter: f64,
    /// Time between ticks (ms).
    pub tick_interval_ms: u64,
    /// Timestamp of the first tick (ms).
    pub start_time_ms: u64,
    /// Resource (ATP) samples per tick.
    pub resource_samples: usize,
    /// Mean resource level.
    pub resource_mean: f64,
    /// Std of resource samples.
    pub resource_std: f64,
    /// Toxin load reported every tick.
    pub toxins: f64,
    /// Probability that a scalar sensor is unavailable on a tick.
    pub dropout_probability: f64,
    /// Add the 2-back working-memory task effects.
    pub task_mode: bool,
    /// Emit synthetic reference scores with each tick.
    pub references: bool,
    /// Random seed for reproducibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            channels: 8,
            samples: 250,
            sample_rate_hz: 250.0,
            gamma_hz: 40.0,
            gamma_level: 0.5,
            noise_std: 0.3,
            phase_jitter: 0.5,
            tick_interval_ms: 1_000,
            start_time_ms: 0,
            resource_samples: 10,
            resource_mean: 0.8,
            resource_std: 0.05,
            toxins: 0.1,
            dropout_probability: 0.0,
            task_mode: false,
            references: false,
            seed: None,
        }
    }
}

impl SimConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_task_mode(mut self, task_mode: bool) -> Self {
        self.task_mode = task_mode;
        self
    }

    pub fn with_references(mut self, references: bool) -> Self {
        self.references = references;
        self
    }

    pub fn with_channels(mut self, channels: usize, samples: usize) -> Self {
        self.channels = channels;
        self.samples = samples;
        self
    }

    pub fn with_tick_interval_ms(mut self, interval_ms: u64) -> Self {
        self.tick_interval_ms = interval_ms;
        self
    }

    pub fn with_dropout(mut self, probability: f64) -> Self {
        self.dropout_probability = probability;
        self
    }

    pub fn with_toxins(mut self, toxins: f64) -> Self {
        self.toxins = toxins;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.sample_rate_hz.is_finite() && self.sample_rate_hz > 0.0) {
            return Err(SimError::InvalidConfig(
                "sample_rate_hz must be > 0".to_string(),
            ));
        }
        for (name, value) in [
            ("gamma_level", self.gamma_level),
            ("resource_mean", self.resource_mean),
            ("dropout_probability", self.dropout_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SimError::InvalidConfig(format!(
                    "{} must be in [0, 1], got {}",
                    name, value
                )));
            }
        }
        for (name, value) in [
            ("noise_std", self.noise_std),
            ("resource_std", self.resource_std),
            ("phase_jitter", self.phase_jitter),
            ("toxins", self.toxins),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SimError::InvalidConfig(format!(
                    "{} must be finite and >= 0, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
