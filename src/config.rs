// cimeter - Consciousness index meter
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Index pipeline configuration.

use crate::component::WeightSet;
use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Master configuration for the index pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Linear or logistic aggregation.
    pub aggregation: AggregationMode,

    /// Exponential smoothing across ticks.
    pub smoothing: SmoothingConfig,

    /// Component weights (normalized before use).
    pub weights: WeightSet,

    /// Require a score for every weighted component.
    pub strict_weights: bool,

    /// Signal statistics parameters.
    pub stats: StatsConfig,

    /// Network dynamics parameters.
    pub network: NetworkConfig,

    /// Calibration window.
    pub calibration: CalibrationConfig,

    /// External ordinal scale mapping.
    pub scale: ScaleConfig,

    /// Reference correlation tracking.
    pub references: ReferenceConfig,

    /// Seed for the engine RNG. `None` seeds from OS entropy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl IndexConfig {
    /// The five-component unified preset: equal weights, linear aggregation,
    /// recurrent influence network.
    pub fn unified() -> Self {
        Self {
            weights: WeightSet::unified(),
            network: NetworkConfig {
                model: NetworkModel::Influence,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: IndexConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every value before an engine is built from this config.
    pub fn validate(&self) -> Result<()> {
        self.aggregation.validate()?;
        self.smoothing.validate()?;
        self.weights.validate()?;
        self.stats.validate()?;
        self.network.validate()?;
        self.calibration.validate()?;
        self.scale.validate()?;
        self.references.validate()
    }
}

fn invalid(msg: impl Into<String>) -> IndexError {
    IndexError::InvalidConfig(msg.into())
}

fn check_unit(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(format!("{} must be in [0, 1], got {}", name, value)))
    }
}

fn check_non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{} must be finite and >= 0, got {}", name, value)))
    }
}

/// How components are combined into the instantaneous index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AggregationMode {
    /// Normalized weighted sum clipped to [0,1].
    Linear,
    /// Sigmoid of the weighted sum around `threshold`, in (0,1).
    Logistic { threshold: f64 },
}

impl Default for AggregationMode {
    fn default() -> Self {
        AggregationMode::Linear
    }
}

impl AggregationMode {
    pub fn validate(&self) -> Result<()> {
        match self {
            AggregationMode::Linear => Ok(()),
            AggregationMode::Logistic { threshold } if threshold.is_finite() => Ok(()),
            AggregationMode::Logistic { threshold } => Err(invalid(format!(
                "logistic threshold must be finite, got {}",
                threshold
            ))),
        }
    }
}

/// Smoothing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// EMA weight λ of the new reading (0.0 - 1.0).
    pub lambda: f64,
    /// Index value at start and after recalibration.
    pub initial: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            lambda: 0.3,
            initial: 0.5,
        }
    }
}

impl SmoothingConfig {
    pub fn validate(&self) -> Result<()> {
        check_unit("smoothing.lambda", self.lambda)?;
        check_unit("smoothing.initial", self.initial)
    }
}

/// Signal statistics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Histogram bins for entropy.
    pub entropy_bins: usize,
    /// Sample rate of the channel buffers (Hz).
    pub sample_rate_hz: f64,
    /// Lower edge of the target band (Hz).
    pub band_low_hz: f64,
    /// Upper edge of the target band (Hz).
    pub band_high_hz: f64,
    /// Boltzmann constant (J/K).
    pub boltzmann: f64,
    /// Temperature (K).
    pub temperature_k: f64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            entropy_bins: 16,
            sample_rate_hz: 250.0,
            band_low_hz: 30.0,
            band_high_hz: 100.0,
            boltzmann: 1.380649e-23,
            temperature_k: 310.0,
        }
    }
}

impl StatsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.entropy_bins < 2 {
            return Err(invalid("stats.entropy_bins must be >= 2"));
        }
        if !(self.sample_rate_hz.is_finite() && self.sample_rate_hz > 0.0) {
            return Err(invalid("stats.sample_rate_hz must be > 0"));
        }
        check_non_negative("stats.band_low_hz", self.band_low_hz)?;
        if !(self.band_high_hz.is_finite() && self.band_high_hz > self.band_low_hz) {
            return Err(invalid("stats.band_high_hz must exceed band_low_hz"));
        }
        check_non_negative("stats.boltzmann", self.boltzmann)?;
        check_non_negative("stats.temperature_k", self.temperature_k)
    }
}

/// Which dynamical network feeds the integration component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkModel {
    /// Vitality-driven weighted graph, integration via min-cut proxy.
    VitalityGraph,
    /// Recurrent influence network, integration via mean connectivity.
    Influence,
}

/// Coupling matrix lifecycle for the influence network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouplingMode {
    /// Drawn once at construction.
    Fixed,
    /// Redrawn on every step.
    Regenerated,
}

/// Network dynamics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub model: NetworkModel,
    /// Number of nodes N.
    pub node_count: usize,
    /// Node persistence α.
    pub alpha: f64,
    /// Edge persistence β.
    pub beta: f64,
    /// Toxin decay rate k in exp(-k * toxins).
    pub toxin_decay: f64,
    /// Probability of an edge existing in the random graph.
    pub edge_probability: f64,
    /// Per-edge, per-tick probability of a noise perturbation.
    pub perturb_probability: f64,
    /// Std of the Gaussian edge perturbation.
    pub perturb_std: f64,
    /// Influence coupling lifecycle.
    pub coupling: CouplingMode,
    /// Density of the boolean coupling matrix.
    pub coupling_density: f64,
    /// Std of the Gaussian noise added to the influence state.
    pub influence_noise_std: f64,
    /// Random bipartitions tried by the integration proxy.
    pub phi_trials: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            model: NetworkModel::VitalityGraph,
            node_count: 100,
            alpha: 0.9,
            beta: 0.95,
            toxin_decay: 0.01,
            edge_probability: 0.1,
            perturb_probability: 0.1,
            perturb_std: 0.1,
            coupling: CouplingMode::Fixed,
            coupling_density: 0.1,
            influence_noise_std: 0.01,
            phi_trials: 5,
        }
    }
}

impl NetworkConfig {
    pub fn validate(&self) -> Result<()> {
        if self.node_count == 0 {
            return Err(invalid("network.node_count must be > 0"));
        }
        if self.phi_trials == 0 {
            return Err(invalid("network.phi_trials must be > 0"));
        }
        check_unit("network.alpha", self.alpha)?;
        check_unit("network.beta", self.beta)?;
        check_unit("network.edge_probability", self.edge_probability)?;
        check_unit("network.perturb_probability", self.perturb_probability)?;
        check_unit("network.coupling_density", self.coupling_density)?;
        check_non_negative("network.toxin_decay", self.toxin_decay)?;
        check_non_negative("network.perturb_std", self.perturb_std)?;
        check_non_negative("network.influence_noise_std", self.influence_noise_std)
    }
}

/// Calibration window configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Default calibration duration (ms of input timestamps).
    pub duration_ms: u64,
    /// Upper bound on samples a blocking calibration may draw.
    pub max_samples: u32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            duration_ms: 10_000,
            max_samples: 10_000,
        }
    }
}

impl CalibrationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_samples == 0 {
            return Err(invalid("calibration.max_samples must be > 0"));
        }
        Ok(())
    }
}

/// External ordinal scale, e.g. a 3-15 clinical score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    pub low: f64,
    pub high: f64,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            low: 3.0,
            high: 15.0,
        }
    }
}

impl ScaleConfig {
    pub fn validate(&self) -> Result<()> {
        if self.low.is_finite() && self.high.is_finite() && self.low < self.high {
            Ok(())
        } else {
            Err(invalid(format!(
                "scale.low ({}) must be below scale.high ({})",
                self.low, self.high
            )))
        }
    }
}

/// Reference correlation tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    /// Ticks of history kept per series.
    pub window: usize,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self { window: 250 }
    }
}

impl ReferenceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window < 2 {
            return Err(invalid("references.window must be >= 2"));
        }
        Ok(())
    }
}
