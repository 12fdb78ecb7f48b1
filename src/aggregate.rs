// cimeter - Consciousness index meter
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Index aggregation: weighted combination of component scores, smoothing
//! across ticks, contribution breakdown, external scale mapping and rank
//! correlation against reference series.

use crate::component::{Component, ComponentScores, WeightSet};
use crate::components::pearson;
use crate::config::{AggregationMode, IndexConfig};
use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Smallest and largest values the logistic path may return.
const LOGISTIC_FLOOR: f64 = f64::MIN_POSITIVE;
const LOGISTIC_CEIL: f64 = 1.0 - f64::EPSILON / 2.0;

/// Standard logistic function.
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// `Σ w_i · c_i` over normalized weights. Missing or non-finite components
/// count as 0.
fn weighted_sum(components: &ComponentScores, weights: &WeightSet) -> Result<f64> {
    let normalized = weights.normalized()?;
    let mut z = 0.0;
    for (component, weight) in normalized.iter() {
        match components.get(component) {
            Some(value) if value.is_finite() => z += weight * value,
            Some(value) => debug!(%component, value, "non-finite component treated as 0"),
            None => {}
        }
    }
    Ok(z)
}

/// Normalized weighted sum, clipped to [0,1].
///
/// Weights are rescaled to sum to 1 first, so their raw scale does not
/// matter. A weighted component with no score contributes 0.
pub fn aggregate_linear(components: &ComponentScores, weights: &WeightSet) -> Result<f64> {
    Ok(weighted_sum(components, weights)?.clamp(0.0, 1.0))
}

/// `sigmoid(Z - threshold)` over the normalized weighted sum `Z`.
///
/// The result is strictly inside (0,1) for any finite input.
pub fn aggregate_logistic(
    components: &ComponentScores,
    weights: &WeightSet,
    threshold: f64,
) -> Result<f64> {
    let z = weighted_sum(components, weights)?;
    let y = sigmoid(z - threshold);
    if y.is_nan() {
        return Ok(0.5);
    }
    Ok(y.clamp(LOGISTIC_FLOOR, LOGISTIC_CEIL))
}

/// Exponential smoothing: `(1-λ)·previous + λ·instantaneous`.
///
/// Written as `previous + λ·(instantaneous - previous)` so that equal
/// inputs come back unchanged for every λ.
pub fn smooth(previous: f64, instantaneous: f64, lambda: f64) -> f64 {
    previous + lambda * (instantaneous - previous)
}

/// Per-component attribution `index·(1-index)·w_i·c_i`.
///
/// Weights are normalized; components with no weight get 0. The output
/// keeps the insertion order of `components`.
pub fn explain(
    index: f64,
    components: &ComponentScores,
    weights: &WeightSet,
) -> Result<ComponentScores> {
    let normalized = weights.normalized()?;
    let slope = index * (1.0 - index);
    Ok(components
        .iter()
        .map(|(component, value)| {
            let weight = normalized.get(component).unwrap_or(0.0);
            (component, slope * weight * value)
        })
        .collect())
}

/// Linear rescale of the index onto `[low, high]`, clamped.
///
/// Non-decreasing in `index`. A NaN index maps to `low`.
pub fn map_to_external_scale(index: f64, low: f64, high: f64) -> f64 {
    if index.is_nan() {
        return low;
    }
    let (lo, hi) = if low <= high { (low, high) } else { (high, low) };
    (low + (high - low) * index).max(lo).min(hi)
}

/// Spearman rank correlation.
///
/// Ties get their average rank. Fewer than two points, or a series whose
/// ranks have no variance, gives 0. Series of different lengths are a
/// shape error.
pub fn rank_correlation(x: &[f64], y: &[f64]) -> Result<f64> {
    if x.len() != y.len() {
        return Err(IndexError::shape(
            format!("series of length {}", x.len()),
            format!("length {}", y.len()),
        ));
    }
    if x.len() < 2 {
        return Ok(0.0);
    }
    Ok(pearson(&ranks(x), &ranks(y)))
}

/// 1-based ranks with ties averaged.
fn ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start..end share rank (start+1 + end) / 2
        let rank = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    ranks
}

/// Smoothed index plus the value it replaced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexState {
    pub value: f64,
    pub previous: f64,
}

impl IndexState {
    pub fn new(initial: f64) -> Self {
        Self {
            value: initial,
            previous: initial,
        }
    }
}

/// Result of one aggregation step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateOutput {
    pub instantaneous: f64,
    pub smoothed: f64,
}

/// Stateful aggregator: one smoothing step per tick.
#[derive(Debug, Clone)]
pub struct IndexAggregator {
    mode: AggregationMode,
    weights: WeightSet,
    lambda: f64,
    strict: bool,
    initial: f64,
    state: IndexState,
}

impl IndexAggregator {
    pub fn new(mode: AggregationMode, weights: WeightSet, lambda: f64) -> Result<Self> {
        mode.validate()?;
        weights.validate()?;
        if !(0.0..=1.0).contains(&lambda) {
            return Err(IndexError::InvalidConfig(format!(
                "smoothing lambda must be in [0, 1], got {}",
                lambda
            )));
        }
        Ok(Self {
            mode,
            weights,
            lambda,
            strict: false,
            initial: 0.5,
            state: IndexState::new(0.5),
        })
    }

    pub fn from_config(config: &IndexConfig) -> Result<Self> {
        config.smoothing.validate()?;
        let mut aggregator = Self::new(
            config.aggregation,
            config.weights.clone(),
            config.smoothing.lambda,
        )?;
        aggregator.strict = config.strict_weights;
        aggregator.initial = config.smoothing.initial;
        aggregator.state = IndexState::new(config.smoothing.initial);
        Ok(aggregator)
    }

    /// Require a score for every weighted component.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Instantaneous index for `components` without touching state.
    pub fn instantaneous(&self, components: &ComponentScores) -> Result<f64> {
        if self.strict {
            self.weights.check_coverage(components)?;
        }
        match self.mode {
            AggregationMode::Linear => aggregate_linear(components, &self.weights),
            AggregationMode::Logistic { threshold } => {
                aggregate_logistic(components, &self.weights, threshold)
            }
        }
    }

    /// Aggregate and fold the result into the smoothed index.
    pub fn update(&mut self, components: &ComponentScores) -> Result<AggregateOutput> {
        let instantaneous = self.instantaneous(components)?;
        let smoothed = smooth(self.state.value, instantaneous, self.lambda);
        self.state = IndexState {
            value: smoothed,
            previous: self.state.value,
        };
        debug!(instantaneous, smoothed, "index updated");
        Ok(AggregateOutput {
            instantaneous,
            smoothed,
        })
    }

    /// Contribution breakdown at the current smoothed index.
    pub fn explain(&self, components: &ComponentScores) -> Result<ComponentScores> {
        explain(self.state.value, components, &self.weights)
    }

    /// Restore the initial neutral value.
    pub fn reset(&mut self) {
        self.state = IndexState::new(self.initial);
    }

    pub fn state(&self) -> IndexState {
        self.state
    }

    pub fn value(&self) -> f64 {
        self.state.value
    }

    pub fn mode(&self) -> AggregationMode {
        self.mode
    }

    pub fn weights(&self) -> &WeightSet {
        &self.weights
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Weighted components in weight order.
    pub fn components(&self) -> impl Iterator<Item = Component> + '_ {
        self.weights.iter().map(|(c, _)| c)
    }
}
