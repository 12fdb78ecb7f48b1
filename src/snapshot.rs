// cimeter - Consciousness index meter
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! IndexSnapshot - per-tick output handed to presentation.

use crate::baseline::{CalibrationBaseline, CalibrationState};
use crate::component::{Component, ComponentScores};
use crate::reference::Correlations;
use serde::{Deserialize, Serialize};

/// Version of the snapshot format.
pub const SNAPSHOT_VERSION: &str = "0.1.0";

/// Everything one tick produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    /// Format version.
    pub version: String,
    /// Input timestamp of this tick.
    pub timestamp_ms: u64,
    /// Ticks processed so far, this one included.
    pub tick: u64,
    /// Calibration state after this tick.
    pub state: CalibrationState,
    /// Smoothed index.
    pub index: f64,
    /// Unsmoothed index for this tick.
    pub instantaneous: f64,
    /// Component scores in canonical order.
    pub components: ComponentScores,
    /// Per-component attribution, same order as `components`.
    pub contributions: ComponentScores,
    /// Index mapped onto the external scale.
    pub external_score: f64,
    /// LZW compressibility ratio.
    pub compressibility: f64,
    /// Normalized signal entropy.
    pub entropy: f64,
    /// Landauer energy (J).
    pub info_energy_j: f64,
    /// Rank correlations against reference series.
    pub correlations: Correlations,
    /// Most recent completed calibration.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub baseline: Option<CalibrationBaseline>,
    /// Additional flags.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub flags: Vec<String>,
}

impl IndexSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }

    pub fn is_calibrated(&self) -> bool {
        self.state == CalibrationState::Ready
    }

    /// Index minus the calibrated baseline index, if any.
    pub fn index_delta(&self) -> Option<f64> {
        self.baseline.as_ref().map(|b| self.index - b.index.mean)
    }

    /// Component with the largest contribution.
    pub fn dominant_component(&self) -> Option<(Component, f64)> {
        self.contributions
            .iter()
            .filter(|(_, v)| v.is_finite())
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }
}
