// cimeter - Consciousness index meter
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Per-tick input supplied by an acquisition collaborator.
//!
//! Acquisition is best-effort: missing sensors show up as default readings
//! (0.5), never as errors. Only malformed buffers are rejected.

use crate::error::{IndexError, Result};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Channel sample buffers, one `Vec` per channel, all the same length.
///
/// Values need not be normalized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct SignalBuffer {
    channels: Vec<Vec<f64>>,
}

impl SignalBuffer {
    /// Build from per-channel samples. Ragged channels are rejected.
    pub fn new(channels: Vec<Vec<f64>>) -> Result<Self> {
        if let Some(first) = channels.first() {
            let len = first.len();
            if let Some((i, ch)) = channels.iter().enumerate().find(|(_, c)| c.len() != len) {
                return Err(IndexError::shape(
                    format!("{} samples per channel", len),
                    format!("channel {} with {} samples", i, ch.len()),
                ));
            }
        }
        Ok(Self { channels })
    }

    /// Channels × samples matrix in row-major order.
    pub fn from_matrix(matrix: &DMatrix<f64>) -> Self {
        let channels = (0..matrix.nrows())
            .map(|i| matrix.row(i).iter().copied().collect())
            .collect();
        Self { channels }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn channel(&self, index: usize) -> Option<&[f64]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> &[Vec<f64>] {
        &self.channels
    }

    /// Channels × samples matrix.
    pub fn to_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.channel_count(), self.len(), |i, j| self.channels[i][j])
    }

    /// All samples, channel after channel.
    pub fn flatten(&self) -> Vec<f64> {
        self.channels.iter().flatten().copied().collect()
    }
}

impl TryFrom<Vec<Vec<f64>>> for SignalBuffer {
    type Error = IndexError;

    fn try_from(channels: Vec<Vec<f64>>) -> Result<Self> {
        Self::new(channels)
    }
}

impl From<SignalBuffer> for Vec<Vec<f64>> {
    fn from(buffer: SignalBuffer) -> Self {
        buffer.channels
    }
}

/// Scalar readings, each nominally in [0,1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Readings {
    pub light: f64,
    pub temperature: f64,
    pub em_field: f64,
    pub fmri: f64,
    pub fnirs: f64,
    pub meg: f64,
}

/// Value substituted for a reading that is unavailable.
pub const DEFAULT_READING: f64 = 0.5;

impl Default for Readings {
    fn default() -> Self {
        Self {
            light: DEFAULT_READING,
            temperature: DEFAULT_READING,
            em_field: DEFAULT_READING,
            fmri: DEFAULT_READING,
            fnirs: DEFAULT_READING,
            meg: DEFAULT_READING,
        }
    }
}

impl Readings {
    /// Clip every reading to [0,1]; non-finite readings fall back to the
    /// default.
    pub fn sanitized(&self) -> Self {
        let fix = |v: f64| {
            if v.is_finite() {
                v.clamp(0.0, 1.0)
            } else {
                DEFAULT_READING
            }
        };
        Self {
            light: fix(self.light),
            temperature: fix(self.temperature),
            em_field: fix(self.em_field),
            fmri: fix(self.fmri),
            fnirs: fix(self.fnirs),
            meg: fix(self.meg),
        }
    }
}

/// Optional ground-truth references for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceSample {
    /// Clinical ordinal score (e.g. 3-15).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinical: Option<f64>,
    /// Perturbational complexity estimate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<f64>,
    /// Behavioural performance score.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub behavioral: Option<f64>,
}

impl ReferenceSample {
    pub fn is_empty(&self) -> bool {
        self.clinical.is_none() && self.complexity.is_none() && self.behavioral.is_none()
    }
}

/// Everything the engine consumes for one tick.
///
/// Example JSON:
/// ```json
/// {
///   "timestamp_ms": 1000,
///   "signals": [[0.1, 0.4, 0.2], [0.3, 0.1, 0.5]],
///   "resources": [0.8, 0.75, 0.9],
///   "toxins": 0.2,
///   "readings": { "light": 0.6 }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Monotonic timestamp in milliseconds.
    pub timestamp_ms: u64,

    /// Channel buffers for this window.
    pub signals: SignalBuffer,

    /// Resource (ATP) level samples.
    #[serde(default)]
    pub resources: Vec<f64>,

    /// Toxin load driving decay and the sustainability penalty.
    #[serde(default)]
    pub toxins: f64,

    #[serde(default)]
    pub readings: Readings,

    #[serde(default)]
    pub references: ReferenceSample,
}

impl TickInput {
    pub fn new(timestamp_ms: u64, signals: SignalBuffer) -> Self {
        Self {
            timestamp_ms,
            signals,
            ..Default::default()
        }
    }

    pub fn with_resources(mut self, resources: Vec<f64>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_toxins(mut self, toxins: f64) -> Self {
        self.toxins = toxins;
        self
    }

    pub fn with_readings(mut self, readings: Readings) -> Self {
        self.readings = readings;
        self
    }

    pub fn with_references(mut self, references: ReferenceSample) -> Self {
        self.references = references;
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Toxin load as the pipeline uses it: non-finite or negative values
    /// count as no load.
    pub fn toxin_load(&self) -> f64 {
        if self.toxins.is_finite() && self.toxins > 0.0 {
            self.toxins
        } else {
            0.0
        }
    }
}

/// A collaborator that produces one [`TickInput`] per call.
///
/// Sources never fail: unavailable sensors are replaced with defaults
/// before the input reaches the engine.
pub trait SignalSource {
    fn next_input(&mut self) -> TickInput;
}

impl<F: FnMut() -> TickInput> SignalSource for F {
    fn next_input(&mut self) -> TickInput {
        self()
    }
}
