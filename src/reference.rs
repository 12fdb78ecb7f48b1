// cimeter - Consciousness index meter
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Bounded index/reference histories and their rank correlations.

use crate::aggregate::rank_correlation;
use crate::error::Result;
use crate::input::ReferenceSample;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Spearman coefficients of the index against each external reference.
/// A series with fewer than two paired points reports 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Correlations {
    pub clinical: f64,
    pub complexity: f64,
    pub behavioral: f64,
}

/// Paired `(index, reference)` history, oldest first.
#[derive(Debug, Clone, Default)]
struct PairedSeries {
    pairs: VecDeque<(f64, f64)>,
}

impl PairedSeries {
    fn push(&mut self, index: f64, reference: f64, window: usize) {
        if !reference.is_finite() {
            return;
        }
        if self.pairs.len() == window {
            self.pairs.pop_front();
        }
        self.pairs.push_back((index, reference));
    }

    fn correlation(&self) -> Result<f64> {
        let (index, reference): (Vec<f64>, Vec<f64>) = self.pairs.iter().copied().unzip();
        rank_correlation(&index, &reference)
    }
}

/// Tracks the smoothed index against up to three reference series.
#[derive(Debug, Clone)]
pub struct ReferenceTracker {
    window: usize,
    clinical: PairedSeries,
    complexity: PairedSeries,
    behavioral: PairedSeries,
}

impl ReferenceTracker {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(2),
            clinical: PairedSeries::default(),
            complexity: PairedSeries::default(),
            behavioral: PairedSeries::default(),
        }
    }

    /// Record the index against whichever references are present.
    pub fn record(&mut self, index: f64, sample: &ReferenceSample) {
        let window = self.window;
        if let Some(v) = sample.clinical {
            self.clinical.push(index, v, window);
        }
        if let Some(v) = sample.complexity {
            self.complexity.push(index, v, window);
        }
        if let Some(v) = sample.behavioral {
            self.behavioral.push(index, v, window);
        }
    }

    pub fn correlations(&self) -> Result<Correlations> {
        Ok(Correlations {
            clinical: self.clinical.correlation()?,
            complexity: self.complexity.correlation()?,
            behavioral: self.behavioral.correlation()?,
        })
    }

    /// Paired points held per reference: (clinical, complexity, behavioral).
    pub fn lengths(&self) -> (usize, usize, usize) {
        (
            self.clinical.pairs.len(),
            self.complexity.pairs.len(),
            self.behavioral.pairs.len(),
        )
    }

    pub fn clear(&mut self) {
        self.clinical.pairs.clear();
        self.complexity.pairs.clear();
        self.behavioral.pairs.clear();
    }
}
