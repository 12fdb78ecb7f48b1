// cimeter - Consciousness index meter
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Per-tick component metrics, each normalized to [0,1].
//!
//! The quantum and integration scores are heuristic proxies (a gamma-band
//! peak ratio and a random-bipartition cut). They reproduce a computational
//! contract and are not validated physiological measures.

use crate::error::{IndexError, Result};
use crate::stats::{self, NEUTRAL};
use nalgebra::{DMatrix, DVector};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

/// Mean absolute pairwise Pearson correlation across channels.
///
/// `signals` is channels × samples. Fewer than two channels or two samples
/// gives 0; a zero-variance channel contributes a correlation of 0 to each
/// of its pairs instead of NaN.
pub fn coherence(signals: &DMatrix<f64>) -> f64 {
    let channels = signals.nrows();
    if channels < 2 || signals.ncols() < 2 {
        return 0.0;
    }

    let rows: Vec<Vec<f64>> = (0..channels)
        .map(|i| signals.row(i).iter().copied().collect())
        .collect();

    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 0..channels {
        for j in (i + 1)..channels {
            total += pearson(&rows[i], &rows[j]).abs();
            pairs += 1;
        }
    }

    (total / pairs as f64).clamp(0.0, 1.0)
}

/// Pearson correlation; 0 when either side has no variance.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 0.0;
    }
    let nf = n as f64;
    let mean_a = a[..n].iter().sum::<f64>() / nf;
    let mean_b = b[..n].iter().sum::<f64>() / nf;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a[..n].iter().zip(&b[..n]) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    let den = (var_a * var_b).sqrt();
    if !(den > 1e-12) || !den.is_finite() {
        return 0.0;
    }
    (cov / den).clamp(-1.0, 1.0)
}

/// `mean(resources) * exp(-toxins * std(resources))`, clipped to [0,1].
///
/// Uses the population standard deviation. Empty input gives 0.
pub fn sustainability(resources: &[f64], toxins: f64) -> f64 {
    if resources.is_empty() {
        return 0.0;
    }
    let n = resources.len() as f64;
    let mean = resources.iter().sum::<f64>() / n;
    let variance = resources.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;

    let score = mean * (-toxins * variance.sqrt()).exp();
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Minimum-information-bipartition proxy over a weighted graph.
///
/// Each trial splits the first `node_count` nodes into two random halves
/// and sums the positive weights crossing the cut (each unordered pair
/// once). The weakest cut over `trials`, divided by `node_count`
/// (= log2 of the 2^N state space), is clipped to [0,1].
///
/// Fewer than two nodes cannot be bipartitioned and give [`NEUTRAL`].
pub fn integration_phi<R: Rng + ?Sized>(
    edge_weights: &DMatrix<f64>,
    node_count: usize,
    trials: usize,
    rng: &mut R,
) -> Result<f64> {
    if !edge_weights.is_square() || edge_weights.nrows() < node_count {
        return Err(IndexError::shape(
            format!("square matrix of at least {} x {}", node_count, node_count),
            format!("{} x {}", edge_weights.nrows(), edge_weights.ncols()),
        ));
    }
    if node_count < 2 {
        debug!(node_count, "integration over fewer than two nodes");
        return Ok(NEUTRAL);
    }

    let mut nodes: Vec<usize> = (0..node_count).collect();
    let mut in_first = vec![false; node_count];
    let half = node_count / 2;
    let mut weakest = f64::INFINITY;

    for _ in 0..trials.max(1) {
        nodes.shuffle(rng);
        in_first.iter_mut().for_each(|m| *m = false);
        for &node in &nodes[..half] {
            in_first[node] = true;
        }

        let mut cut = 0.0;
        for i in 0..node_count {
            for j in (i + 1)..node_count {
                if in_first[i] != in_first[j] {
                    let w = edge_weights[(i, j)];
                    if w > 0.0 {
                        cut += w;
                    }
                }
            }
        }
        weakest = weakest.min(cut);
    }

    Ok((weakest / node_count as f64).clamp(0.0, 1.0))
}

/// `1 - entropy`, clipped to [0,1].
pub fn order(entropy_value: f64) -> f64 {
    (1.0 - entropy_value).clamp(0.0, 1.0)
}

/// Mean activation of a recurrent state; [`NEUTRAL`] when empty.
pub fn mean_connectivity(state: &DVector<f64>) -> f64 {
    if state.is_empty() {
        return NEUTRAL;
    }
    state.mean().clamp(0.0, 1.0)
}

/// Gamma-band peak ratio of the channel-averaged signal.
pub fn quantum_proxy(signals: &DMatrix<f64>, sample_rate: f64, band: (f64, f64)) -> f64 {
    if signals.nrows() == 0 {
        return NEUTRAL;
    }
    let averaged: Vec<f64> = signals.row_mean().iter().copied().collect();
    stats::spectral_peak_ratio_in_band(&averaged, sample_rate, band.0, band.1)
}

/// Energy score in [0,1]: bits per node over the cap.
pub fn energy_score(bits_per_node: f64) -> f64 {
    (bits_per_node / stats::MAX_BITS_PER_NODE).clamp(0.0, 1.0)
}
