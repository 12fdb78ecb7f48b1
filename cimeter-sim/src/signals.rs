// cimeter-sim - Synthetic acquisition
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Signal generators: gamma-carrier EEG, resource samples and the scalar
//! readings with their task effects.

use crate::config::SimConfig;
use cimeter::input::DEFAULT_READING;
use cimeter::{Readings, ReferenceSample};
use nalgebra::DMatrix;
use rand::prelude::*;
use rand_distr::Normal;
use std::f64::consts::PI;

/// 2-back task effect on each channel's gamma level.
pub const TASK_GAMMA_BOOST: f64 = 0.2;
/// 2-back task effect on fMRI functional connectivity.
pub const TASK_FMRI_BOOST: f64 = 0.15;
/// 2-back task effect on fNIRS haemoglobin.
pub const TASK_FNIRS_BOOST: f64 = 0.1;
/// 2-back task effect on MEG coherence.
pub const TASK_MEG_BOOST: f64 = 0.2;

/// Per-channel gamma level in [0,1], raised by `0.2·U` in task mode.
pub fn gamma_levels<R: Rng + ?Sized>(config: &SimConfig, rng: &mut R) -> Vec<f64> {
    (0..config.channels)
        .map(|_| {
            let boost = if config.task_mode {
                TASK_GAMMA_BOOST * rng.gen::<f64>()
            } else {
                0.0
            };
            (config.gamma_level + boost).clamp(0.0, 1.0)
        })
        .collect()
}

/// Channels × samples buffer: `level_c · sin(2π·f·t + φ_c) + noise`.
///
/// The carrier is shared by all channels, so channel pairs correlate in
/// proportion to their gamma level over the noise.
pub fn synthetic_eeg<R: Rng + ?Sized>(
    config: &SimConfig,
    levels: &[f64],
    start_s: f64,
    noise: &Normal<f64>,
    rng: &mut R,
) -> DMatrix<f64> {
    let phases: Vec<f64> = levels
        .iter()
        .map(|_| (rng.gen::<f64>() - 0.5) * config.phase_jitter)
        .collect();
    let omega = 2.0 * PI * config.gamma_hz;

    DMatrix::from_fn(levels.len(), config.samples, |c, j| {
        let t = start_s + j as f64 / config.sample_rate_hz;
        levels[c] * (omega * t + phases[c]).sin() + noise.sample(rng)
    })
}

/// Resource (ATP) samples, clipped to [0,1].
pub fn synthetic_resources<R: Rng + ?Sized>(
    config: &SimConfig,
    spread: &Normal<f64>,
    rng: &mut R,
) -> Vec<f64> {
    (0..config.resource_samples)
        .map(|_| (config.resource_mean + spread.sample(rng)).clamp(0.0, 1.0))
        .collect()
}

/// Scalar readings. Unavailable sensors report the default 0.5; the
/// physiological channels are placeholders at 0.5 plus task effects.
pub fn synthetic_readings<R: Rng + ?Sized>(config: &SimConfig, rng: &mut R) -> Readings {
    let mut sensor = |nominal: f64| {
        if rng.gen_bool(config.dropout_probability) {
            DEFAULT_READING
        } else {
            (nominal + 0.05 * (rng.gen::<f64>() - 0.5)).clamp(0.0, 1.0)
        }
    };
    let light = sensor(0.6);
    let temperature = sensor(0.55);
    let em_field = DEFAULT_READING;

    let mut boost = |scale: f64| {
        if config.task_mode {
            scale * rng.gen::<f64>()
        } else {
            0.0
        }
    };
    let fmri = (DEFAULT_READING + boost(TASK_FMRI_BOOST)).clamp(0.0, 1.0);
    let fnirs = (DEFAULT_READING + boost(TASK_FNIRS_BOOST)).clamp(0.0, 1.0);
    let meg = (DEFAULT_READING + boost(TASK_MEG_BOOST)).clamp(0.0, 1.0);

    Readings {
        light,
        temperature,
        em_field,
        fmri,
        fnirs,
        meg,
    }
}

/// Synthetic ground truth that tracks the mean gamma level.
///
/// Clinical is an integer score on 3-15, complexity a perturbational
/// complexity estimate in [0,1], behavioural a task accuracy (task mode
/// only).
pub fn synthetic_references<R: Rng + ?Sized>(
    levels: &[f64],
    task_mode: bool,
    rng: &mut R,
) -> ReferenceSample {
    let mean = if levels.is_empty() {
        0.0
    } else {
        levels.iter().sum::<f64>() / levels.len() as f64
    };
    let jitter = |rng: &mut R| 0.1 * (rng.gen::<f64>() - 0.5);

    let clinical = (3.0 + 12.0 * (mean + jitter(rng)).clamp(0.0, 1.0)).round();
    let complexity = (0.2 + 0.5 * mean + jitter(rng)).clamp(0.0, 1.0);
    let behavioral = if task_mode {
        Some((0.5 + 0.5 * mean + jitter(rng)).clamp(0.0, 1.0))
    } else {
        None
    };

    ReferenceSample {
        clinical: Some(clinical),
        complexity: Some(complexity),
        behavioral,
    }
}
