// cimeter - Consciousness index meter
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Calibration lifecycle and baseline averages.

use crate::config::CalibrationConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Calibration lifecycle: `Uncalibrated -> Calibrating -> Ready`.
///
/// A recalibration request from `Ready` goes back to `Calibrating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationState {
    Uncalibrated,
    Calibrating,
    Ready,
}

impl CalibrationState {
    pub fn flag(&self) -> &'static str {
        match self {
            CalibrationState::Uncalibrated => "UNCALIBRATED",
            CalibrationState::Calibrating => "CALIBRATING",
            CalibrationState::Ready => "CALIBRATED",
        }
    }
}

/// Running mean and standard deviation of one tracked value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    pub mean: f64,
    pub std: f64,
    pub count: u64,
    #[serde(skip)]
    sum: f64,
    #[serde(skip)]
    sum_sq: f64,
}

impl FieldStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sample(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.count += 1;
        self.sum += value;
        self.sum_sq += value * value;
        self.recompute();
    }

    fn recompute(&mut self) {
        let n = self.count as f64;
        self.mean = self.sum / n;

        if self.count > 1 {
            let variance = (self.sum_sq - n * self.mean * self.mean) / (n - 1.0);
            self.std = variance.max(0.0).sqrt();
        } else {
            self.std = 0.0;
        }
    }
}

/// Averages gathered over one calibration window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationBaseline {
    pub index: FieldStats,
    pub coherence: FieldStats,
    pub compressibility: FieldStats,
    /// Ticks sampled.
    pub samples: u32,
    /// Input time covered (ms).
    pub elapsed_ms: u64,
    /// True when the window closed on the sample cap, not on time.
    #[serde(default)]
    pub capped: bool,
}

impl CalibrationBaseline {
    /// `(index, coherence, compressibility)` means.
    pub fn means(&self) -> (f64, f64, f64) {
        (self.index.mean, self.coherence.mean, self.compressibility.mean)
    }
}

/// Drives the calibration state machine from per-tick samples.
///
/// The window is measured by input timestamps: it opens on the first
/// sample after [`Calibrator::start`] and closes on the first sample at
/// least `duration_ms` later, or when `max_samples` have been taken.
#[derive(Debug, Clone)]
pub struct Calibrator {
    state: CalibrationState,
    duration_ms: u64,
    max_samples: u32,
    start_ms: Option<u64>,
    progress: f64,
    pending: CalibrationBaseline,
    baseline: Option<CalibrationBaseline>,
}

impl Calibrator {
    pub fn new(config: &CalibrationConfig) -> Self {
        Self {
            state: CalibrationState::Uncalibrated,
            duration_ms: config.duration_ms,
            max_samples: config.max_samples.max(1),
            start_ms: None,
            progress: 0.0,
            pending: CalibrationBaseline::default(),
            baseline: None,
        }
    }

    /// Open a new window. The previous baseline stays readable until the
    /// new one completes.
    pub fn start(&mut self, duration_ms: u64) {
        info!(duration_ms, "calibration started");
        self.state = CalibrationState::Calibrating;
        self.duration_ms = duration_ms;
        self.start_ms = None;
        self.progress = 0.0;
        self.pending = CalibrationBaseline::default();
    }

    /// Feed one tick. Returns the baseline when this sample closed the window.
    pub fn process(
        &mut self,
        index: f64,
        coherence: f64,
        compressibility: f64,
        timestamp_ms: u64,
    ) -> Option<CalibrationBaseline> {
        if self.state != CalibrationState::Calibrating {
            return None;
        }

        let start = *self.start_ms.get_or_insert(timestamp_ms);
        let elapsed = timestamp_ms.saturating_sub(start);

        self.pending.index.add_sample(index);
        self.pending.coherence.add_sample(coherence);
        self.pending.compressibility.add_sample(compressibility);
        self.pending.samples += 1;
        self.pending.elapsed_ms = elapsed;

        let time_done = elapsed >= self.duration_ms;
        let capped = !time_done && self.pending.samples >= self.max_samples;

        self.progress = if self.duration_ms > 0 {
            (elapsed as f64 / self.duration_ms as f64).min(1.0)
        } else {
            1.0
        };

        if !(time_done || capped) {
            return None;
        }

        if capped {
            warn!(
                samples = self.pending.samples,
                elapsed_ms = elapsed,
                duration_ms = self.duration_ms,
                "calibration stopped at sample cap"
            );
        }

        let mut baseline = std::mem::take(&mut self.pending);
        baseline.capped = capped;
        self.state = CalibrationState::Ready;
        self.progress = 1.0;
        info!(
            samples = baseline.samples,
            index = baseline.index.mean,
            coherence = baseline.coherence.mean,
            compressibility = baseline.compressibility.mean,
            "calibration complete"
        );
        self.baseline = Some(baseline.clone());
        Some(baseline)
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    /// Last completed baseline.
    pub fn baseline(&self) -> Option<&CalibrationBaseline> {
        self.baseline.as_ref()
    }

    /// Fraction of the current window elapsed (1.0 once ready).
    pub fn progress(&self) -> f64 {
        match self.state {
            CalibrationState::Uncalibrated => 0.0,
            CalibrationState::Calibrating => self.progress,
            CalibrationState::Ready => 1.0,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == CalibrationState::Ready
    }

    /// Back to `Uncalibrated`, dropping any baseline.
    pub fn reset(&mut self) {
        self.state = CalibrationState::Uncalibrated;
        self.start_ms = None;
        self.progress = 0.0;
        self.pending = CalibrationBaseline::default();
        self.baseline = None;
    }
}
