// cimeter-sim - Synthetic acquisition
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # cimeter-sim
//!
//! Synthetic acquisition for cimeter, standing in for EEG boards and
//! scalar sensors:
//!
//! - **EEG-like buffers**: 8 × 250 samples at 250 Hz with a shared 40 Hz
//!   gamma carrier plus Gaussian noise
//! - **Resources**: ATP-like samples around a configurable mean
//! - **Readings**: light/temperature with optional dropout (reported as
//!   0.5), placeholder fMRI/fNIRS/MEG channels
//! - **2-back task mode**: EEG gamma +0.2·U, fMRI +0.15·U, fNIRS +0.1·U,
//!   MEG +0.2·U, all clipped to [0,1]
//! - **References**: optional synthetic clinical / complexity / behavioural
//!   scores
//!
//! ## Quick Start
//!
//! ```rust
//! use cimeter::{IndexConfig, IndexEngine};
//! use cimeter_sim::{SimConfig, SyntheticSource};
//!
//! let mut source = SyntheticSource::new(SimConfig::new().with_seed(42)).unwrap();
//! let mut engine = IndexEngine::new(IndexConfig {
//!     seed: Some(42),
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! let baseline = engine.calibrate(&mut source, 5_000).unwrap();
//! assert_eq!(baseline.samples, 6);
//! ```

pub mod config;
pub mod error;
pub mod signals;
pub mod source;

pub use config::SimConfig;
pub use error::{Result, SimError};
pub use source::SyntheticSource;

#[cfg(test)]
mod tests {
    use super::*;
    use cimeter::{CalibrationState, Component, IndexConfig, IndexEngine, SignalSource};

    fn engine(seed: u64) -> IndexEngine {
        let config = IndexConfig {
            seed: Some(seed),
            ..Default::default()
        };
        IndexEngine::new(config).unwrap()
    }

    #[test]
    fn test_engine_consumes_source() {
        let mut source = SyntheticSource::new(SimConfig::new().with_seed(1)).unwrap();
        let mut engine = engine(1);
        for _ in 0..20 {
            let snapshot = engine.tick(&source.next_input()).unwrap();
            assert!((0.0..=1.0).contains(&snapshot.index));
        }
        assert_eq!(engine.tick_count(), 20);
    }

    #[test]
    fn test_calibration_over_source() {
        let mut source = SyntheticSource::new(SimConfig::new().with_seed(2)).unwrap();
        let mut engine = engine(2);
        let baseline = engine.calibrate(&mut source, 10_000).unwrap();
        assert_eq!(engine.calibration_state(), CalibrationState::Ready);
        assert_eq!(baseline.samples, 11);
        assert!(baseline.coherence.mean > 0.3);
    }

    #[test]
    fn test_task_mode_raises_external_channels() {
        let mean_fmri = |task: bool| {
            let mut source =
                SyntheticSource::new(SimConfig::new().with_seed(3).with_task_mode(task)).unwrap();
            let mut engine = engine(3);
            let total: f64 = (0..30)
                .map(|_| {
                    let snapshot = engine.tick(&source.next_input()).unwrap();
                    snapshot.components.get(Component::Fmri).unwrap_or(0.0)
                })
                .sum();
            total / 30.0
        };
        assert!(mean_fmri(true) > mean_fmri(false));
    }
}
