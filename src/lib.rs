// cimeter - Consciousness index meter
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # cimeter - Consciousness index meter
//!
//! Turns multi-channel signal buffers and a dynamical network into one
//! bounded, smoothed index.
//!
//! ## Pipeline
//!
//! ```text
//! TickInput ──> stats / components ──> ComponentScores ──> IndexAggregator ──> IndexSnapshot
//!                   ^                                           │
//!              Network (advanced once per tick)          smoothing, explain,
//!                                                        scale, correlations
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use cimeter::{IndexConfig, IndexEngine, SignalBuffer, TickInput};
//!
//! let config = IndexConfig {
//!     seed: Some(7),
//!     ..Default::default()
//! };
//! let mut engine = IndexEngine::new(config).unwrap();
//!
//! let channels = (0..8)
//!     .map(|c| (0..250).map(|t| ((t + c) as f64 * 0.3).sin()).collect())
//!     .collect();
//! let input = TickInput::new(0, SignalBuffer::new(channels).unwrap())
//!     .with_resources(vec![0.8, 0.78, 0.82]);
//!
//! let snapshot = engine.tick(&input).unwrap();
//! assert!((0.0..=1.0).contains(&snapshot.index));
//! assert!((3.0..=15.0).contains(&snapshot.external_score));
//! ```
//!
//! ## Modules
//!
//! - [`stats`]: entropy, spectral peak ratio, LZW compressibility, info energy
//! - [`network`]: vitality-driven graph and recurrent influence network
//! - [`components`]: coherence, sustainability, integration proxy, order
//! - [`aggregate`]: linear/logistic aggregation, smoothing, attribution
//! - [`baseline`]: calibration state machine
//! - [`engine`]: per-tick orchestration
//!
//! The quantum and integration components are heuristic proxies, not
//! validated physiological measures.

pub mod aggregate;
pub mod baseline;
pub mod component;
pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod network;
pub mod pipeline;
pub mod reference;
pub mod snapshot;
pub mod stats;

// Re-exports for convenient access
pub use aggregate::{
    aggregate_linear, aggregate_logistic, explain, map_to_external_scale, rank_correlation,
    sigmoid, smooth, AggregateOutput, IndexAggregator, IndexState,
};
pub use baseline::{CalibrationBaseline, CalibrationState, Calibrator, FieldStats};
pub use component::{Component, ComponentScores, WeightSet};
pub use config::{
    AggregationMode, CalibrationConfig, CouplingMode, IndexConfig, NetworkConfig, NetworkModel,
    ReferenceConfig, ScaleConfig, SmoothingConfig, StatsConfig,
};
pub use engine::IndexEngine;
pub use error::{IndexError, Result};
pub use input::{Readings, ReferenceSample, SignalBuffer, SignalSource, TickInput};
pub use network::{InfluenceNetwork, Network, NetworkState, VitalityGraph};
pub use pipeline::TickMetrics;
pub use reference::{Correlations, ReferenceTracker};
pub use snapshot::{IndexSnapshot, SNAPSHOT_VERSION};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
