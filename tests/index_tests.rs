// cimeter - Integration Tests
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Integration tests for the cimeter pipeline.

use cimeter::components::{coherence, integration_phi};
use cimeter::stats::{compressibility_ratio, entropy, spectral_peak_ratio};
use cimeter::*;
use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

// ============================================================================
// Helper Functions
// ============================================================================

fn scores(pairs: &[(Component, f64)]) -> ComponentScores {
    pairs.iter().copied().collect()
}

fn weights(pairs: &[(Component, f64)]) -> WeightSet {
    pairs.iter().copied().collect()
}

fn gamma_buffer(timestamp_ms: u64, channels: usize) -> SignalBuffer {
    let mut rng = StdRng::seed_from_u64(timestamp_ms);
    let data = (0..channels)
        .map(|_| {
            (0..250)
                .map(|t| {
                    let x = t as f64 / 250.0;
                    (2.0 * PI * 40.0 * x).sin() + 0.2 * rng.gen::<f64>()
                })
                .collect()
        })
        .collect();
    SignalBuffer::new(data).unwrap()
}

fn tick_input(timestamp_ms: u64) -> TickInput {
    TickInput::new(timestamp_ms, gamma_buffer(timestamp_ms, 8))
        .with_resources(vec![0.8, 0.81, 0.79, 0.8])
        .with_toxins(0.05)
}

fn seeded_config(seed: u64) -> IndexConfig {
    IndexConfig {
        network: NetworkConfig {
            node_count: 24,
            ..Default::default()
        },
        seed: Some(seed),
        ..Default::default()
    }
}

// ============================================================================
// Section 1: Signal Statistics (4 tests)
// ============================================================================

#[test]
fn test_01_entropy_bounded() {
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..20 {
        let signal: Vec<f64> = (0..300).map(|_| rng.gen_range(-5.0..5.0)).collect();
        let h = entropy(&signal, 16);
        assert!((0.0..=1.0).contains(&h));
    }
    assert_eq!(entropy(&[3.3; 64], 16), 0.0);
}

#[test]
fn test_02_constant_eight_channels() {
    let signals = DMatrix::from_element(8, 250, 0.42);
    let c = coherence(&signals);
    assert!(!c.is_nan());
    assert_eq!(c, 0.0);

    let flat: Vec<f64> = signals.iter().copied().collect();
    assert_eq!(entropy(&flat, 16), 0.0);
}

#[test]
fn test_03_gamma_peak_detected() {
    let signal: Vec<f64> = (0..250)
        .map(|t| (2.0 * PI * 40.0 * t as f64 / 250.0).sin())
        .collect();
    assert!(spectral_peak_ratio(&signal, 250.0) > 0.9);
    assert_eq!(spectral_peak_ratio(&[1.0], 250.0), 0.5);
}

#[test]
fn test_04_periodic_more_compressible_than_random() {
    for seed in 0..5 {
        let mut rng = StdRng::seed_from_u64(seed);
        let periodic: Vec<f64> = (0..2000).map(|i| [0.0, 1.0, 1.0, 0.0][i % 4]).collect();
        let random: Vec<f64> = (0..2000).map(|_| rng.gen_range(0..=1) as f64).collect();

        let p = compressibility_ratio(&periodic, &mut rng);
        let r = compressibility_ratio(&random, &mut rng);
        assert!(p < r, "seed {}: periodic {} vs random {}", seed, p, r);
    }
}

// ============================================================================
// Section 2: Network and Components (3 tests)
// ============================================================================

#[test]
fn test_05_network_deterministic_with_seed() {
    let config = NetworkConfig {
        node_count: 30,
        ..Default::default()
    };
    let run = || {
        let mut rng = StdRng::seed_from_u64(99);
        let mut graph = VitalityGraph::new(&config, &mut rng).unwrap();
        for t in 0..25 {
            graph.update(0.6, (t % 3) as f64, &mut rng);
        }
        graph.state().clone()
    };
    let a = run();
    assert_eq!(a, run());
    assert!(a.is_symmetric());
    assert!(a.is_bounded());
}

#[test]
fn test_06_integration_of_empty_graph_is_zero() {
    let mut rng = StdRng::seed_from_u64(5);
    for n in [1usize, 2, 10, 100] {
        let w = DMatrix::zeros(n, n);
        let phi = integration_phi(&w, n, 5, &mut rng).unwrap();
        if n >= 2 {
            assert_eq!(phi, 0.0);
        }
    }
}

#[test]
fn test_07_influence_network_bounded() {
    let config = NetworkConfig {
        model: NetworkModel::Influence,
        node_count: 50,
        coupling: CouplingMode::Regenerated,
        ..Default::default()
    };
    let mut rng = StdRng::seed_from_u64(8);
    let mut net = InfluenceNetwork::new(&config, &mut rng).unwrap();
    for _ in 0..100 {
        assert!(net.step(&mut rng).iter().all(|v| (0.0..=1.0).contains(v)));
    }
}

// ============================================================================
// Section 3: Aggregation (6 tests)
// ============================================================================

#[test]
fn test_08_linear_scenario() {
    let c = scores(&[(Component::Sigma, 1.0), (Component::Phi, 0.0)]);
    let w = weights(&[(Component::Sigma, 2.0), (Component::Phi, 2.0)]);
    assert!((aggregate_linear(&c, &w).unwrap() - 0.5).abs() < 1e-12);
}

#[test]
fn test_09_logistic_scenario() {
    let c = scores(&[(Component::Sigma, 1.0)]);
    let w = weights(&[(Component::Sigma, 1.0)]);
    let y = aggregate_logistic(&c, &w, 0.5).unwrap();
    assert!((y - 0.622_459_3).abs() < 1e-6);
}

#[test]
fn test_10_linear_bounded_for_random_inputs() {
    let mut rng = StdRng::seed_from_u64(10);
    for _ in 0..200 {
        let c: ComponentScores = Component::ALL
            .iter()
            .map(|&k| (k, rng.gen_range(-2.0..3.0)))
            .collect();
        let w: WeightSet = Component::ALL
            .iter()
            .map(|&k| (k, rng.gen_range(0.0..1000.0)))
            .collect();
        let index = aggregate_linear(&c, &w).unwrap();
        assert!((0.0..=1.0).contains(&index));

        let y = aggregate_logistic(&c, &w, 0.5).unwrap();
        assert!(y > 0.0 && y < 1.0);
    }
}

#[test]
fn test_11_smooth_idempotent() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..100 {
        let x: f64 = rng.gen();
        let lambda: f64 = rng.gen();
        assert_eq!(smooth(x, x, lambda), x);
    }
}

#[test]
fn test_12_external_scale_monotonic() {
    let mut values: Vec<f64> = (0..50).map(|i| i as f64 / 49.0).collect();
    values.insert(0, -0.5);
    values.push(1.5);
    let mapped: Vec<f64> = values
        .iter()
        .map(|&v| map_to_external_scale(v, 3.0, 15.0))
        .collect();
    assert!(mapped.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(mapped[0], 3.0);
    assert_eq!(*mapped.last().unwrap(), 15.0);
}

#[test]
fn test_13_rank_correlation_neutral_on_single_point() {
    assert_eq!(rank_correlation(&[0.3], &[12.0]).unwrap(), 0.0);
    assert!(rank_correlation(&[0.1, 0.2], &[1.0]).is_err());
}

// ============================================================================
// Section 4: Configuration Errors (2 tests)
// ============================================================================

#[test]
fn test_14_strict_mode_requires_every_component() {
    let config = IndexConfig {
        strict_weights: true,
        weights: weights(&[(Component::Sigma, 1.0), (Component::Meg, 1.0)]),
        ..seeded_config(14)
    };
    let mut engine = IndexEngine::new(config).unwrap();
    // Every tick scores the full component set, so strict mode passes.
    assert!(engine.tick(&tick_input(0)).is_ok());

    let aggregator = engine.aggregator().clone();
    let partial = scores(&[(Component::Sigma, 0.5)]);
    let err = aggregator.instantaneous(&partial).unwrap_err();
    assert!(err.is_weight_error());
}

#[test]
fn test_15_invalid_weights_rejected_at_build() {
    let config = IndexConfig {
        weights: weights(&[(Component::Sigma, -1.0)]),
        ..seeded_config(15)
    };
    assert!(matches!(
        IndexEngine::new(config),
        Err(IndexError::InvalidWeight { .. })
    ));

    let json = r#"{ "weights": { "sigma": 0.0 } }"#;
    assert!(matches!(
        IndexConfig::from_json(json),
        Err(IndexError::EmptyWeights)
    ));
}

// ============================================================================
// Section 5: Engine Lifecycle (5 tests)
// ============================================================================

#[test]
fn test_16_calibration_state_machine() {
    let mut engine = IndexEngine::new(seeded_config(16)).unwrap();
    assert_eq!(engine.calibration_state(), CalibrationState::Uncalibrated);

    let mut t = 0;
    let mut source = || {
        t += 100;
        tick_input(t)
    };
    let baseline = engine.calibrate(&mut source, 1_000).unwrap();
    assert_eq!(engine.calibration_state(), CalibrationState::Ready);
    assert_eq!(baseline.samples, 11);

    let (index, coherence, compressibility) = baseline.means();
    assert!((0.0..=1.0).contains(&index));
    assert!(coherence > 0.5, "shared 40 Hz carrier, got {}", coherence);
    assert!(compressibility > 0.0);

    engine.recalibrate(200);
    assert_eq!(engine.calibration_state(), CalibrationState::Calibrating);
    assert_eq!(engine.index(), 0.5);
    for _ in 0..3 {
        engine.tick(&source.next_input()).unwrap();
    }
    assert_eq!(engine.calibration_state(), CalibrationState::Ready);
}

#[test]
fn test_17_snapshot_contents() {
    let mut engine = IndexEngine::new(seeded_config(17)).unwrap();
    let snapshot = engine.tick(&tick_input(0)).unwrap();

    let keys: Vec<Component> = snapshot.contributions.iter().map(|(c, _)| c).collect();
    assert_eq!(keys, Component::ALL.to_vec());
    assert!(snapshot.components.get(Component::Quantum).unwrap() > 0.5);
    assert!(snapshot.info_energy_j > 0.0);
    assert!(snapshot.has_flag("UNCALIBRATED"));

    let json = snapshot.to_json().unwrap();
    let parsed = IndexSnapshot::from_json(&json).unwrap();
    assert_eq!(parsed.tick, snapshot.tick);
    assert_eq!(parsed.components.len(), snapshot.components.len());
}

#[test]
fn test_18_seeded_engines_reproduce() {
    let run = |seed| {
        let mut engine = IndexEngine::new(seeded_config(seed)).unwrap();
        (0..15)
            .map(|i| engine.tick(&tick_input(i * 40)).unwrap().index)
            .collect::<Vec<_>>()
    };
    assert_eq!(run(3), run(3));
}

#[test]
fn test_19_reference_correlations() {
    let mut engine = IndexEngine::new(seeded_config(19)).unwrap();
    let mut last = None;
    for i in 0..30u64 {
        let input = tick_input(i * 40).with_references(ReferenceSample {
            clinical: Some(3.0 + (i % 13) as f64),
            complexity: Some(0.3),
            behavioral: None,
        });
        last = Some(engine.tick(&input).unwrap());
    }
    let c = last.unwrap().correlations;
    assert!((-1.0..=1.0).contains(&c.clinical));
    assert_eq!(c.complexity, 0.0);
    assert_eq!(c.behavioral, 0.0);
}

#[test]
fn test_20_config_file_drives_engine() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "aggregation": {{ "mode": "logistic", "threshold": 0.5 }},
            "weights": {{ "coherence": 1, "sustainability": 1, "quantum": 1, "order": 1, "integration": 1 }},
            "network": {{ "model": "influence", "node_count": 10 }},
            "seed": 5
        }}"#
    )
    .unwrap();

    let config = IndexConfig::load(file.path()).unwrap();
    let mut engine = IndexEngine::new(config).unwrap();
    assert!(matches!(engine.network(), Network::Influence(_)));

    for i in 0..10 {
        let snapshot = engine.tick(&tick_input(i * 100)).unwrap();
        assert!(snapshot.instantaneous > 0.0 && snapshot.instantaneous < 1.0);
    }
}
