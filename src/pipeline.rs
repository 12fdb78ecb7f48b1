// cimeter - Consciousness index meter
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! One tick of the component pipeline: signals and network in, named
//! component scores out.

use crate::component::{Component, ComponentScores};
use crate::components;
use crate::config::IndexConfig;
use crate::error::Result;
use crate::input::TickInput;
use crate::network::Network;
use crate::stats;
use rand::Rng;
use tracing::debug;

/// Component scores plus the raw statistics behind them.
#[derive(Debug, Clone, PartialEq)]
pub struct TickMetrics {
    pub scores: ComponentScores,
    /// Normalized entropy of the pooled samples.
    pub entropy: f64,
    /// LZW compressibility ratio of the pooled samples.
    pub compressibility: f64,
    /// Landauer energy in joules.
    pub info_energy_j: f64,
}

impl TickMetrics {
    pub fn coherence(&self) -> f64 {
        self.scores.get(Component::Sigma).unwrap_or(0.0)
    }
}

/// Compute every component for `input`, advancing `network` by one tick.
///
/// The network is driven by the sustainability score (vitality) and the
/// input toxin load. Scores come out in [`Component::ALL`] order.
pub fn compute_metrics<R: Rng + ?Sized>(
    input: &TickInput,
    network: &mut Network,
    config: &IndexConfig,
    rng: &mut R,
) -> Result<TickMetrics> {
    let readings = input.readings.sanitized();
    let matrix = input.signals.to_matrix();
    let pooled = input.signals.flatten();
    let bins = config.stats.entropy_bins;

    let toxins = input.toxin_load();
    if toxins != input.toxins {
        debug!(toxins = input.toxins, "toxin load out of range, using 0");
    }

    let sigma = components::coherence(&matrix);
    let vitality = components::sustainability(&input.resources, toxins);

    network.advance(vitality, toxins, rng);
    let phi = match network {
        Network::Graph(graph) => components::integration_phi(
            &graph.state().edge_weights,
            graph.node_count(),
            config.network.phi_trials,
            rng,
        )?,
        Network::Influence(net) => components::mean_connectivity(net.state()),
    };

    let quantum = components::quantum_proxy(
        &matrix,
        config.stats.sample_rate_hz,
        (config.stats.band_low_hz, config.stats.band_high_hz),
    );

    let entropy = stats::entropy(&pooled, bins);
    let omega = components::order(entropy);
    let compressibility = stats::compressibility_ratio(&pooled, rng);

    let bits = stats::bits_per_node(entropy, bins);
    let info_energy_j = stats::landauer_energy(
        bits,
        config.stats.boltzmann,
        config.stats.temperature_k,
        network.node_count(),
    );
    let energy = components::energy_score(bits);

    let scores = ComponentScores::new()
        .with(Component::Sigma, sigma)
        .with(Component::Vitality, vitality)
        .with(Component::Light, readings.light)
        .with(Component::Quantum, quantum)
        .with(Component::Entropy, entropy)
        .with(Component::Omega, omega)
        .with(Component::Energy, energy)
        .with(Component::Phi, phi)
        .with(Component::Fmri, readings.fmri)
        .with(Component::Fnirs, readings.fnirs)
        .with(Component::Meg, readings.meg);

    debug!(
        sigma,
        vitality,
        quantum,
        entropy,
        phi,
        compressibility,
        "components computed"
    );

    Ok(TickMetrics {
        scores,
        entropy,
        compressibility,
        info_energy_j,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NetworkConfig, NetworkModel};
    use crate::input::{Readings, SignalBuffer};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config(model: NetworkModel) -> IndexConfig {
        IndexConfig {
            network: NetworkConfig {
                model,
                node_count: 20,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn input() -> TickInput {
        let channels = (0..4)
            .map(|c| (0..250).map(|t| ((t + c) as f64 * 0.7).sin()).collect())
            .collect();
        TickInput::new(0, SignalBuffer::new(channels).unwrap())
            .with_resources(vec![0.8, 0.82, 0.79])
            .with_readings(Readings {
                light: 0.9,
                ..Default::default()
            })
    }

    #[test]
    fn test_all_components_present_and_bounded() {
        for model in [NetworkModel::VitalityGraph, NetworkModel::Influence] {
            let config = config(model);
            let mut rng = StdRng::seed_from_u64(1);
            let mut network = Network::from_config(&config.network, &mut rng).unwrap();

            let metrics = compute_metrics(&input(), &mut network, &config, &mut rng).unwrap();
            let order: Vec<_> = metrics.scores.iter().map(|(c, _)| c).collect();
            assert_eq!(order, Component::ALL.to_vec());
            for (component, value) in metrics.scores.iter() {
                assert!((0.0..=1.0).contains(&value), "{} = {}", component, value);
            }
            assert_eq!(metrics.scores.get(Component::Light), Some(0.9));
            assert_eq!(metrics.scores.get(Component::Fmri), Some(0.5));
            assert!(metrics.info_energy_j > 0.0);
        }
    }

    #[test]
    fn test_constant_signals_degenerate_cleanly() {
        let config = config(NetworkModel::VitalityGraph);
        let mut rng = StdRng::seed_from_u64(2);
        let mut network = Network::from_config(&config.network, &mut rng).unwrap();
        let flat = TickInput::new(0, SignalBuffer::new(vec![vec![0.3; 100]; 8]).unwrap());

        let metrics = compute_metrics(&flat, &mut network, &config, &mut rng).unwrap();
        assert_eq!(metrics.coherence(), 0.0);
        assert_eq!(metrics.entropy, 0.0);
        assert_eq!(metrics.scores.get(Component::Omega), Some(1.0));
        assert_eq!(metrics.scores.get(Component::Energy), Some(0.0));
        assert_eq!(metrics.scores.get(Component::Vitality), Some(0.0));
        assert!(metrics.scores.iter().all(|(_, v)| !v.is_nan()));
    }

    #[test]
    fn test_empty_signals_do_not_fail() {
        let config = config(NetworkModel::Influence);
        let mut rng = StdRng::seed_from_u64(3);
        let mut network = Network::from_config(&config.network, &mut rng).unwrap();
        let empty = TickInput::default();

        let metrics = compute_metrics(&empty, &mut network, &config, &mut rng).unwrap();
        assert_eq!(metrics.scores.get(Component::Quantum), Some(stats::NEUTRAL));
        assert_eq!(metrics.compressibility, stats::NEUTRAL);
    }

    #[test]
    fn test_bad_toxins_keep_network_bounded() {
        let config = config(NetworkModel::VitalityGraph);
        let mut rng = StdRng::seed_from_u64(4);
        let mut network = Network::from_config(&config.network, &mut rng).unwrap();

        for toxins in [0.1, f64::NAN, 0.1, -1e6, f64::INFINITY, 0.1, 0.1] {
            let tick = input().with_toxins(toxins);
            let metrics = compute_metrics(&tick, &mut network, &config, &mut rng).unwrap();
            assert!(metrics.scores.iter().all(|(_, v)| v.is_finite()));
            if let Network::Graph(graph) = &network {
                assert!(graph.state().is_bounded());
                assert!(graph.state().is_symmetric());
            }
        }
    }

    #[test]
    fn test_deterministic_with_seed() {
        let run = || {
            let config = config(NetworkModel::VitalityGraph);
            let mut rng = StdRng::seed_from_u64(7);
            let mut network = Network::from_config(&config.network, &mut rng).unwrap();
            (0..5)
                .map(|_| compute_metrics(&input(), &mut network, &config, &mut rng).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
