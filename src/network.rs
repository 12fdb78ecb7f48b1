// cimeter - Consciousness index meter
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Network dynamics.
//!
//! Two update policies over `N` nodes:
//! - [`VitalityGraph`]: node activations driven by a scalar vitality, edge
//!   weights decayed by toxins and sparsely perturbed by Gaussian noise.
//! - [`InfluenceNetwork`]: a recurrent state pulled towards the mean
//!   influence of a sparse random boolean coupling.
//!
//! All randomness comes from the caller's RNG, so a seeded generator gives
//! identical trajectories.

use crate::config::{CouplingMode, NetworkConfig, NetworkModel};
use crate::error::{IndexError, Result};
use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Node activations plus a symmetric edge-weight matrix, all in [0,1].
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkState {
    pub node_states: DVector<f64>,
    pub edge_weights: DMatrix<f64>,
}

impl NetworkState {
    pub fn zeros(node_count: usize) -> Self {
        Self {
            node_states: DVector::zeros(node_count),
            edge_weights: DMatrix::zeros(node_count, node_count),
        }
    }

    pub fn node_count(&self) -> usize {
        self.node_states.len()
    }

    pub fn is_symmetric(&self) -> bool {
        let w = &self.edge_weights;
        w.is_square() && (0..w.nrows()).all(|i| (0..i).all(|j| w[(i, j)] == w[(j, i)]))
    }

    /// True when every node state and edge weight lies in [0,1].
    pub fn is_bounded(&self) -> bool {
        let unit = |v: &f64| (0.0..=1.0).contains(v);
        self.node_states.iter().all(unit) && self.edge_weights.iter().all(unit)
    }
}

fn normal(std: f64) -> Result<Normal<f64>> {
    Normal::new(0.0, std)
        .map_err(|e| IndexError::InvalidConfig(format!("noise std {}: {}", std, e)))
}

/// Vitality-driven weighted graph.
#[derive(Debug, Clone)]
pub struct VitalityGraph {
    state: NetworkState,
    /// Undirected edges (i < j) of the underlying random graph.
    edges: Vec<(usize, usize)>,
    alpha: f64,
    beta: f64,
    toxin_decay: f64,
    perturb_probability: f64,
    perturb_noise: Normal<f64>,
}

impl VitalityGraph {
    /// Build an Erdős–Rényi graph with zeroed states and weights.
    pub fn new<R: Rng + ?Sized>(config: &NetworkConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;
        let n = config.node_count;
        let mut edges = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                if rng.gen_bool(config.edge_probability) {
                    edges.push((i, j));
                }
            }
        }

        Ok(Self {
            state: NetworkState::zeros(n),
            edges,
            alpha: config.alpha,
            beta: config.beta,
            toxin_decay: config.toxin_decay,
            perturb_probability: config.perturb_probability,
            perturb_noise: normal(config.perturb_std)?,
        })
    }

    /// Advance one tick.
    ///
    /// `nodes = α·nodes + (1-α)·vitality·U`, `weights = β·weights·exp(-k·toxins)`,
    /// then each graph edge is perturbed with probability p. Everything is
    /// clamped to [0,1] and the matrix stays symmetric. Non-finite vitality
    /// and non-finite or negative toxins are treated as 0.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        vitality: f64,
        toxins: f64,
        rng: &mut R,
    ) -> &NetworkState {
        let vitality = if vitality.is_finite() {
            vitality.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let toxins = if toxins.is_finite() && toxins > 0.0 {
            toxins
        } else {
            0.0
        };

        let alpha = self.alpha;
        for node in self.state.node_states.iter_mut() {
            let drive = vitality * rng.gen::<f64>();
            *node = (alpha * *node + (1.0 - alpha) * drive).clamp(0.0, 1.0);
        }

        let decay = self.beta * (-self.toxin_decay * toxins).exp();
        self.state
            .edge_weights
            .apply(|w| *w = (*w * decay).clamp(0.0, 1.0));

        for &(i, j) in &self.edges {
            if rng.gen_bool(self.perturb_probability) {
                let w = self.state.edge_weights[(i, j)];
                let perturbed = (w + self.perturb_noise.sample(rng)).clamp(0.0, 1.0);
                self.state.edge_weights[(i, j)] = perturbed;
                self.state.edge_weights[(j, i)] = perturbed;
            }
        }

        &self.state
    }

    pub fn state(&self) -> &NetworkState {
        &self.state
    }

    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.state.node_count()
    }
}

/// Recurrent influence network with boolean coupling.
#[derive(Debug, Clone)]
pub struct InfluenceNetwork {
    state: DVector<f64>,
    coupling: DMatrix<f64>,
    mode: CouplingMode,
    density: f64,
    persistence: f64,
    noise: Normal<f64>,
}

impl InfluenceNetwork {
    /// Random initial state in [0,1] and a first coupling draw.
    pub fn new<R: Rng + ?Sized>(config: &NetworkConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;
        let n = config.node_count;
        let state = DVector::from_fn(n, |_, _| rng.gen::<f64>());
        let coupling = random_coupling(n, config.coupling_density, rng);

        Ok(Self {
            state,
            coupling,
            mode: config.coupling,
            density: config.coupling_density,
            persistence: config.alpha,
            noise: normal(config.influence_noise_std)?,
        })
    }

    /// `s = α·s + (1-α)·(W·s)/max(1, ΣW) + noise`, clamped to [0,1].
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &DVector<f64> {
        if self.mode == CouplingMode::Regenerated {
            self.coupling = random_coupling(self.state.len(), self.density, rng);
        }

        let total = self.coupling.sum().max(1.0);
        let influence = (&self.coupling * &self.state) / total;

        let a = self.persistence;
        for (s, inf) in self.state.iter_mut().zip(influence.iter()) {
            let noisy = a * *s + (1.0 - a) * inf + self.noise.sample(rng);
            *s = noisy.clamp(0.0, 1.0);
        }

        &self.state
    }

    pub fn state(&self) -> &DVector<f64> {
        &self.state
    }

    pub fn coupling(&self) -> &DMatrix<f64> {
        &self.coupling
    }

    pub fn node_count(&self) -> usize {
        self.state.len()
    }
}

fn random_coupling<R: Rng + ?Sized>(n: usize, density: f64, rng: &mut R) -> DMatrix<f64> {
    DMatrix::from_fn(n, n, |_, _| if rng.gen_bool(density) { 1.0 } else { 0.0 })
}

/// The network selected by configuration.
#[derive(Debug, Clone)]
pub enum Network {
    Graph(VitalityGraph),
    Influence(InfluenceNetwork),
}

impl Network {
    pub fn from_config<R: Rng + ?Sized>(config: &NetworkConfig, rng: &mut R) -> Result<Self> {
        Ok(match config.model {
            NetworkModel::VitalityGraph => Network::Graph(VitalityGraph::new(config, rng)?),
            NetworkModel::Influence => Network::Influence(InfluenceNetwork::new(config, rng)?),
        })
    }

    /// Advance one tick. The influence network ignores vitality and toxins.
    pub fn advance<R: Rng + ?Sized>(&mut self, vitality: f64, toxins: f64, rng: &mut R) {
        match self {
            Network::Graph(graph) => {
                graph.update(vitality, toxins, rng);
            }
            Network::Influence(net) => {
                net.step(rng);
            }
        }
    }

    pub fn node_count(&self) -> usize {
        match self {
            Network::Graph(graph) => graph.node_count(),
            Network::Influence(net) => net.node_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_config(n: usize) -> NetworkConfig {
        NetworkConfig {
            node_count: n,
            edge_probability: 0.3,
            perturb_probability: 0.5,
            ..Default::default()
        }
    }

    #[test]
    fn test_graph_starts_zeroed() {
        let mut rng = StdRng::seed_from_u64(1);
        let graph = VitalityGraph::new(&small_config(20), &mut rng).unwrap();
        assert_eq!(graph.node_count(), 20);
        assert!(graph.state().node_states.iter().all(|&v| v == 0.0));
        assert!(graph.edges().iter().all(|&(i, j)| i < j));
    }

    #[test]
    fn test_graph_update_keeps_invariants() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut graph = VitalityGraph::new(&small_config(30), &mut rng).unwrap();

        for tick in 0..50 {
            let state = graph.update(0.8, (tick % 5) as f64, &mut rng);
            assert!(state.is_symmetric());
            assert!(state.is_bounded());
        }
        assert!(graph.state().edge_weights.sum() > 0.0);
        assert!(graph.state().node_states.sum() > 0.0);
    }

    #[test]
    fn test_bad_toxins_do_not_poison_weights() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut graph = VitalityGraph::new(&small_config(20), &mut rng).unwrap();
        for _ in 0..20 {
            graph.update(0.8, 0.1, &mut rng);
        }
        graph.update(0.8, f64::NAN, &mut rng);
        for _ in 0..50 {
            let state = graph.update(0.8, 0.1, &mut rng);
            assert!(state.is_bounded());
            assert!(state.is_symmetric());
        }

        let mut fresh = VitalityGraph::new(&small_config(20), &mut rng).unwrap();
        let state = fresh.update(0.8, -1e6, &mut rng);
        assert!(state.is_bounded());
        assert!(state.edge_weights.iter().all(|w| w.is_finite()));

        let state = fresh.update(f64::NAN, 0.1, &mut rng);
        assert!(state.node_states.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_graph_determinism() {
        let run = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut graph = VitalityGraph::new(&small_config(25), &mut rng).unwrap();
            for _ in 0..20 {
                graph.update(0.7, 1.0, &mut rng);
            }
            graph.state().clone()
        };

        assert_eq!(run(42), run(42));
        assert_ne!(run(42), run(43));
    }

    #[test]
    fn test_zero_vitality_decays_nodes() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut graph = VitalityGraph::new(&small_config(10), &mut rng).unwrap();
        for _ in 0..10 {
            graph.update(1.0, 0.0, &mut rng);
        }
        let before = graph.state().node_states.sum();
        graph.update(0.0, 0.0, &mut rng);
        let after = graph.state().node_states.sum();
        assert!((after - 0.9 * before).abs() < 1e-9);
    }

    #[test]
    fn test_influence_step_bounded_and_deterministic() {
        let run = |mode: CouplingMode| {
            let config = NetworkConfig {
                node_count: 40,
                coupling: mode,
                ..Default::default()
            };
            let mut rng = StdRng::seed_from_u64(9);
            let mut net = InfluenceNetwork::new(&config, &mut rng).unwrap();
            for _ in 0..30 {
                let s = net.step(&mut rng);
                assert!(s.iter().all(|v| (0.0..=1.0).contains(v)));
            }
            net.state().clone()
        };

        assert_eq!(run(CouplingMode::Fixed), run(CouplingMode::Fixed));
        assert_eq!(run(CouplingMode::Regenerated), run(CouplingMode::Regenerated));
    }

    #[test]
    fn test_fixed_coupling_is_stable() {
        let config = NetworkConfig {
            node_count: 15,
            coupling: CouplingMode::Fixed,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(11);
        let mut net = InfluenceNetwork::new(&config, &mut rng).unwrap();
        let before = net.coupling().clone();
        net.step(&mut rng);
        assert_eq!(&before, net.coupling());
        assert!(before.iter().all(|&v| v == 0.0 || v == 1.0));
    }

    #[test]
    fn test_network_from_config() {
        let mut rng = StdRng::seed_from_u64(0);
        let config = NetworkConfig {
            model: NetworkModel::Influence,
            node_count: 12,
            ..Default::default()
        };
        let mut network = Network::from_config(&config, &mut rng).unwrap();
        assert!(matches!(network, Network::Influence(_)));
        assert_eq!(network.node_count(), 12);
        network.advance(0.5, 0.5, &mut rng);
    }

    #[test]
    fn test_invalid_probability_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let config = NetworkConfig {
            perturb_probability: 1.5,
            ..Default::default()
        };
        assert!(VitalityGraph::new(&config, &mut rng).is_err());
    }
}
