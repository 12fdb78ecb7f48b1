// cimeter - Consciousness index meter
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Named components, per-tick component scores and weight sets.
//!
//! Both [`ComponentScores`] and [`WeightSet`] keep insertion order so that
//! contribution breakdowns render in a stable order downstream. Lookups are
//! linear; the component set is small and closed.

use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of components that can feed the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    /// Cross-channel coherence (σ).
    #[serde(alias = "coherence")]
    Sigma,
    /// Resource sustainability.
    #[serde(alias = "sustainability")]
    Vitality,
    /// Light intensity reading.
    Light,
    /// Gamma-band spectral peak ratio.
    Quantum,
    /// Normalized signal entropy.
    Entropy,
    /// Order, 1 - entropy (Ω).
    #[serde(alias = "order")]
    Omega,
    /// Normalized information energy.
    Energy,
    /// Integration proxy (Φ).
    #[serde(alias = "integration")]
    Phi,
    /// External fMRI functional connectivity channel.
    Fmri,
    /// External fNIRS haemoglobin channel.
    Fnirs,
    /// External MEG coherence channel.
    Meg,
}

impl Component {
    /// Every component in canonical order.
    pub const ALL: [Component; 11] = [
        Component::Sigma,
        Component::Vitality,
        Component::Light,
        Component::Quantum,
        Component::Entropy,
        Component::Omega,
        Component::Energy,
        Component::Phi,
        Component::Fmri,
        Component::Fnirs,
        Component::Meg,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Component::Sigma => "sigma",
            Component::Vitality => "vitality",
            Component::Light => "light",
            Component::Quantum => "quantum",
            Component::Entropy => "entropy",
            Component::Omega => "omega",
            Component::Energy => "energy",
            Component::Phi => "phi",
            Component::Fmri => "fmri",
            Component::Fnirs => "fnirs",
            Component::Meg => "meg",
        }
    }

    /// External physiological channels supplied by acquisition.
    pub fn is_external(&self) -> bool {
        matches!(self, Component::Fmri | Component::Fnirs | Component::Meg)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Component {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sigma" | "coherence" => Ok(Component::Sigma),
            "vitality" | "sustainability" | "mu" => Ok(Component::Vitality),
            "light" => Ok(Component::Light),
            "quantum" | "q" => Ok(Component::Quantum),
            "entropy" => Ok(Component::Entropy),
            "omega" | "order" => Ok(Component::Omega),
            "energy" => Ok(Component::Energy),
            "phi" | "psi" | "integration" => Ok(Component::Phi),
            "fmri" => Ok(Component::Fmri),
            "fnirs" => Ok(Component::Fnirs),
            "meg" => Ok(Component::Meg),
            other => Err(IndexError::UnknownComponent(other.to_string())),
        }
    }
}

/// Component scores for one tick, in insertion order.
///
/// Values are normally in [0,1]; nothing here enforces it, the aggregator
/// clips its output instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentScores {
    #[serde(with = "ordered_map")]
    entries: Vec<(Component, f64)>,
}

impl ComponentScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, component: Component, value: f64) -> Self {
        self.set(component, value);
        self
    }

    /// Insert or overwrite a score. Overwrites keep the original position.
    pub fn set(&mut self, component: Component, value: f64) {
        match self.entries.iter_mut().find(|(c, _)| *c == component) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((component, value)),
        }
    }

    pub fn get(&self, component: Component) -> Option<f64> {
        self.entries
            .iter()
            .find(|(c, _)| *c == component)
            .map(|(_, v)| *v)
    }

    pub fn contains(&self, component: Component) -> bool {
        self.get(component).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Component, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(Component, f64)> for ComponentScores {
    fn from_iter<I: IntoIterator<Item = (Component, f64)>>(iter: I) -> Self {
        let mut scores = ComponentScores::new();
        for (component, value) in iter {
            scores.set(component, value);
        }
        scores
    }
}

/// Non-negative weights per component, in insertion order.
///
/// Raw weights need not sum to one; [`WeightSet::normalized`] rescales them
/// before every aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightSet {
    #[serde(with = "ordered_map")]
    entries: Vec<(Component, f64)>,
}

impl Default for WeightSet {
    fn default() -> Self {
        Self::full()
    }
}

impl WeightSet {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Weights for the full multi-sensor path.
    pub fn full() -> Self {
        Self::new()
            .with(Component::Sigma, 0.2)
            .with(Component::Vitality, 0.1)
            .with(Component::Light, 0.15)
            .with(Component::Entropy, 0.15)
            .with(Component::Energy, 0.1)
            .with(Component::Phi, 0.1)
            .with(Component::Fmri, 0.1)
            .with(Component::Fnirs, 0.05)
            .with(Component::Meg, 0.05)
    }

    /// Equal weights over coherence, sustainability, quantum, order and
    /// integration.
    pub fn unified() -> Self {
        Self::new()
            .with(Component::Sigma, 0.2)
            .with(Component::Vitality, 0.2)
            .with(Component::Quantum, 0.2)
            .with(Component::Omega, 0.2)
            .with(Component::Phi, 0.2)
    }

    pub fn with(mut self, component: Component, weight: f64) -> Self {
        self.set(component, weight);
        self
    }

    pub fn set(&mut self, component: Component, weight: f64) {
        match self.entries.iter_mut().find(|(c, _)| *c == component) {
            Some(entry) => entry.1 = weight,
            None => self.entries.push((component, weight)),
        }
    }

    pub fn get(&self, component: Component) -> Option<f64> {
        self.entries
            .iter()
            .find(|(c, _)| *c == component)
            .map(|(_, w)| *w)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Component, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of raw weights.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    /// Reject negative or non-finite weights and empty / zero-sum sets.
    pub fn validate(&self) -> Result<()> {
        for (component, weight) in &self.entries {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(IndexError::InvalidWeight {
                    component: component.to_string(),
                    value: *weight,
                });
            }
        }
        if self.entries.is_empty() || self.total() <= 0.0 {
            return Err(IndexError::EmptyWeights);
        }
        Ok(())
    }

    /// Strict mode: every weighted component must have a score.
    pub fn check_coverage(&self, scores: &ComponentScores) -> Result<()> {
        match self.entries.iter().find(|(c, _)| !scores.contains(*c)) {
            Some((missing, _)) => Err(IndexError::MissingComponent(missing.to_string())),
            None => Ok(()),
        }
    }

    /// Weights rescaled to sum to 1, order preserved.
    pub fn normalized(&self) -> Result<WeightSet> {
        self.validate()?;
        let total = self.total();
        Ok(WeightSet {
            entries: self.entries.iter().map(|(c, w)| (*c, w / total)).collect(),
        })
    }
}

impl FromIterator<(Component, f64)> for WeightSet {
    fn from_iter<I: IntoIterator<Item = (Component, f64)>>(iter: I) -> Self {
        let mut weights = WeightSet::new();
        for (component, weight) in iter {
            weights.set(component, weight);
        }
        weights
    }
}

/// Serializes `(Component, f64)` pairs as a JSON object, keeping document
/// order on the way back in.
mod ordered_map {
    use super::Component;
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(
        entries: &[(Component, f64)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (component, value) in entries {
            map.serialize_entry(component, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(Component, f64)>, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = Vec<(Component, f64)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of component names to numbers")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries: Vec<(Component, f64)> = Vec::new();
                while let Some((component, value)) = access.next_entry::<Component, f64>()? {
                    match entries.iter_mut().find(|(c, _)| *c == component) {
                        Some(entry) => entry.1 = value,
                        None => entries.push((component, value)),
                    }
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}
