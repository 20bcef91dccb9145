//! A network instance: one topology and the weights learned on it.

use crate::dynamics::{DynamicsConfig, DynamicsEngine, RetrievalOutcome};
use crate::hebbian::WeightMatrix;
use crate::trace::TraceSink;
use rand::Rng;
use sparsenet_core::error::Result;
use sparsenet_core::pattern::apply_noise;
use sparsenet_core::topology::{NetworkConfig, NetworkTopology};
use sparsenet_core::types::{NetworkState, Pattern};

/// Topology plus superposed Hebbian weights.
#[derive(Debug, Clone)]
pub struct Network {
    topology: NetworkTopology,
    weights: WeightMatrix,
}

impl Network {
    /// Build the topology and start from zero weights.
    pub fn build<R: Rng + ?Sized>(config: &NetworkConfig, rng: &mut R) -> Result<Self> {
        let topology = NetworkTopology::build(config, rng)?;
        Ok(Self::from_topology(topology))
    }

    pub fn from_topology(topology: NetworkTopology) -> Self {
        let weights = WeightMatrix::zeros(&topology);
        Self { topology, weights }
    }

    pub fn topology(&self) -> &NetworkTopology {
        &self.topology
    }

    pub fn weights(&self) -> &WeightMatrix {
        &self.weights
    }

    pub fn neurons(&self) -> usize {
        self.topology.neurons()
    }

    pub fn learn(&mut self, pattern: &Pattern) -> Result<()> {
        self.weights.learn(&self.topology, pattern)
    }

    /// Run retrieval from an explicit initial state.
    pub fn retrieve(
        &self,
        pattern: &Pattern,
        initial: NetworkState,
        dynamics: &DynamicsConfig,
        trace: &mut dyn TraceSink,
    ) -> Result<RetrievalOutcome> {
        DynamicsEngine::new(&self.topology, &self.weights, dynamics.clone())?.run(
            pattern,
            initial,
            trace,
        )
    }

    /// Corrupt `pattern` with `noise` and run retrieval from the result.
    pub fn retrieve_noisy<R: Rng + ?Sized>(
        &self,
        pattern: &Pattern,
        noise: f64,
        dynamics: &DynamicsConfig,
        trace: &mut dyn TraceSink,
        rng: &mut R,
    ) -> Result<RetrievalOutcome> {
        let initial = apply_noise(pattern, noise, rng)?;
        self.retrieve(pattern, initial, dynamics, trace)
    }
}
