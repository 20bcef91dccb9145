//! Hebbian learning - covariance weights on the existing graph edges.
//!
//! One real weight per (node, slot) pair, parallel to the topology's
//! adjacency lists. Learning a pattern adds
//!
//! ```text
//! W[n][k] += (ξ_n − a)(ξ_j − a) / (a (1 − a)),   j = adjacency[n][k]
//! ```
//!
//! where `a` is the pattern's activity. Weights are never reset between
//! patterns: the stored memories are superposed.

use sparsenet_core::error::{ConfigError, Result, SparsenetError};
use sparsenet_core::topology::NetworkTopology;
use sparsenet_core::types::Pattern;

/// Weights laid out exactly like the topology's adjacency lists.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightMatrix {
    weights: Vec<Vec<f64>>,
    patterns_learned: usize,
}

impl WeightMatrix {
    /// All-zero weights for every slot of `topology`.
    pub fn zeros(topology: &NetworkTopology) -> Self {
        Self {
            weights: topology
                .adjacency()
                .iter()
                .map(|list| vec![0.0; list.len()])
                .collect(),
            patterns_learned: 0,
        }
    }

    /// Superpose one pattern onto the weights.
    ///
    /// Patterns with activity 0 or 1 have no variance and are rejected.
    pub fn learn(&mut self, topology: &NetworkTopology, pattern: &Pattern) -> Result<()> {
        let n = topology.neurons();
        if pattern.len() != n {
            return Err(SparsenetError::invalid_config(
                "pattern",
                pattern.len(),
                format!("pattern length must equal {n} neurons"),
            ));
        }
        if self.weights.len() != n {
            return Err(SparsenetError::invalid_config(
                "weights",
                self.weights.len(),
                format!("weight matrix was built for a different topology ({n} neurons expected)"),
            ));
        }

        let a = pattern.activity();
        if a <= 0.0 || a >= 1.0 {
            return Err(ConfigError::DegeneratePattern { activity: a }.into());
        }
        let variance = a * (1.0 - a);

        for (node, row) in self.weights.iter_mut().enumerate() {
            let xi_n = pattern.value(node) - a;
            for (w, &j) in row.iter_mut().zip(topology.neighbors(node)) {
                *w += xi_n * (pattern.value(j) - a) / variance;
            }
        }

        self.patterns_learned += 1;
        tracing::debug!(
            activity = a,
            patterns = self.patterns_learned,
            "learned pattern"
        );
        Ok(())
    }

    /// Weights of `node`, one per adjacency slot.
    #[inline]
    pub fn row(&self, node: usize) -> &[f64] {
        &self.weights[node]
    }

    pub fn get(&self, node: usize, slot: usize) -> f64 {
        self.weights[node][slot]
    }

    /// Number of patterns superposed so far.
    pub fn patterns_learned(&self) -> usize {
        self.patterns_learned
    }

    /// Mean absolute weight over all slots.
    pub fn mean_abs(&self) -> f64 {
        let (sum, count) = self
            .weights
            .iter()
            .flatten()
            .fold((0.0, 0usize), |(s, c), w| (s + w.abs(), c + 1));
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sparsenet_core::topology::{NetworkConfig, TopologyKind};

    fn ring(neurons: usize, degree: usize) -> NetworkTopology {
        let config = NetworkConfig {
            neurons,
            degree,
            topology: TopologyKind::Ring,
            ..Default::default()
        };
        NetworkTopology::build(&config, &mut StdRng::seed_from_u64(0)).unwrap()
    }

    #[test]
    fn weights_follow_the_covariance_rule() {
        let top = ring(8, 2);
        let p = Pattern::from_bits(&[1, 1, 0, 0, 0, 0, 0, 0]);
        let mut w = WeightMatrix::zeros(&top);
        w.learn(&top, &p).unwrap();

        let a: f64 = 0.25;
        let var = a * (1.0 - a);
        // Node 0 slots: [1, 7]
        assert!((w.get(0, 0) - (1.0 - a) * (1.0 - a) / var).abs() < 1e-12);
        assert!((w.get(0, 1) - (1.0 - a) * (0.0 - a) / var).abs() < 1e-12);
        // Node 4 slots: [5, 3], both inactive
        assert!((w.get(4, 0) - a * a / var).abs() < 1e-12);
    }

    #[test]
    fn patterns_superpose() {
        let top = ring(8, 2);
        let p = Pattern::from_bits(&[1, 1, 0, 0, 1, 0, 0, 0]);
        let mut once = WeightMatrix::zeros(&top);
        once.learn(&top, &p).unwrap();
        let mut twice = once.clone();
        twice.learn(&top, &p).unwrap();

        assert_eq!(twice.patterns_learned(), 2);
        for node in 0..8 {
            for slot in 0..2 {
                assert!((twice.get(node, slot) - 2.0 * once.get(node, slot)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn degenerate_patterns_are_rejected() {
        let top = ring(6, 2);
        let mut w = WeightMatrix::zeros(&top);
        let silent = Pattern::from_bits(&[0; 6]);
        let saturated = Pattern::from_bits(&[1; 6]);
        assert!(matches!(
            w.learn(&top, &silent),
            Err(SparsenetError::Config(ConfigError::DegeneratePattern { .. }))
        ));
        assert!(w.learn(&top, &saturated).is_err());
        assert_eq!(w.patterns_learned(), 0);
        assert_eq!(w.mean_abs(), 0.0);
    }

    #[test]
    fn ragged_rows_match_adjacency() {
        let top = NetworkTopology::from_adjacency(
            TopologyKind::SquareGrid,
            vec![vec![1, 2], vec![0], vec![0, 1]],
        )
        .unwrap();
        let mut w = WeightMatrix::zeros(&top);
        w.learn(&top, &Pattern::from_bits(&[1, 0, 0])).unwrap();
        assert_eq!(w.row(0).len(), 2);
        assert_eq!(w.row(1).len(), 1);
        assert_eq!(w.row(2).len(), 2);
    }

    #[test]
    fn wrong_length_pattern_is_rejected() {
        let top = ring(6, 2);
        let mut w = WeightMatrix::zeros(&top);
        assert!(w.learn(&top, &Pattern::from_bits(&[1, 0, 1])).is_err());
    }
}
