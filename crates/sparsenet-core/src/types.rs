//! Shared types used across the network engine.

use serde::{Deserialize, Serialize};

/// Discrete time step of the synchronous dynamics.
pub type Step = usize;

/// A binary vector of length N: a pattern to learn or an initial condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern(Vec<bool>);

impl Pattern {
    pub fn new(units: Vec<bool>) -> Self {
        Self(units)
    }

    /// Build from 0/1 integers; anything non-zero is active.
    pub fn from_bits(bits: &[u8]) -> Self {
        Self(bits.iter().map(|&b| b != 0).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn units(&self) -> &[bool] {
        &self.0
    }

    /// Unit `i` as 0.0/1.0.
    #[inline]
    pub fn value(&self, i: usize) -> f64 {
        if self.0[i] {
            1.0
        } else {
            0.0
        }
    }

    /// Fraction of active units (the pattern's sparseness).
    pub fn activity(&self) -> f64 {
        mean(&self.0)
    }
}

/// The live network state `V_t`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkState(Vec<bool>);

impl NetworkState {
    pub fn new(units: Vec<bool>) -> Self {
        Self(units)
    }

    /// All units inactive.
    pub fn silent(n: usize) -> Self {
        Self(vec![false; n])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn units(&self) -> &[bool] {
        &self.0
    }

    pub fn units_mut(&mut self) -> &mut [bool] {
        &mut self.0
    }

    pub fn activity(&self) -> f64 {
        mean(&self.0)
    }

    /// Number of units that differ from `other`.
    pub fn hamming(&self, other: &NetworkState) -> usize {
        self.0
            .iter()
            .zip(&other.0)
            .filter(|(a, b)| a != b)
            .count()
    }

    /// Freeze this state as a pattern, e.g. to write the retrieved state to disk.
    pub fn to_pattern(&self) -> Pattern {
        Pattern(self.0.clone())
    }
}

impl From<&Pattern> for NetworkState {
    fn from(pattern: &Pattern) -> Self {
        Self(pattern.0.clone())
    }
}

/// Macroscopic order parameters of one step (and the per-trial output record).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MacroscopicSummary {
    /// Mean block overlap between pattern and state.
    pub overlap: f64,
    /// Standard deviation of block overlaps.
    pub overlap_std: f64,
    /// Mean block activity of the state.
    pub activity: f64,
    pub activity_std: f64,
    /// Mean block threshold.
    pub threshold: f64,
    pub threshold_std: f64,
    /// Step at which the run stopped (converged or hit the step limit).
    pub converged_at: Step,
}

impl MacroscopicSummary {
    /// Stopping criterion: `m`, `d`, `q_m` and `q_d` all exactly equal.
    ///
    /// Thresholds and the step index are ignored. NaN never compares equal,
    /// so a degenerate summary never signals convergence.
    pub fn same_order_parameters(&self, other: &MacroscopicSummary) -> bool {
        self.overlap == other.overlap
            && self.overlap_std == other.overlap_std
            && self.activity == other.activity
            && self.activity_std == other.activity_std
    }
}

pub(crate) fn mean(units: &[bool]) -> f64 {
    if units.is_empty() {
        return 0.0;
    }
    units.iter().filter(|&&u| u).count() as f64 / units.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_is_fraction_of_ones() {
        let p = Pattern::from_bits(&[1, 0, 0, 1, 0]);
        assert!((p.activity() - 0.4).abs() < 1e-12);
        assert_eq!(p.value(0), 1.0);
        assert_eq!(p.value(1), 0.0);
    }

    #[test]
    fn identical_summaries_signal_convergence() {
        let a = MacroscopicSummary {
            overlap: 0.9,
            overlap_std: 0.01,
            activity: 0.3,
            activity_std: 0.02,
            threshold: 0.1,
            threshold_std: 0.0,
            converged_at: 3,
        };
        let mut b = a;
        b.threshold = 0.7;
        b.converged_at = 4;
        assert!(a.same_order_parameters(&b));
    }

    #[test]
    fn any_order_parameter_difference_breaks_convergence() {
        let a = MacroscopicSummary {
            overlap: 0.9,
            overlap_std: 0.01,
            activity: 0.3,
            activity_std: 0.02,
            ..Default::default()
        };
        for i in 0..4 {
            let mut b = a;
            match i {
                0 => b.overlap += 1e-9,
                1 => b.overlap_std += 1e-9,
                2 => b.activity += 1e-9,
                _ => b.activity_std += 1e-9,
            }
            assert!(!a.same_order_parameters(&b), "field {i} should break equality");
        }
    }

    #[test]
    fn nan_summary_never_converges() {
        let a = MacroscopicSummary {
            overlap: f64::NAN,
            ..Default::default()
        };
        assert!(!a.same_order_parameters(&a));
    }

    #[test]
    fn hamming_counts_changed_units() {
        let a = NetworkState::new(vec![true, false, true, false]);
        let b = NetworkState::new(vec![true, true, false, false]);
        assert_eq!(a.hamming(&b), 2);
    }
}
