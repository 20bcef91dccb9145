//! Block-partitioned order parameters.
//!
//! The N nodes are cut into `block_count` contiguous blocks of
//! `N / block_count` nodes (trailing remainder nodes are left out). Inside
//! each block the overlap is the normalized covariance between pattern and
//! state; the macroscopic summary is the mean and standard deviation of the
//! per-block values.

use crate::error::{NumericError, Result, SparsenetError};
use crate::types::{MacroscopicSummary, NetworkState, Pattern, Step};

/// Per-block statistics for one step.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockStatistics {
    pub block_size: usize,
    /// Normalized pattern/state covariance per block (NaN if undefined).
    pub overlap: Vec<f64>,
    /// Pattern activity per block.
    pub pattern_activity: Vec<f64>,
    /// State activity per block.
    pub state_activity: Vec<f64>,
    /// Mean threshold per block.
    pub threshold: Vec<f64>,
    /// Blocks whose pattern or state has zero variance.
    pub degenerate: Vec<usize>,
}

impl BlockStatistics {
    /// Compute per-block statistics. `thresholds` may be empty when only
    /// overlaps are needed; block thresholds are then 0.
    pub fn compute(
        block_count: usize,
        pattern: &Pattern,
        state: &NetworkState,
        thresholds: &[f64],
    ) -> Result<Self> {
        let n = pattern.len();
        if state.len() != n {
            return Err(SparsenetError::invalid_config(
                "state",
                state.len(),
                format!("state length must equal pattern length {n}"),
            ));
        }
        if !thresholds.is_empty() && thresholds.len() != n {
            return Err(SparsenetError::invalid_config(
                "thresholds",
                thresholds.len(),
                format!("threshold vector length must equal {n}"),
            ));
        }
        validate_block_count(block_count, n)?;

        let block_size = n / block_count;
        let size = block_size as f64;
        let units_p = pattern.units();
        let units_s = state.units();

        let mut stats = BlockStatistics {
            block_size,
            overlap: Vec::with_capacity(block_count),
            pattern_activity: Vec::with_capacity(block_count),
            state_activity: Vec::with_capacity(block_count),
            threshold: Vec::with_capacity(block_count),
            degenerate: Vec::new(),
        };

        for b in 0..block_count {
            let range = b * block_size..(b + 1) * block_size;

            let q_p = units_p[range.clone()].iter().filter(|&&u| u).count() as f64 / size;
            let q_s = units_s[range.clone()].iter().filter(|&&u| u).count() as f64 / size;
            let th = if thresholds.is_empty() {
                0.0
            } else {
                thresholds[range.clone()].iter().sum::<f64>() / size
            };

            let var_p = q_p * (1.0 - q_p);
            let var_s = q_s * (1.0 - q_s);
            let overlap = if var_p == 0.0 || var_s == 0.0 {
                stats.degenerate.push(b);
                f64::NAN
            } else {
                let covariance: f64 = range
                    .map(|i| (bit(units_p[i]) - q_p) * (bit(units_s[i]) - q_s))
                    .sum();
                covariance / (size * var_p.sqrt() * var_s.sqrt())
            };

            stats.overlap.push(overlap);
            stats.pattern_activity.push(q_p);
            stats.state_activity.push(q_s);
            stats.threshold.push(th);
        }

        Ok(stats)
    }

    /// Mean and standard deviation across blocks.
    pub fn summarize(&self) -> MacroscopicSummary {
        let (overlap, overlap_std) = aggregate(&self.overlap);
        let (activity, activity_std) = aggregate(&self.state_activity);
        let (threshold, threshold_std) = aggregate(&self.threshold);
        MacroscopicSummary {
            overlap,
            overlap_std,
            activity,
            activity_std,
            threshold,
            threshold_std,
            converged_at: 0,
        }
    }

    /// Fail on the first zero-variance block.
    pub fn require_defined(&self, step: Step) -> Result<()> {
        match self.degenerate.first() {
            Some(&block) => Err(NumericError::DegenerateBlock { block, step }.into()),
            None => Ok(()),
        }
    }
}

/// Raw mesoscopic overlaps over `windows` blocks, without aggregation.
pub fn window_overlaps(
    windows: usize,
    pattern: &Pattern,
    state: &NetworkState,
) -> Result<Vec<f64>> {
    Ok(BlockStatistics::compute(windows, pattern, state, &[])?.overlap)
}

/// Population mean and standard deviation: `sqrt(E[x²] − E[x]²)`.
///
/// Rounding can push the variance slightly below zero; it is clamped to 0.
/// NaN inputs propagate.
pub fn aggregate(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let mean_sq = values.iter().map(|v| v * v).sum::<f64>() / n;
    let variance = mean_sq - mean * mean;
    let variance = if variance < 0.0 { 0.0 } else { variance };
    (mean, variance.sqrt())
}

pub(crate) fn validate_block_count(block_count: usize, neurons: usize) -> Result<()> {
    if block_count == 0 || block_count > neurons {
        return Err(SparsenetError::out_of_range(
            "blocks",
            1.0,
            neurons as f64,
            block_count as f64,
        ));
    }
    Ok(())
}

#[inline]
fn bit(unit: bool) -> f64 {
    if unit {
        1.0
    } else {
        0.0
    }
}
