//! Dynamics engine - synchronous retrieval from an initial condition.
//!
//! Every step reads one immutable snapshot of the previous state and writes
//! a fresh buffer, so the order in which nodes are visited (or whether they
//! are visited in parallel) never changes the result. After each step the
//! block metrics of the new state are compared with the previous step's; the
//! run stops when overlap and activity statistics repeat exactly, or when
//! the step limit is reached.

use crate::hebbian::WeightMatrix;
use crate::trace::{TraceSink, TraceStep};
use serde::{Deserialize, Serialize};
use sparsenet_core::error::{Result, SparsenetError};
use sparsenet_core::metrics::{window_overlaps, BlockStatistics};
use sparsenet_core::threshold::{ThresholdKind, ThresholdPolicy};
use sparsenet_core::topology::NetworkTopology;
use sparsenet_core::types::{MacroscopicSummary, NetworkState, Pattern, Step};
use tracing::{debug, instrument, warn};

/// Retrieval parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicsConfig {
    /// Upper bound on the number of synchronous steps.
    pub max_steps: usize,
    /// Number of contiguous blocks for the macroscopic statistics.
    pub blocks: usize,
    pub threshold: ThresholdKind,
    /// θ
    pub threshold_value: f64,
    /// ρ
    pub rho: f64,
    /// Expected pattern activity used by the threshold policies.
    pub sparseness: f64,
    /// Mesoscopic window count for traced per-window overlaps.
    pub x_win: Option<usize>,
    /// Fail the trial on the first zero-variance block instead of
    /// reporting NaN.
    pub strict_metrics: bool,
}

impl Default for DynamicsConfig {
    fn default() -> Self {
        Self {
            max_steps: 50,
            blocks: 1,
            threshold: ThresholdKind::Step,
            threshold_value: 0.0,
            rho: 1.0,
            sparseness: 0.3,
            x_win: None,
            strict_metrics: false,
        }
    }
}

impl DynamicsConfig {
    pub fn validate(&self, neurons: usize) -> Result<()> {
        if self.max_steps == 0 {
            return Err(SparsenetError::invalid_config(
                "max_steps",
                self.max_steps,
                "at least one step is required",
            ));
        }
        if self.blocks == 0 || self.blocks > neurons {
            return Err(SparsenetError::out_of_range(
                "blocks",
                1.0,
                neurons as f64,
                self.blocks as f64,
            ));
        }
        if let Some(w) = self.x_win {
            if w == 0 || w > neurons {
                return Err(SparsenetError::out_of_range("x_win", 1.0, neurons as f64, w as f64));
            }
        }
        Ok(())
    }

    pub fn policy(&self) -> Result<ThresholdPolicy> {
        ThresholdPolicy::new(self.threshold, self.threshold_value, self.rho, self.sparseness)
    }
}

/// Result of one retrieval trial.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalOutcome {
    /// Summary of the last step; `converged_at` is that step's index.
    pub summary: MacroscopicSummary,
    /// Whether the run stopped on the convergence test rather than the
    /// step limit.
    pub converged: bool,
    pub final_state: NetworkState,
    /// Per-node thresholds of the last step (0 for frozen nodes).
    pub thresholds: Vec<f64>,
    /// Number of steps executed.
    pub steps: usize,
}

/// Runs retrieval dynamics over a fixed topology and weight matrix.
pub struct DynamicsEngine<'a> {
    topology: &'a NetworkTopology,
    weights: &'a WeightMatrix,
    config: DynamicsConfig,
    policy: ThresholdPolicy,
}

impl<'a> DynamicsEngine<'a> {
    pub fn new(
        topology: &'a NetworkTopology,
        weights: &'a WeightMatrix,
        config: DynamicsConfig,
    ) -> Result<Self> {
        config.validate(topology.neurons())?;
        let policy = config.policy()?;
        Ok(Self {
            topology,
            weights,
            config,
            policy,
        })
    }

    pub fn config(&self) -> &DynamicsConfig {
        &self.config
    }

    /// Iterate from `initial` until convergence or `max_steps`.
    ///
    /// Overlaps are measured against `pattern`. The trace is finished on
    /// every exit, including errors.
    #[instrument(
        skip_all,
        fields(neurons = self.topology.neurons(), threshold = %self.config.threshold)
    )]
    pub fn run(
        &self,
        pattern: &Pattern,
        initial: NetworkState,
        trace: &mut dyn TraceSink,
    ) -> Result<RetrievalOutcome> {
        let outcome = self.iterate(pattern, initial, trace);
        let finished = trace.finish();
        let outcome = outcome?;
        finished?;
        Ok(outcome)
    }

    fn iterate(
        &self,
        pattern: &Pattern,
        initial: NetworkState,
        trace: &mut dyn TraceSink,
    ) -> Result<RetrievalOutcome> {
        let n = self.topology.neurons();
        if pattern.len() != n || initial.len() != n {
            return Err(SparsenetError::invalid_config(
                "state",
                initial.len(),
                format!("pattern and initial state must both have {n} units"),
            ));
        }

        let mut current = initial;
        let mut next = NetworkState::silent(n);
        let mut thresholds = vec![0.0; n];
        let mut baseline = MacroscopicSummary::default();
        let windows = self.config.x_win.filter(|_| trace.wants_windows());

        for step in 0..self.config.max_steps {
            self.step(&current, &mut next, &mut thresholds, step);

            let changed = next.hamming(&current);
            let stats = BlockStatistics::compute(self.config.blocks, pattern, &next, &thresholds)?;
            if !stats.degenerate.is_empty() {
                warn!(step, blocks = ?stats.degenerate, "zero-variance blocks, overlap undefined");
                if self.config.strict_metrics {
                    stats.require_defined(step)?;
                }
            }

            let mut summary = stats.summarize();
            summary.converged_at = step;
            trace.record_step(&TraceStep {
                step,
                summary,
                hamming_percent: 100.0 * changed as f64 / n as f64,
            })?;
            if let Some(w) = windows {
                trace.record_windows(step, &window_overlaps(w, pattern, &next)?)?;
            }

            debug!(
                step,
                m = summary.overlap,
                q = summary.activity,
                changed,
                "step"
            );

            std::mem::swap(&mut current, &mut next);

            let converged = summary.same_order_parameters(&baseline);
            if converged || step + 1 == self.config.max_steps {
                return Ok(RetrievalOutcome {
                    summary,
                    converged,
                    final_state: current,
                    thresholds,
                    steps: step + 1,
                });
            }
            baseline = summary;
        }

        // max_steps >= 1 is validated, so the loop always returns.
        Err(SparsenetError::invalid_config(
            "max_steps",
            self.config.max_steps,
            "at least one step is required",
        ))
    }

    /// One synchronous update of every node from `previous` into `next`.
    fn step(
        &self,
        previous: &NetworkState,
        next: &mut NetworkState,
        thresholds: &mut [f64],
        step: Step,
    ) {
        let global = previous.activity();

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            next.units_mut()
                .par_iter_mut()
                .zip(thresholds.par_iter_mut())
                .enumerate()
                .for_each(|(node, (unit, th))| {
                    (*unit, *th) = self.update_node(node, previous, global, step);
                });
        }

        #[cfg(not(feature = "parallel"))]
        {
            for (node, (unit, th)) in next
                .units_mut()
                .iter_mut()
                .zip(thresholds.iter_mut())
                .enumerate()
            {
                (*unit, *th) = self.update_node(node, previous, global, step);
            }
        }
    }

    /// New state and threshold of `node`. Reads only the snapshot.
    fn update_node(
        &self,
        node: usize,
        previous: &NetworkState,
        global: f64,
        step: Step,
    ) -> (bool, f64) {
        let prev = previous.units();
        let neighbors = self.topology.neighbors(node);
        if neighbors.is_empty() {
            return (prev[node], 0.0);
        }

        let degree = neighbors.len() as f64;
        let local = neighbors.iter().filter(|&&j| prev[j]).count() as f64 / degree;
        if local == 0.0 {
            // Silent neighborhood: frozen for this step.
            return (prev[node], 0.0);
        }

        let threshold = self.policy.compute(local, global, step);
        let spread = (local * (1.0 - local)).sqrt();
        if spread == 0.0 {
            // Saturated neighborhood: the standardized field is undefined
            // and the node switches off.
            return (false, threshold);
        }

        let sum: f64 = self
            .weights
            .row(node)
            .iter()
            .zip(neighbors)
            .map(|(w, &j)| w * (f64::from(u8::from(prev[j])) - local))
            .sum();
        let field = sum / (degree * spread);
        (field - threshold >= 0.0, threshold)
    }
}
