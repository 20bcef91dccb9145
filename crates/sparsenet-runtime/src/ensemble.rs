//! Ensemble runner - learn pattern subsets on independent networks and
//! test retrieval from noisy initial conditions.
//!
//! For each module `m` a fresh topology is built and learns patterns
//! `m·subset_size + 1 ..= (m + 1)·subset_size` (every variant). Every test
//! pattern in `first_pattern..=last_pattern` (every variant) is then
//! corrupted with noise and run through the dynamics. One [`TrialRecord`]
//! per test goes to a [`SummarySink`]. A failing trial is logged and
//! recorded in the report; the ensemble moves on.

use crate::dynamics::DynamicsConfig;
use crate::network::Network;
use crate::pattern_io::{load_pattern_file, pattern_file_name};
use crate::trace::{FileTraceSink, NullTraceSink, TraceSink};
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sparsenet_core::error::{Result, SparsenetError};
use sparsenet_core::topology::NetworkConfig;
use sparsenet_core::types::{Pattern, Step};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

// ── Pattern sources ──────────────────────────────────────────────────

/// Supplies patterns by `(index, variant)`.
pub trait PatternSource {
    fn load(&self, index: usize, variant: usize, neurons: usize) -> Result<Pattern>;

    /// Human-readable location, for logs.
    fn describe(&self, index: usize, variant: usize) -> String {
        pattern_file_name(index, variant)
    }
}

/// Pattern files named `<index>_<variant>` inside one directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, index: usize, variant: usize) -> PathBuf {
        self.dir.join(pattern_file_name(index, variant))
    }
}

impl PatternSource for DirectorySource {
    fn load(&self, index: usize, variant: usize, neurons: usize) -> Result<Pattern> {
        load_pattern_file(&self.path(index, variant), neurons)
    }

    fn describe(&self, index: usize, variant: usize) -> String {
        self.path(index, variant).display().to_string()
    }
}

/// Patterns held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    patterns: HashMap<(usize, usize), Pattern>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: usize, variant: usize, pattern: Pattern) {
        self.patterns.insert((index, variant), pattern);
    }
}

impl PatternSource for MemorySource {
    fn load(&self, index: usize, variant: usize, neurons: usize) -> Result<Pattern> {
        let pattern = self.patterns.get(&(index, variant)).ok_or_else(|| {
            SparsenetError::invalid_config(
                "pattern",
                pattern_file_name(index, variant),
                "no such pattern in memory source",
            )
        })?;
        if pattern.len() != neurons {
            return Err(SparsenetError::invalid_config(
                "pattern",
                pattern.len(),
                format!("pattern length must equal {neurons} neurons"),
            ));
        }
        Ok(pattern.clone())
    }
}

// ── Summary sinks ────────────────────────────────────────────────────

/// Outcome of one retrieval trial.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialRecord {
    pub module: usize,
    pub trial_index: usize,
    pub variant: usize,
    /// Final mean overlap `m`.
    pub overlap: f64,
    pub converged_step: Step,
    pub converged: bool,
}

/// Receives one record per completed trial.
pub trait SummarySink {
    fn record(&mut self, record: &TrialRecord) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl SummarySink for Vec<TrialRecord> {
    fn record(&mut self, record: &TrialRecord) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// Writes `trialIndex, overlap, convergedStep` lines.
pub struct CsvSummarySink<W: Write> {
    writer: W,
    label: PathBuf,
}

impl CsvSummarySink<BufWriter<File>> {
    /// Create (truncate) the summary file at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| SparsenetError::io(path, e))?;
        Ok(Self {
            writer: BufWriter::new(file),
            label: path.to_path_buf(),
        })
    }
}

impl<W: Write> CsvSummarySink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            label: PathBuf::from("<summary>"),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> SummarySink for CsvSummarySink<W> {
    fn record(&mut self, record: &TrialRecord) -> Result<()> {
        writeln!(
            self.writer,
            "{}, {:.6}, {}",
            record.trial_index, record.overlap, record.converged_step
        )
        .map_err(|e| SparsenetError::io(&self.label, e))
    }

    fn finish(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| SparsenetError::io(&self.label, e))
    }
}

// ── Configuration ────────────────────────────────────────────────────

/// Everything an ensemble run needs besides the pattern sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleConfig {
    pub network: NetworkConfig,
    pub dynamics: DynamicsConfig,
    /// Probability of resampling each unit of the initial condition.
    pub noise: f64,
    /// First and last test pattern index.
    pub first_pattern: usize,
    pub last_pattern: usize,
    /// Inclusive variant range used for both learning and testing.
    pub first_variant: usize,
    pub last_variant: usize,
    /// Patterns learned per module.
    pub subset_size: usize,
    /// Independent networks.
    pub modules: usize,
    /// Draw each module's learning subset at random instead of contiguously.
    pub random_subsets: bool,
    /// Write per-trial trace files here when set.
    pub trace_dir: Option<PathBuf>,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            dynamics: DynamicsConfig::default(),
            noise: 0.0,
            first_pattern: 1,
            last_pattern: 1,
            first_variant: 1,
            last_variant: 1,
            subset_size: 1,
            modules: 1,
            random_subsets: false,
            trace_dir: None,
        }
    }
}

impl EnsembleConfig {
    pub fn validate(&self) -> Result<()> {
        self.network.validate()?;
        self.dynamics.validate(self.network.neurons)?;
        if !(0.0..=1.0).contains(&self.noise) {
            return Err(SparsenetError::out_of_range("noise", 0.0, 1.0, self.noise));
        }
        if self.first_pattern == 0 || self.first_pattern > self.last_pattern {
            return Err(SparsenetError::invalid_config(
                "first_pattern",
                self.first_pattern,
                format!("must be in 1..={}", self.last_pattern),
            ));
        }
        if self.first_variant > self.last_variant {
            return Err(SparsenetError::invalid_config(
                "first_variant",
                self.first_variant,
                format!("must not exceed last_variant {}", self.last_variant),
            ));
        }
        if self.subset_size == 0 || self.modules == 0 {
            return Err(SparsenetError::invalid_config(
                "subset_size",
                self.subset_size,
                "subset_size and modules must both be at least 1",
            ));
        }
        if self.random_subsets && self.subset_size > self.last_pattern {
            return Err(SparsenetError::invalid_config(
                "subset_size",
                self.subset_size,
                format!("cannot draw more than {} distinct patterns", self.last_pattern),
            ));
        }
        Ok(())
    }

    fn variants(&self) -> std::ops::RangeInclusive<usize> {
        self.first_variant..=self.last_variant
    }

    /// Number of retrieval trials over the whole ensemble.
    pub fn trial_count(&self) -> usize {
        self.modules
            * (self.last_pattern + 1 - self.first_pattern)
            * (self.last_variant + 1 - self.first_variant)
    }
}

/// Parameter-encoded output file name.
///
/// `tag` is appended before the extension (the original scheme used the last
/// component of the test-pattern directory).
pub fn output_file_name(config: &EnsembleConfig, tag: &str) -> String {
    let net = &config.network;
    let dyn_ = &config.dynamics;
    format!(
        "N{}K{}w{}a{}b{}T{}t{}rho{}np{}time{}p{}P{}pi{}x{}w{}h{}TY{}SNS{}NN{}PW{}.txt",
        net.neurons,
        net.degree,
        net.rewiring,
        dyn_.sparseness,
        dyn_.blocks,
        dyn_.threshold.code(),
        dyn_.threshold_value,
        dyn_.rho,
        config.noise,
        dyn_.max_steps,
        config.first_pattern,
        config.last_pattern,
        config.last_variant,
        dyn_.x_win.unwrap_or(0),
        net.width,
        net.height,
        net.topology.code(),
        config.subset_size,
        config.modules,
        tag
    )
}

/// `set_size` distinct indices from `1..=total`, uniformly without
/// replacement, in ascending order.
pub fn sample_subset<R: Rng + ?Sized>(
    set_size: usize,
    total: usize,
    rng: &mut R,
) -> Result<Vec<usize>> {
    if set_size > total {
        return Err(SparsenetError::invalid_config(
            "set_size",
            set_size,
            format!("cannot draw more than {total} distinct indices"),
        ));
    }
    let mut picked: Vec<usize> = index::sample(rng, total, set_size)
        .into_iter()
        .map(|i| i + 1)
        .collect();
    picked.sort_unstable();
    Ok(picked)
}

// ── Runner ───────────────────────────────────────────────────────────

/// A trial that failed and was skipped.
#[derive(Debug, Clone)]
pub struct TrialFailure {
    pub module: usize,
    pub trial_index: usize,
    pub variant: usize,
    pub error: SparsenetError,
}

/// Totals for a finished ensemble.
#[derive(Debug, Clone, Default)]
pub struct EnsembleReport {
    pub modules: usize,
    pub patterns_learned: usize,
    pub trials: usize,
    pub converged: usize,
    /// Mean final overlap over completed trials with a defined overlap.
    pub mean_overlap: f64,
    pub failures: Vec<TrialFailure>,
}

impl EnsembleReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

pub struct Ensemble {
    config: EnsembleConfig,
}

impl Ensemble {
    pub fn new(config: EnsembleConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    pub fn trial_count(&self) -> usize {
        self.config.trial_count()
    }

    /// Run every module. Learning failures abort the run; trial failures
    /// are skipped and reported.
    #[instrument(skip_all, fields(modules = self.config.modules, trials = self.trial_count()))]
    pub fn run<R: Rng + ?Sized>(
        &self,
        learn: &dyn PatternSource,
        test: &dyn PatternSource,
        sink: &mut dyn SummarySink,
        rng: &mut R,
    ) -> Result<EnsembleReport> {
        let mut report = EnsembleReport {
            modules: self.config.modules,
            ..Default::default()
        };
        let mut overlap_sum = 0.0;
        let mut overlap_count = 0usize;

        if let Some(dir) = &self.config.trace_dir {
            std::fs::create_dir_all(dir).map_err(|e| SparsenetError::io(dir, e))?;
        }

        for module in 0..self.config.modules {
            let network = self.train_module(module, learn, rng)?;
            report.patterns_learned += network.weights().patterns_learned();

            for trial_index in self.config.first_pattern..=self.config.last_pattern {
                for variant in self.config.variants() {
                    match self.run_trial(&network, module, trial_index, variant, test, rng) {
                        Ok(record) => {
                            sink.record(&record)?;
                            report.trials += 1;
                            if record.converged {
                                report.converged += 1;
                            }
                            if !record.overlap.is_nan() {
                                overlap_sum += record.overlap;
                                overlap_count += 1;
                            }
                        }
                        Err(error) => {
                            warn!(
                                module,
                                trial_index,
                                variant,
                                source = %test.describe(trial_index, variant),
                                %error,
                                "trial failed, skipping"
                            );
                            report.failures.push(TrialFailure {
                                module,
                                trial_index,
                                variant,
                                error,
                            });
                        }
                    }
                }
            }
        }

        sink.finish()?;
        report.mean_overlap = if overlap_count == 0 {
            f64::NAN
        } else {
            overlap_sum / overlap_count as f64
        };
        info!(
            trials = report.trials,
            failed = report.failed(),
            converged = report.converged,
            mean_overlap = report.mean_overlap,
            "ensemble complete"
        );
        Ok(report)
    }

    /// Build module `module`'s network and learn its pattern subset.
    pub fn train_module<R: Rng + ?Sized>(
        &self,
        module: usize,
        learn: &dyn PatternSource,
        rng: &mut R,
    ) -> Result<Network> {
        let mut network = Network::build(&self.config.network, rng)?;
        let indices: Vec<usize> = if self.config.random_subsets {
            sample_subset(self.config.subset_size, self.config.last_pattern, rng)?
        } else {
            let start = module * self.config.subset_size + 1;
            (start..start + self.config.subset_size).collect()
        };

        for &index in &indices {
            for variant in self.config.variants() {
                let pattern = learn.load(index, variant, network.neurons())?;
                network.learn(&pattern)?;
            }
        }
        info!(
            module,
            patterns = network.weights().patterns_learned(),
            mean_abs_weight = network.weights().mean_abs(),
            "module trained"
        );
        Ok(network)
    }

    fn run_trial<R: Rng + ?Sized>(
        &self,
        network: &Network,
        module: usize,
        trial_index: usize,
        variant: usize,
        test: &dyn PatternSource,
        rng: &mut R,
    ) -> Result<TrialRecord> {
        let pattern = test.load(trial_index, variant, network.neurons())?;

        let mut trace: Box<dyn TraceSink> = match &self.config.trace_dir {
            Some(dir) => Box::new(FileTraceSink::create(
                dir,
                &format!("{module}_{trial_index}_{variant}.txt"),
                self.config.dynamics.x_win.is_some(),
            )?),
            None => Box::new(NullTraceSink),
        };

        let outcome = network.retrieve_noisy(
            &pattern,
            self.config.noise,
            &self.config.dynamics,
            trace.as_mut(),
            rng,
        )?;

        Ok(TrialRecord {
            module,
            trial_index,
            variant,
            overlap: outcome.summary.overlap,
            converged_step: outcome.summary.converged_at,
            converged: outcome.converged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn sample_subset_draws_distinct_sorted_indices() {
        let mut rng = StdRng::seed_from_u64(3);
        let s = sample_subset(5, 20, &mut rng).unwrap();
        assert_eq!(s.len(), 5);
        assert!(s.windows(2).all(|w| w[0] < w[1]));
        assert!(s.iter().all(|&i| (1..=20).contains(&i)));
        assert_eq!(sample_subset(4, 4, &mut rng).unwrap(), vec![1, 2, 3, 4]);
        assert!(sample_subset(5, 4, &mut rng).is_err());
    }

    #[test]
    fn output_file_name_encodes_parameters() {
        let config = EnsembleConfig {
            noise: 0.1,
            last_pattern: 10,
            ..Default::default()
        };
        let name = output_file_name(&config, "latent");
        assert_eq!(
            name,
            "N100K10w0a0.3b1Tst0rho1np0.1time50p1P10pi1x0w10h10TYrSNS1NN1PWlatent.txt"
        );
    }

    #[test]
    fn csv_sink_writes_index_overlap_step() {
        let mut sink = CsvSummarySink::new(Vec::new());
        sink.record(&TrialRecord {
            module: 0,
            trial_index: 3,
            variant: 1,
            overlap: 0.5,
            converged_step: 7,
            converged: true,
        })
        .unwrap();
        sink.finish().unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "3, 0.500000, 7\n");
    }

    #[test]
    fn config_validation_catches_bad_ranges() {
        let bad_noise = EnsembleConfig {
            noise: 2.0,
            ..Default::default()
        };
        assert!(bad_noise.validate().is_err());

        let bad_patterns = EnsembleConfig {
            first_pattern: 3,
            last_pattern: 2,
            ..Default::default()
        };
        assert!(bad_patterns.validate().is_err());

        let bad_subset = EnsembleConfig {
            subset_size: 0,
            ..Default::default()
        };
        assert!(bad_subset.validate().is_err());

        assert!(EnsembleConfig::default().validate().is_ok());
    }

    #[test]
    fn trial_count_multiplies_modules_patterns_variants() {
        let config = EnsembleConfig {
            modules: 2,
            first_pattern: 1,
            last_pattern: 5,
            first_variant: 6,
            last_variant: 7,
            ..Default::default()
        };
        assert_eq!(config.trial_count(), 20);
    }

    #[test]
    fn memory_source_rejects_missing_and_wrong_length() {
        let mut src = MemorySource::new();
        src.insert(1, 1, Pattern::from_bits(&[1, 0, 0, 1]));
        assert!(src.load(1, 1, 4).is_ok());
        assert!(src.load(2, 1, 4).is_err());
        assert!(src.load(1, 1, 5).is_err());
    }
}
