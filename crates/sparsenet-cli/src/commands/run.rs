//! Run an ensemble: learn pattern subsets, test retrieval, write summaries.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sparsenet::prelude::*;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use crate::config::Config;

/// Overrides for the `[retrieval]`, `[network]` and `[run]` sections.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Directory of patterns to learn
    #[arg(long)]
    pub learn: Option<PathBuf>,

    /// Directory of initial conditions to test
    #[arg(long)]
    pub test: Option<PathBuf>,

    /// Noise applied to every initial condition
    #[arg(short, long)]
    pub noise: Option<f64>,

    /// Threshold policy (l, r, s, t, c)
    #[arg(short = 'T', long)]
    pub threshold: Option<ThresholdKind>,

    /// Threshold value θ
    #[arg(short = 't', long)]
    pub theta: Option<f64>,

    /// Topology (r, s, x, c, l)
    #[arg(long)]
    pub topology: Option<TopologyKind>,

    /// Rewiring probability ω
    #[arg(short = 'w', long)]
    pub rewiring: Option<f64>,

    /// Random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write per-trial time series
    #[arg(long)]
    pub trace: bool,

    /// Summary file (default: parameter-encoded name in run.output_dir)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl RunArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.learn {
            config.learning.patterns_dir = dir.clone();
        }
        if let Some(dir) = &self.test {
            config.retrieval.initial_dir = dir.clone();
        }
        if let Some(noise) = self.noise {
            config.retrieval.noise = noise;
        }
        if let Some(kind) = self.threshold {
            config.retrieval.threshold = kind;
        }
        if let Some(theta) = self.theta {
            config.retrieval.threshold_value = crate::config::ThresholdValue::Value(theta);
        }
        if let Some(kind) = self.topology {
            config.network.topology = kind;
        }
        if let Some(w) = self.rewiring {
            config.network.rewiring = w;
        }
        if let Some(seed) = self.seed {
            config.run.seed = seed;
        }
        if self.trace {
            config.retrieval.trace = true;
        }
    }
}

/// Summary sink that also advances a progress bar.
struct ProgressSink {
    inner: CsvSummarySink<BufWriter<File>>,
    bar: ProgressBar,
    verbose: bool,
}

impl SummarySink for ProgressSink {
    fn record(&mut self, record: &TrialRecord) -> sparsenet::core::error::Result<()> {
        self.inner.record(record)?;
        if self.verbose {
            self.bar.println(format!(
                "  module {} pattern {}_{}: m = {:.4} at step {}",
                record.module,
                record.trial_index,
                record.variant,
                record.overlap,
                record.converged_step
            ));
        }
        self.bar.inc(1);
        Ok(())
    }

    fn finish(&mut self) -> sparsenet::core::error::Result<()> {
        self.bar.finish_with_message("done");
        self.inner.finish()
    }
}

pub fn run(args: RunArgs, verbose: bool) -> Result<()> {
    let mut config = Config::load()?;
    args.apply(&mut config);

    let learn_dir = config.learning.patterns_dir.clone();
    let test_dir = config.retrieval.initial_dir.clone();
    for dir in [&learn_dir, &test_dir] {
        if !dir.is_dir() {
            bail!(
                "Pattern directory not found: {}. Create one with {}.",
                dir.display(),
                "sparsenet generate".cyan()
            );
        }
    }

    let ensemble_config = config.ensemble_config()?;
    let ensemble = Ensemble::new(ensemble_config)?;

    let output = match args.output {
        Some(path) => path,
        None => {
            let tag = test_dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "patterns".to_string());
            config
                .run
                .output_dir
                .join(output_file_name(ensemble.config(), &tag))
        }
    };
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let net = &ensemble.config().network;
    let dynamics = &ensemble.config().dynamics;
    println!(
        "{} {} network: N={}, K={}, ω={}",
        "→".blue(),
        net.topology.to_string().cyan(),
        net.neurons,
        net.degree,
        net.rewiring
    );
    println!(
        "  {} threshold θ={:.4}, ρ={}, noise={}, seed={}",
        dynamics.threshold.to_string().cyan(),
        dynamics.threshold_value,
        dynamics.rho,
        ensemble.config().noise,
        config.run.seed
    );
    println!(
        "{} Running {} trials over {} module(s)...",
        "→".blue(),
        ensemble.trial_count().to_string().cyan(),
        ensemble.config().modules
    );

    let bar = ProgressBar::new(ensemble.trial_count() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} trials")?
            .progress_chars("#>-"),
    );
    let mut sink = ProgressSink {
        inner: CsvSummarySink::create(&output)?,
        bar,
        verbose,
    };

    tracing::info!(
        output = %output.display(),
        learn = %learn_dir.display(),
        test = %test_dir.display(),
        "starting ensemble"
    );
    let mut rng = StdRng::seed_from_u64(config.run.seed);
    let report = ensemble.run(
        &DirectorySource::new(&learn_dir),
        &DirectorySource::new(&test_dir),
        &mut sink,
        &mut rng,
    )?;

    println!();
    println!("{} Ensemble complete!", "✓".green().bold());
    println!("  Patterns learned: {}", report.patterns_learned.to_string().cyan());
    println!(
        "  Trials: {} ({} converged)",
        report.trials.to_string().cyan(),
        report.converged.to_string().green()
    );
    if report.failed() > 0 {
        println!("  Failed: {}", report.failed().to_string().red());
        for failure in report.failures.iter().take(5) {
            println!(
                "    {} {}_{}: {}",
                "✗".red(),
                failure.trial_index,
                failure.variant,
                failure.error
            );
        }
    }
    println!("  Mean overlap: {}", format!("{:.4}", report.mean_overlap).cyan());
    println!("  Summary: {}", output.display());
    if let Some(dir) = &ensemble.config().trace_dir {
        println!("  Traces: {}", dir.display());
    }

    Ok(())
}
