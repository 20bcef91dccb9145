//! Configuration management for the sparsenet CLI.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use sparsenet::prelude::*;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "sparsenet.toml";

/// Experiment configuration (`sparsenet.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkSection,
    #[serde(default)]
    pub learning: LearningSection,
    #[serde(default)]
    pub retrieval: RetrievalSection,
    #[serde(default)]
    pub run: RunSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSection {
    #[serde(default = "default_neurons")]
    pub neurons: usize,
    #[serde(default = "default_degree")]
    pub degree: usize,
    #[serde(default)]
    pub rewiring: f64,
    #[serde(default = "default_topology")]
    pub topology: TopologyKind,
    #[serde(default = "default_side")]
    pub width: usize,
    #[serde(default = "default_side")]
    pub height: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningSection {
    #[serde(default = "default_sparseness")]
    pub sparseness: f64,
    /// Directory of patterns to learn.
    #[serde(default = "default_patterns_dir")]
    pub patterns_dir: PathBuf,
    #[serde(default = "default_one")]
    pub subset_size: usize,
    #[serde(default = "default_one")]
    pub modules: usize,
    #[serde(default = "default_one")]
    pub first_variant: usize,
    #[serde(default = "default_one")]
    pub last_variant: usize,
    #[serde(default)]
    pub random_subsets: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSection {
    /// Directory of initial conditions to test.
    #[serde(default = "default_patterns_dir")]
    pub initial_dir: PathBuf,
    #[serde(default = "default_one")]
    pub blocks: usize,
    #[serde(default = "default_threshold")]
    pub threshold: ThresholdKind,
    /// θ, or `"auto"` for the theta-zero estimate of the sparseness.
    #[serde(default = "default_threshold_value")]
    pub threshold_value: ThresholdValue,
    #[serde(default = "default_rho")]
    pub rho: f64,
    #[serde(default)]
    pub noise: f64,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// Mesoscopic windows in trace output (0 disables).
    #[serde(default)]
    pub x_win: usize,
    #[serde(default = "default_one")]
    pub first_pattern: usize,
    #[serde(default = "default_one")]
    pub last_pattern: usize,
    /// Write per-trial time series.
    #[serde(default)]
    pub trace: bool,
    #[serde(default)]
    pub strict_metrics: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSection {
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

/// A number, or the keyword `auto`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThresholdValue {
    Value(f64),
    Keyword(String),
}

impl ThresholdValue {
    pub fn resolve(&self, sparseness: f64) -> Result<f64> {
        match self {
            ThresholdValue::Value(v) => Ok(*v),
            ThresholdValue::Keyword(k) if k == "auto" => {
                Ok(theta_zero(sparseness).context("cannot derive theta-zero")?)
            }
            ThresholdValue::Keyword(k) => {
                bail!("threshold_value must be a number or \"auto\", got {k:?}")
            }
        }
    }
}

// Default value functions
fn default_neurons() -> usize { 100 }
fn default_degree() -> usize { 10 }
fn default_topology() -> TopologyKind { TopologyKind::Ring }
fn default_side() -> usize { 10 }
fn default_sparseness() -> f64 { 0.3 }
fn default_patterns_dir() -> PathBuf { PathBuf::from("patterns") }
fn default_one() -> usize { 1 }
fn default_threshold() -> ThresholdKind { ThresholdKind::Step }
fn default_threshold_value() -> ThresholdValue { ThresholdValue::Value(0.0) }
fn default_rho() -> f64 { 1.0 }
fn default_max_steps() -> usize { 50 }
fn default_seed() -> u64 { 42 }
fn default_output_dir() -> PathBuf { PathBuf::from("results") }

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            neurons: default_neurons(),
            degree: default_degree(),
            rewiring: 0.0,
            topology: default_topology(),
            width: default_side(),
            height: default_side(),
        }
    }
}

impl Default for LearningSection {
    fn default() -> Self {
        Self {
            sparseness: default_sparseness(),
            patterns_dir: default_patterns_dir(),
            subset_size: default_one(),
            modules: default_one(),
            first_variant: default_one(),
            last_variant: default_one(),
            random_subsets: false,
        }
    }
}

impl Default for RetrievalSection {
    fn default() -> Self {
        Self {
            initial_dir: default_patterns_dir(),
            blocks: default_one(),
            threshold: default_threshold(),
            threshold_value: default_threshold_value(),
            rho: default_rho(),
            noise: 0.0,
            max_steps: default_max_steps(),
            x_win: 0,
            first_pattern: default_one(),
            last_pattern: default_one(),
            trace: false,
            strict_metrics: false,
        }
    }
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            output_dir: default_output_dir(),
        }
    }
}

impl Config {
    /// Load config from sparsenet.toml in the current or parent directories.
    pub fn load() -> Result<Self> {
        match find_config_file() {
            Some(path) => Self::load_from(&path),
            None => Ok(Config::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Save config to the specified path.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    pub fn network_config(&self) -> NetworkConfig {
        let n = &self.network;
        NetworkConfig {
            neurons: n.neurons,
            degree: n.degree,
            rewiring: n.rewiring,
            width: n.width,
            height: n.height,
            topology: n.topology,
        }
    }

    pub fn dynamics_config(&self) -> Result<DynamicsConfig> {
        let r = &self.retrieval;
        let sparseness = self.learning.sparseness;
        Ok(DynamicsConfig {
            max_steps: r.max_steps,
            blocks: r.blocks,
            threshold: r.threshold,
            threshold_value: r.threshold_value.resolve(sparseness)?,
            rho: r.rho,
            sparseness,
            x_win: (r.x_win > 0).then_some(r.x_win),
            strict_metrics: r.strict_metrics,
        })
    }

    /// Full ensemble configuration; traces go under `output_dir/traces`.
    pub fn ensemble_config(&self) -> Result<EnsembleConfig> {
        let l = &self.learning;
        let r = &self.retrieval;
        let config = EnsembleConfig {
            network: self.network_config(),
            dynamics: self.dynamics_config()?,
            noise: r.noise,
            first_pattern: r.first_pattern,
            last_pattern: r.last_pattern,
            first_variant: l.first_variant,
            last_variant: l.last_variant,
            subset_size: l.subset_size,
            modules: l.modules,
            random_subsets: l.random_subsets,
            trace_dir: r.trace.then(|| self.run.output_dir.join("traces")),
        };
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

/// Find sparsenet.toml in current or parent directories.
fn find_config_file() -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_survives_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        Config::default().save(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.network.neurons, 100);
        assert_eq!(loaded.retrieval.threshold, ThresholdKind::Step);
        assert_eq!(loaded.retrieval.threshold_value, ThresholdValue::Value(0.0));
        assert!(loaded.ensemble_config().is_ok());
    }

    #[test]
    fn partial_file_uses_defaults_and_letter_codes() {
        let config: Config = toml::from_str(
            r#"
            [network]
            neurons = 400
            degree = 8
            width = 20
            height = 20
            topology = "l"

            [retrieval]
            threshold = "r"
            threshold_value = "auto"
            rho = 0.7
            x_win = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.network.topology, TopologyKind::SquareGrid);
        assert_eq!(config.learning.sparseness, 0.3);

        let dynamics = config.dynamics_config().unwrap();
        assert_eq!(dynamics.threshold, ThresholdKind::Rho);
        assert!((dynamics.threshold_value - theta_zero(0.3).unwrap()).abs() < 1e-12);
        assert_eq!(dynamics.x_win, Some(4));
    }

    #[test]
    fn bad_keyword_is_rejected() {
        let value = ThresholdValue::Keyword("high".into());
        assert!(value.resolve(0.3).is_err());
    }

    #[test]
    fn invalid_network_fails_validation() {
        let mut config = Config::default();
        config.network.degree = 7;
        assert!(config.ensemble_config().is_err());
    }
}
