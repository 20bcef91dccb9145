//! Generate random pattern sets.

use anyhow::Result;
use colored::Colorize;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sparsenet::prelude::*;
use std::path::PathBuf;

use crate::config::Config;

pub fn run(
    dir: Option<PathBuf>,
    count: usize,
    variants: usize,
    sparseness: Option<f64>,
    seed: Option<u64>,
) -> Result<()> {
    let config = Config::load()?;
    let dir = dir.unwrap_or_else(|| config.learning.patterns_dir.clone());
    let sparseness = sparseness.unwrap_or(config.learning.sparseness);
    let seed = seed.unwrap_or(config.run.seed);
    let network = &config.network;

    println!(
        "{} Generating {} patterns of {} units (a = {})...",
        "→".blue(),
        (count * variants).to_string().cyan(),
        network.neurons,
        sparseness
    );

    let mut rng = StdRng::seed_from_u64(seed);
    let written = generate_pattern_set(
        &dir,
        count,
        variants,
        network.neurons,
        sparseness,
        network.width,
        &mut rng,
    )?;

    println!(
        "{} Wrote {} files to {}",
        "✓".green().bold(),
        written.len().to_string().cyan(),
        dir.display()
    );
    Ok(())
}
