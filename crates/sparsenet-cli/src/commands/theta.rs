//! Print the theta-zero threshold estimate.

use anyhow::{Context, Result};
use colored::Colorize;
use sparsenet::prelude::*;
use std::path::PathBuf;

use crate::config::Config;

pub fn run(sparseness: Option<f64>, pattern: Option<PathBuf>) -> Result<()> {
    let config = Config::load()?;

    let activity = match pattern {
        Some(path) => {
            let p = load_pattern_file(&path, config.network.neurons)
                .with_context(|| format!("Failed to load pattern {}", path.display()))?;
            println!("  Pattern: {}", path.display());
            p.activity()
        }
        None => sparseness.unwrap_or(config.learning.sparseness),
    };

    let theta = theta_zero(activity)?;
    println!("  Activity: {}", format!("{activity:.6}").cyan());
    println!("  θ₀: {}", format!("{theta:.6}").green().bold());
    Ok(())
}
