//! Initialize a new sparsenet experiment directory.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::{Config, CONFIG_FILE};

pub fn run(path: Option<PathBuf>) -> Result<()> {
    let base_path = match path {
        Some(p) => p,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    println!("{} Initializing sparsenet experiment...", "→".blue());

    std::fs::create_dir_all(&base_path)
        .with_context(|| format!("Failed to create {}", base_path.display()))?;

    let config = Config::default();
    let config_path = base_path.join(CONFIG_FILE);
    if !config_path.exists() {
        config.save(&config_path)?;
        println!("  {} Created {}", "✓".green(), config_path.display());
    } else {
        println!("  {} {} already exists", "•".yellow(), config_path.display());
    }

    let output_dir = base_path.join(&config.run.output_dir);
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    println!("  {} Created {}", "✓".green(), output_dir.display());

    println!();
    println!("{} Experiment initialized!", "✓".green().bold());
    println!();
    println!("Next steps:");
    println!("  {} sparsenet generate --count 10", "1.".blue());
    println!("  {} sparsenet inspect", "2.".blue());
    println!("  {} sparsenet run --noise 0.1", "3.".blue());

    Ok(())
}
