//! Sparsenet CLI - Command-line driver for sparse attractor network experiments.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sparsenet")]
#[command(author, version, about = "Sparsenet - Hebbian storage and retrieval on sparse networks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default sparsenet.toml
    Init {
        /// Project directory (default: current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Generate a set of random patterns named <index>_<variant>
    Generate {
        /// Output directory (default: learning.patterns_dir)
        dir: Option<PathBuf>,

        /// Number of pattern indices
        #[arg(short, long, default_value = "10")]
        count: usize,

        /// Variants per index
        #[arg(long, default_value = "1")]
        variants: usize,

        /// Activity of the generated patterns (default: learning.sparseness)
        #[arg(short, long)]
        sparseness: Option<f64>,

        /// Random seed (default: run.seed)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Learn pattern subsets and test retrieval
    Run(commands::run::RunArgs),

    /// Show topology statistics
    Inspect {
        /// Print every adjacency slot
        #[arg(long)]
        list: bool,

        /// Print the dense adjacency matrix
        #[arg(long)]
        matrix: bool,

        /// Print the statistics as JSON
        #[arg(long)]
        json: bool,

        /// BFS sources for the path length estimate
        #[arg(long, default_value = "200")]
        sources: usize,

        /// Random seed (default: run.seed)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print the theta-zero threshold estimate
    Theta {
        /// Pattern activity (default: learning.sparseness)
        sparseness: Option<f64>,

        /// Measure the activity of a pattern file instead
        #[arg(short, long, conflicts_with = "sparseness")]
        pattern: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Init { path } => commands::init::run(path),
        Commands::Generate {
            dir,
            count,
            variants,
            sparseness,
            seed,
        } => commands::generate::run(dir, count, variants, sparseness, seed),
        Commands::Run(args) => commands::run::run(args, cli.verbose),
        Commands::Inspect {
            list,
            matrix,
            json,
            sources,
            seed,
        } => commands::inspect::run(list, matrix, json, sources, seed),
        Commands::Theta { sparseness, pattern } => commands::theta::run(sparseness, pattern),
    }
}
