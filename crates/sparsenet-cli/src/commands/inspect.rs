//! Show topology statistics.

use anyhow::Result;
use colored::Colorize;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sparsenet::prelude::*;
use sparsenet::runtime::analysis::{adjacency_listing, adjacency_matrix};

use crate::config::Config;

pub fn run(list: bool, matrix: bool, json: bool, sources: usize, seed: Option<u64>) -> Result<()> {
    let config = Config::load()?;
    let network_config = config.network_config();
    let seed = seed.unwrap_or(config.run.seed);

    let topology = NetworkTopology::build(&network_config, &mut StdRng::seed_from_u64(seed))?;
    let report = analyze(&topology, sources);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "Topology".bold());
    println!("  Kind: {}", topology.kind().to_string().cyan());
    println!("  Neurons: {}", report.neurons.to_string().cyan());
    println!("  Slots: {}", report.slots.to_string().cyan());
    println!(
        "  Degree: {:.2} (min {}, max {})",
        report.mean_degree, report.min_degree, report.max_degree
    );
    println!("  Components: {}", report.components.to_string().cyan());
    println!("  Asymmetric slots: {}", report.asymmetric_slots.to_string().cyan());

    println!();
    println!("{}", "Small-world".bold());
    println!("  Clustering C: {:.4}", report.clustering);
    println!("  Path length L: {:.4}", report.path_length);

    // Compare against the unrewired lattice of the same family.
    if network_config.rewiring > 0.0 {
        let lattice_config = NetworkConfig {
            rewiring: 0.0,
            ..network_config.clone()
        };
        let lattice = NetworkTopology::build(&lattice_config, &mut StdRng::seed_from_u64(seed))?;
        let base = analyze(&lattice, sources);
        println!(
            "  C/C(0): {}",
            format!("{:.4}", report.clustering / base.clustering).green()
        );
        println!(
            "  L/L(0): {}",
            format!("{:.4}", report.path_length / base.path_length).green()
        );
    }

    if list {
        println!();
        print!("{}", adjacency_listing(&topology));
    }
    if matrix {
        println!();
        print!("{}", adjacency_matrix(&topology));
    }

    Ok(())
}
