//! # Sparsenet
//!
//! Sparse, graph-constrained Hopfield networks: store binary patterns with a
//! degree-restricted Hebbian rule and study how well they are retrieved
//! from noisy initial conditions on ring, grid and small-world topologies.
//!
//! ## Quick Start
//!
//! ```rust
//! use sparsenet::prelude::*;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut rng = StdRng::seed_from_u64(42);
//!
//! // Ring of 100 nodes, 10 neighbors each, 10% of slots rewired
//! let config = NetworkConfig {
//!     neurons: 100,
//!     degree: 10,
//!     rewiring: 0.1,
//!     topology: TopologyKind::Ring,
//!     ..Default::default()
//! };
//! let mut network = Network::build(&config, &mut rng).unwrap();
//!
//! // Store one pattern with 30% activity
//! let pattern = random_pattern(100, 0.3, &mut rng).unwrap();
//! network.learn(&pattern).unwrap();
//!
//! // Retrieve it from a 10%-noise initial condition
//! let dynamics = DynamicsConfig {
//!     sparseness: 0.3,
//!     threshold: ThresholdKind::Step,
//!     ..Default::default()
//! };
//! let outcome = network
//!     .retrieve_noisy(&pattern, 0.1, &dynamics, &mut NullTraceSink, &mut rng)
//!     .unwrap();
//!
//! println!(
//!     "m = {:.3} after {} steps (converged: {})",
//!     outcome.summary.overlap, outcome.steps, outcome.converged
//! );
//! ```
//!
//! ## Architecture
//!
//! - [`sparsenet_core`] - Data model, topologies, threshold policies, block metrics
//! - [`sparsenet_runtime`] - Hebbian weights, synchronous dynamics, traces, ensembles
//!
//! ## Key Concepts
//!
//! ### Topologies
//!
//! | Code | Topology | Neighbors |
//! |------|----------|-----------|
//! | `r` | Ring | K/2 on each side of a cyclic index space |
//! | `s` | Symmetric random | K on each side (degree 2K) |
//! | `x` | X-Grid | K/4 per torus diagonal |
//! | `c` | Cross-Grid | K/4 per torus axis direction |
//! | `l` | Square grid | `(2l+1)² − 1` window, clamped at the border |
//!
//! Every slot is rewired to a random non-neighbor with probability ω.
//!
//! ### Threshold policies
//!
//! `linear`, `rho`, `step`, `sine` and `step-cut`, all functions of the
//! local activity of a node's neighborhood (and, for `rho`, of the global
//! activity). `rho` and `sine` relax their threshold during the first
//! [`RELAXATION_STEPS`](sparsenet_core::threshold::RELAXATION_STEPS) steps.
//!
//! ### Convergence
//!
//! After every synchronous step the nodes are cut into contiguous blocks and
//! the per-block overlap and activity are averaged. The run stops when the
//! mean and spread of both repeat exactly.

// Re-export all subcrates
pub use sparsenet_core as core;
pub use sparsenet_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust
/// use sparsenet::prelude::*;
/// ```
pub mod prelude {
    pub use sparsenet_runtime::prelude::*;
}
