//! # Sparsenet Core
//!
//! Core types for sparse, graph-constrained attractor networks
//! (Hopfield-style associative memories wired on small-world and grid
//! topologies).
//!
//! - **Topology** - ring, symmetric-random, X-grid, cross-grid and
//!   square-grid adjacency, with optional small-world rewiring
//! - **Pattern** - binary patterns and network states, noise, activity
//! - **Threshold** - the five dynamic threshold functions
//! - **Metrics** - block-partitioned overlap and activity statistics
//!
//! ## Quick Start
//!
//! ```rust
//! use sparsenet_core::prelude::*;
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//! let config = NetworkConfig {
//!     neurons: 100,
//!     degree: 10,
//!     topology: TopologyKind::Ring,
//!     ..Default::default()
//! };
//! let topology = NetworkTopology::build(&config, &mut rng).unwrap();
//! assert_eq!(topology.neighbors(0).len(), 10);
//! ```

pub mod error;
pub mod metrics;
pub mod pattern;
pub mod prelude;
pub mod threshold;
pub mod topology;
pub mod types;
