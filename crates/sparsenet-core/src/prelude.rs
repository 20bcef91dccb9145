//! Sparsenet Core Prelude - convenient imports for common usage.
//!
//! ```rust
//! use sparsenet_core::prelude::*;
//! ```

// Re-export commonly used types
pub use crate::types::{MacroscopicSummary, NetworkState, Pattern, Step};

pub use crate::topology::{square_grid_side, NetworkConfig, NetworkTopology, TopologyKind};

pub use crate::threshold::{ThresholdKind, ThresholdPolicy, RELAXATION_STEPS};

pub use crate::pattern::{
    apply_noise, format_pattern, parse_pattern, random_pattern, read_pattern, theta_zero,
};

pub use crate::metrics::{aggregate, window_overlaps, BlockStatistics};

// Re-export error types
pub use crate::error::{ConfigError, NumericError, ParseError, Result, SparsenetError};
