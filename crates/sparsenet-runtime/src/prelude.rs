//! Sparsenet Runtime Prelude - convenient imports for common usage.
//!
//! ```rust
//! use sparsenet_runtime::prelude::*;
//! ```

// Re-export learning and dynamics
pub use crate::dynamics::{DynamicsConfig, DynamicsEngine, RetrievalOutcome};
pub use crate::hebbian::WeightMatrix;
pub use crate::network::Network;

// Re-export trace sinks
pub use crate::trace::{
    FileTraceSink, MemoryTraceSink, NullTraceSink, TraceSink, TraceStep, TIME_SERIES_HEADER,
};

// Re-export ensemble driver
pub use crate::ensemble::{
    output_file_name, sample_subset, CsvSummarySink, DirectorySource, Ensemble, EnsembleConfig,
    EnsembleReport, MemorySource, PatternSource, SummarySink, TrialFailure, TrialRecord,
};

// Re-export pattern files
pub use crate::pattern_io::{
    generate_pattern_set, load_pattern_file, pattern_file_name, write_pattern_file,
};

// Re-export analysis
pub use crate::analysis::{analyze, to_graph, TopologyReport};

// Re-export from core
pub use sparsenet_core::prelude::*;
