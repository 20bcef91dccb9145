//! Error types for sparsenet operations.
//!
//! Every failure is fatal to the trial that raised it. The variants carry
//! enough context (node, block, step, path) to find the cause without a
//! debugger.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for sparsenet operations.
pub type Result<T> = std::result::Result<T, SparsenetError>;

/// Errors that can occur while building, training or running a network.
#[derive(Debug, Clone, Error)]
pub enum SparsenetError {
    /// Invalid network, learning or dynamics configuration.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    /// Malformed pattern or initial-condition input.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    /// Numerically undefined statistics.
    #[error("Numeric error: {0}")]
    Numeric(#[from] NumericError),
    /// File open/read/write failure.
    #[error("I/O error on {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Topology code outside the recognized set.
    #[error("unsupported topology: {0:?} (expected one of r, s, x, c, l)")]
    UnsupportedTopology(String),
    /// Threshold code outside the recognized set.
    #[error("unsupported threshold function: {0:?} (expected one of l, r, s, t, c)")]
    UnsupportedThreshold(String),
    /// Degree incompatible with the topology.
    #[error("degree {degree} is invalid for {topology} topology with {neurons} neurons: {reason}")]
    DegreeMismatch {
        topology: String,
        degree: usize,
        neurons: usize,
        reason: String,
    },
    /// Grid dimensions do not cover the network.
    #[error("grid {width}x{height} does not match {neurons} neurons")]
    GridMismatch {
        width: usize,
        height: usize,
        neurons: usize,
    },
    /// Invalid value.
    #[error("invalid value for {field}: {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
    /// Out of range.
    #[error("{field} out of range: {value} (must be {min}-{max})")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },
    /// Pattern with activity 0 or 1 has no variance to normalize by.
    #[error("degenerate pattern activity {activity}: Hebbian normalization needs 0 < a < 1")]
    DegeneratePattern { activity: f64 },
    /// No replacement target is left for a rewired slot.
    #[error("cannot rewire node {node}: degree {degree} leaves no free target among {neurons} neurons")]
    RewiringExhausted {
        node: usize,
        degree: usize,
        neurons: usize,
    },
    /// A generated adjacency list contains its own node.
    #[error("node {node} is connected to itself")]
    SelfLoop { node: usize },
}

/// Pattern parsing errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// Token count differs from the network size.
    #[error("expected {expected} tokens, found {found}")]
    TokenCount { expected: usize, found: usize },
    /// A token other than 0 or 1.
    #[error("non-binary token {token:?} at node {index}")]
    NonBinaryToken { index: usize, token: String },
}

/// Numerically undefined statistics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumericError {
    /// Block whose pattern or state is uniformly 0 or 1.
    #[error("block {block} has zero variance at step {step}; overlap is undefined")]
    DegenerateBlock { block: usize, step: usize },
}

// Convenience constructors
impl SparsenetError {
    pub fn io(path: impl AsRef<Path>, err: std::io::Error) -> Self {
        SparsenetError::Io {
            path: path.as_ref().to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn invalid_config(
        field: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        SparsenetError::Config(ConfigError::InvalidValue {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        })
    }

    pub fn out_of_range(field: impl Into<String>, min: f64, max: f64, value: f64) -> Self {
        SparsenetError::Config(ConfigError::OutOfRange {
            field: field.into(),
            min,
            max,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_names_the_path() {
        let err = SparsenetError::io(
            "patterns/1_6",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        let msg = err.to_string();
        assert!(msg.contains("patterns/1_6"));
        assert!(msg.contains("missing"));
    }

    #[test]
    fn sub_errors_convert_into_top_level() {
        let err: SparsenetError = ParseError::TokenCount { expected: 4, found: 3 }.into();
        assert!(matches!(err, SparsenetError::Parse(_)));
        assert_eq!(err.to_string(), "Parse error: expected 4 tokens, found 3");
    }
}
