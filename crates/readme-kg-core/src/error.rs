//! Error types for graph construction, scorer setup, and retrieval parameters.
//!
//! Retrieval itself never fails: degenerate queries resolve to a
//! low-confidence answer. Only structural problems detected while building
//! a graph or validating parameters surface as errors.

use thiserror::Error;

/// A knowledge graph could not be constructed.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The graph violates its structural contract (missing bucket key,
    /// wrong JSON-LD field type, non-object document).
    #[error("malformed knowledge graph: {0}")]
    MalformedGraph(String),

    /// A bucket name did not match any of the six known buckets.
    #[error(
        "unknown bucket '{0}'. Must be one of purpose, install, example, features, license, dependencies."
    )]
    UnknownBucket(String),

    /// The JSON-LD text could not be parsed as JSON.
    #[error("invalid JSON-LD: {0}")]
    Json(#[from] serde_json::Error),
}

/// A scoring strategy could not be constructed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScorerError {
    #[error("scoring strategy unavailable: {0}")]
    StrategyUnavailable(&'static str),
}

/// Retrieval parameters failed validation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParamsError {
    #[error("confidence threshold must be in [0.0, 1.0], got {0}")]
    InvalidThreshold(f64),

    #[error("bucket priority must list all six buckets exactly once: {0}")]
    InvalidPriority(String),
}
