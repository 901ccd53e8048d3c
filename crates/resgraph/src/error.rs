//! Error types for resource graph construction

use thiserror::Error;

/// Errors raised while building or validating a resource graph
#[derive(Debug, Error)]
pub enum Error {
    /// Two nodes were declared under the same logical name
    #[error("duplicate logical name: {0}")]
    DuplicateNode(String),

    /// A node depends on (or references) a node that is not in the graph
    #[error("{node} depends on unknown resource {dependency}")]
    UnknownDependency { node: String, dependency: String },

    /// Dependencies form a cycle; the listed nodes could not be ordered
    #[error("dependency cycle between: {}", .0.join(", "))]
    Cycle(Vec<String>),

    /// Graph (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, Error>;
