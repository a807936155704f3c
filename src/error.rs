//! Error types for the PPE correctness builder.
//!
//! Fatal errors (`PpeError`) stop a benchmark or the whole run. Row-level
//! problems (`MalformedRow`) are counted and skipped.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PpeError {
    #[error("retrieval failed for benchmark {benchmark}: {source}")]
    Retrieval {
        benchmark: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("benchmark {benchmark}: {what} not found")]
    NotFound { benchmark: String, what: String },

    #[error("could not write dataset to {}: {source}", .path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PpeError {
    pub fn retrieval(
        benchmark: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Retrieval {
            benchmark: benchmark.into(),
            source: source.into(),
        }
    }

    pub fn not_found(benchmark: impl Into<String>, what: impl Into<String>) -> Self {
        Self::NotFound {
            benchmark: benchmark.into(),
            what: what.into(),
        }
    }

    /// Whether the error came from the row source rather than from local output.
    pub fn is_retrieval(&self) -> bool {
        matches!(self, Self::Retrieval { .. } | Self::NotFound { .. })
    }
}

/// A row that cannot be resolved at all. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRow {
    #[error("row is not a JSON object")]
    NotAnObject,

    #[error("missing or invalid field `{0}`")]
    MissingField(&'static str),

    #[error("score at position {0} is not numeric")]
    BadScore(usize),

    #[error("row has no responses")]
    NoResponses,

    #[error("invalid JSON ({0})")]
    InvalidJson(String),
}

pub type Result<T> = std::result::Result<T, PpeError>;
