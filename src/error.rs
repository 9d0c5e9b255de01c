//! Error taxonomy for the roast pipeline

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Loading,
    Chunking,
    Embedding,
    Indexing,
    Retrieving,
    Generating,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Loading => "loading",
            Stage::Chunking => "chunking",
            Stage::Embedding => "embedding",
            Stage::Indexing => "indexing",
            Stage::Retrieving => "retrieving",
            Stage::Generating => "generating",
        };
        f.write_str(name)
    }
}

/// Pipeline errors
#[derive(Debug, Error)]
pub enum Error {
    /// Document could not be fetched (missing or forbidden object)
    #[error("Document unavailable: {0}")]
    DocumentUnavailable(String),

    /// Document bytes are not a parseable format
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// Document parsed but contains no extractable text
    #[error("Document contains no extractable text")]
    EmptyDocument,

    /// Fetch or extraction exceeded the loader's size or time limit
    #[error("Document loading limit exceeded: {0}")]
    LoaderTimeout(String),

    /// Embedding endpoint fault after retries were exhausted
    #[error("Embedding endpoint error: {0}")]
    EmbeddingEndpoint(String),

    /// Embedding call exceeded its time budget
    #[error("Embedding request timed out after {0} ms")]
    EmbeddingTimeout(u64),

    /// Generation endpoint fault
    #[error("Generation endpoint error: {0}")]
    GenerationEndpoint(String),

    /// Generation call exceeded its time budget
    #[error("Generation request timed out after {0} ms")]
    GenerationTimeout(u64),

    /// Remaining wall-clock budget is insufficient for the next stage
    #[error("Time budget exceeded before {stage}: {remaining_ms} ms left, stage needs {required_ms} ms")]
    BudgetExceeded {
        stage: Stage,
        remaining_ms: u64,
        required_ms: u64,
    },

    /// Internal invariant broken (e.g. vector dimension mismatch); never retried
    #[error("Internal invariant violation: {0}")]
    InvariantViolation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error from scratch storage
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stable machine-readable error kind for the response boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DocumentUnavailable,
    UnsupportedFormat,
    EmptyDocument,
    LoaderTimeout,
    EmbeddingEndpointError,
    EmbeddingTimeout,
    GenerationEndpointError,
    GenerationTimeout,
    BudgetExceeded,
    InternalInvariantViolation,
    ConfigError,
    IoError,
}

impl Error {
    /// Map to the stable kind exposed to callers
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::DocumentUnavailable(_) => ErrorKind::DocumentUnavailable,
            Error::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Error::EmptyDocument => ErrorKind::EmptyDocument,
            Error::LoaderTimeout(_) => ErrorKind::LoaderTimeout,
            Error::EmbeddingEndpoint(_) => ErrorKind::EmbeddingEndpointError,
            Error::EmbeddingTimeout(_) => ErrorKind::EmbeddingTimeout,
            Error::GenerationEndpoint(_) => ErrorKind::GenerationEndpointError,
            Error::GenerationTimeout(_) => ErrorKind::GenerationTimeout,
            Error::BudgetExceeded { .. } => ErrorKind::BudgetExceeded,
            Error::InvariantViolation(_) => ErrorKind::InternalInvariantViolation,
            Error::Config(_) => ErrorKind::ConfigError,
            Error::Io(_) => ErrorKind::IoError,
        }
    }

    /// Whether the caller can reasonably retry the whole request
    ///
    /// Timeouts, budget exhaustion, and endpoint faults are transient from the
    /// caller's point of view. Document problems are not: the same bytes will
    /// fail the same way every time.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Error::LoaderTimeout(_)
                | Error::EmbeddingEndpoint(_)
                | Error::EmbeddingTimeout(_)
                | Error::GenerationEndpoint(_)
                | Error::GenerationTimeout(_)
                | Error::BudgetExceeded { .. }
        )
    }

    /// Create an invariant violation error
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriable_classification() {
        assert!(Error::LoaderTimeout("no result within 5000 ms".into()).is_retriable());
        assert!(Error::EmbeddingEndpoint("throttled".into()).is_retriable());
        assert!(Error::GenerationTimeout(10_000).is_retriable());
        assert!(Error::BudgetExceeded {
            stage: Stage::Generating,
            remaining_ms: 100,
            required_ms: 8000,
        }
        .is_retriable());

        assert!(!Error::EmptyDocument.is_retriable());
        assert!(!Error::UnsupportedFormat("zip".into()).is_retriable());
        assert!(!Error::DocumentUnavailable("missing".into()).is_retriable());
        assert!(!Error::invariant("dimension mismatch").is_retriable());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let kind = serde_json::to_string(&ErrorKind::EmbeddingEndpointError).unwrap();
        assert_eq!(kind, "\"embedding_endpoint_error\"");
        let stage = serde_json::to_string(&Stage::Loading).unwrap();
        assert_eq!(stage, "\"loading\"");
    }
}
