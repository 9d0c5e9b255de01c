//! Request and response types at the pipeline boundary

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, ErrorKind, Stage};

/// One roast request
///
/// Lives only for the duration of a single pipeline run; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoastRequest {
    /// Opaque request identifier; generated when the caller supplies none
    pub request_id: String,
    /// Storage location of the source document, resolvable by the
    /// configured document store
    pub document: String,
}

impl RoastRequest {
    /// Create a request with a generated identifier
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            document: document.into(),
        }
    }

    /// Create a request with a caller-supplied identifier
    pub fn with_id(request_id: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            document: document.into(),
        }
    }
}

/// Processing metadata attached to a successful result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoastMetadata {
    /// Pages extracted from the document
    pub pages_processed: u32,
    /// Chunks produced and embedded
    pub chunks_processed: u32,
    /// Chunks that made it into the generation context
    pub chunks_retrieved: u32,
    /// Character length of the assembled context
    pub context_chars: usize,
    /// Total wall-clock time for the invocation
    pub processing_time_ms: u64,
    /// Embedding model identifier
    pub embedding_model_id: String,
    /// Generation model identifier
    pub generation_model_id: String,
}

/// Final structured output of a successful pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoastResult {
    /// Request identifier
    pub request_id: String,
    /// Generated critique, verbatim from the generation endpoint
    pub generated_text: String,
    /// Processing metadata
    pub metadata: RoastMetadata,
}

/// Structured failure returned when the pipeline reaches the `Failed` state
///
/// The API boundary maps `error_kind` and `retriable` to transport status
/// codes; nothing here requires inspecting internals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoastFailure {
    /// Request identifier
    pub request_id: String,
    /// Machine-readable error kind
    pub error_kind: ErrorKind,
    /// Stage that was executing (or about to execute) when the error occurred
    pub failing_stage: Stage,
    /// Human-readable message
    pub message: String,
    /// Whether retrying the whole request is reasonable
    pub retriable: bool,
}

impl RoastFailure {
    /// Build a failure from the originating error and stage
    pub fn from_error(request_id: String, stage: Stage, error: &Error) -> Self {
        Self {
            request_id,
            error_kind: error.kind(),
            failing_stage: stage,
            message: error.to_string(),
            retriable: error.is_retriable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_request_ids_are_unique() {
        let a = RoastRequest::new("resumes/a.pdf");
        let b = RoastRequest::new("resumes/a.pdf");
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn test_failure_carries_kind_and_stage() {
        let failure = RoastFailure::from_error(
            "req-1".into(),
            Stage::Embedding,
            &Error::EmbeddingEndpoint("503 from endpoint".into()),
        );
        assert_eq!(failure.error_kind, ErrorKind::EmbeddingEndpointError);
        assert_eq!(failure.failing_stage, Stage::Embedding);
        assert!(failure.retriable);

        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["error_kind"], "embedding_endpoint_error");
        assert_eq!(json["failing_stage"], "embedding");
    }
}
