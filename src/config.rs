//! Configuration for the roast pipeline
//!
//! One immutable `RoastConfig` is built at startup and threaded through every
//! pipeline invocation. Nothing here is mutable per request.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, Stage};

/// Main pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoastConfig {
    /// Document loading configuration
    #[serde(default)]
    pub loader: LoaderConfig,
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Embedding endpoint configuration
    #[serde(default)]
    pub embeddings: EmbeddingConfig,
    /// Generation endpoint configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Per-invocation time budget configuration
    #[serde(default)]
    pub budget: BudgetConfig,
}

impl RoastConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Validate cross-field invariants
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be non-zero".into()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(
                "chunk_overlap must be smaller than chunk_size".into(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("top_k must be non-zero".into()));
        }
        if self.embeddings.batch_size == 0 {
            return Err(Error::Config("batch_size must be non-zero".into()));
        }
        Ok(())
    }
}

/// Document loading configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Maximum accepted document size in bytes; larger documents are rejected
    /// before extraction is attempted
    pub max_document_bytes: u64,
    /// Time budget for fetch plus extraction, in milliseconds
    pub timeout_ms: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_document_bytes: 10 * 1024 * 1024, // 10MB; resumes are small
            timeout_ms: 5_000,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Overlap between adjacent chunks in characters
    pub chunk_overlap: usize,
    /// How far back from the hard cut to search for a natural boundary,
    /// in characters
    pub boundary_tolerance: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1500,
            chunk_overlap: 150,
            boundary_tolerance: 200,
        }
    }
}

/// Embedding endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Endpoint base URL
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// Declared output dimensions of the endpoint
    pub dimensions: usize,
    /// Texts per batch request; also caps round trips
    pub batch_size: usize,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
    /// Retries for transient endpoint faults
    pub max_retries: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            batch_size: 16,
            timeout_ms: 8_000,
            max_retries: 2,
        }
    }
}

/// Generation endpoint configuration
///
/// Sampling parameters are fixed here, never request-controlled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Endpoint base URL
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// Maximum output length in tokens
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling threshold
    pub top_p: f32,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2:3b".to_string(),
            max_tokens: 3000,
            temperature: 0.8,
            top_p: 0.9,
            timeout_ms: 15_000,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks to retrieve (clamped to available chunks)
    pub top_k: usize,
    /// Maximum assembled context size in characters
    pub context_char_budget: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            context_char_budget: 6_000,
        }
    }
}

/// Wall-clock budget for one pipeline invocation
///
/// Before entering each stage the orchestrator checks remaining budget against
/// that stage's estimated worst-case cost and fails proactively rather than
/// starting work that cannot finish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Overall invocation deadline in milliseconds
    pub overall_deadline_ms: u64,
    /// Worst-case estimate for document loading
    pub loading_estimate_ms: u64,
    /// Worst-case estimate for chunking
    pub chunking_estimate_ms: u64,
    /// Worst-case estimate for batch embedding
    pub embedding_estimate_ms: u64,
    /// Worst-case estimate for index construction
    pub indexing_estimate_ms: u64,
    /// Worst-case estimate for retrieval (includes the query embedding call)
    pub retrieving_estimate_ms: u64,
    /// Worst-case estimate for generation
    pub generating_estimate_ms: u64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            overall_deadline_ms: 25_000,
            loading_estimate_ms: 3_000,
            chunking_estimate_ms: 100,
            embedding_estimate_ms: 6_000,
            indexing_estimate_ms: 100,
            retrieving_estimate_ms: 2_000,
            generating_estimate_ms: 10_000,
        }
    }
}

impl BudgetConfig {
    /// Overall deadline as a duration
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.overall_deadline_ms)
    }

    /// Worst-case estimate for a stage
    pub fn estimate_for(&self, stage: Stage) -> Duration {
        let ms = match stage {
            Stage::Loading => self.loading_estimate_ms,
            Stage::Chunking => self.chunking_estimate_ms,
            Stage::Embedding => self.embedding_estimate_ms,
            Stage::Indexing => self.indexing_estimate_ms,
            Stage::Retrieving => self.retrieving_estimate_ms,
            Stage::Generating => self.generating_estimate_ms,
        };
        Duration::from_millis(ms)
    }
}
