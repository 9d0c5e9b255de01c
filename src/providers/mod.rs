//! Capability-abstracted collaborators
//!
//! The pipeline talks to its three external dependencies through single-purpose
//! traits so the orchestrator and retriever are testable against deterministic
//! fakes without any network dependency.

pub mod document_store;
pub mod embedding;
pub mod llm;
pub mod ollama;

pub use document_store::{DocumentStore, LocalDocumentStore};
pub use embedding::EmbeddingProvider;
pub use llm::GenerationProvider;
pub use ollama::{OllamaEmbedder, OllamaGenerator};
