//! roast-rag: bounded-time RAG pipeline for resume critiques
//!
//! Turns a stored document into a small set of relevant passages and then
//! into a single LLM-generated critique, all inside one request/response
//! cycle with a hard wall-clock budget. The per-request vector index is
//! ephemeral; external endpoints are reached through injectable provider
//! traits so the whole pipeline is testable against deterministic fakes.

pub mod config;
pub mod error;
pub mod generation;
pub mod index;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod types;

pub use config::RoastConfig;
pub use error::{Error, ErrorKind, Result, Stage};
pub use pipeline::RoastPipeline;
pub use types::{RoastFailure, RoastMetadata, RoastRequest, RoastResult};
