//! Embedding provider trait

use async_trait::async_trait;

use crate::error::Result;

/// Converts text into fixed-length numeric vectors
///
/// Implementations must preserve input order: `embed(texts)[i]` is the vector
/// for `texts[i]`. Transient endpoint faults are retried internally with a
/// bounded count; timeouts surface as `EmbeddingTimeout` without retry.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, one vector per text, order preserved
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Declared output dimensions of the endpoint
    fn dimensions(&self) -> usize;

    /// Model identifier for response metadata
    fn model_id(&self) -> &str;
}
