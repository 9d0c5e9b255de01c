//! Generation provider trait

use async_trait::async_trait;

use crate::error::Result;

/// Calls the LLM inference endpoint once and returns the finished response
///
/// No streaming and no retries: the call is all-or-nothing within the
/// caller's time budget.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate text for a prompt, returned verbatim
    async fn generate(&self, system: &str, prompt: &str) -> Result<String>;

    /// Model identifier for response metadata
    fn model_id(&self) -> &str;
}
