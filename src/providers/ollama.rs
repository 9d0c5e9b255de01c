//! Ollama-compatible HTTP providers for embeddings and generation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::config::{EmbeddingConfig, LlmConfig};
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::GenerationProvider;

/// Outcome of a single endpoint call, before retry policy is applied
enum CallError {
    /// Worth retrying: throttling, 5xx, connection faults
    Transient(String),
    /// Not worth retrying: malformed input, 4xx, bad response body
    Fatal(String),
    /// The call exceeded its time budget; never retried
    TimedOut,
}

/// Retry an operation on transient errors with exponential backoff
///
/// Fatal errors and timeouts surface immediately; transient errors surface
/// unchanged after `max_retries` additional attempts.
async fn retry_transient<F, Fut, T>(max_retries: u32, mut op: F) -> std::result::Result<T, CallError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = std::result::Result<T, CallError>>,
{
    let mut last = None;
    for attempt in 0..=max_retries {
        match op().await {
            Ok(value) => return Ok(value),
            Err(CallError::Transient(msg)) => {
                if attempt < max_retries {
                    let delay = Duration::from_millis(100 * 2u64.pow(attempt));
                    tracing::warn!(
                        "transient endpoint error (attempt {}/{}), retrying in {:?}: {}",
                        attempt + 1,
                        max_retries + 1,
                        delay,
                        msg
                    );
                    sleep(delay).await;
                }
                last = Some(CallError::Transient(msg));
            }
            Err(other) => return Err(other),
        }
    }
    Err(last.unwrap_or(CallError::Fatal("no attempts made".into())))
}

/// Classify a reqwest error
fn classify_request_error(e: reqwest::Error) -> CallError {
    if e.is_timeout() {
        CallError::TimedOut
    } else if e.is_connect() || e.is_request() {
        CallError::Transient(e.to_string())
    } else {
        CallError::Fatal(e.to_string())
    }
}

/// Classify an HTTP status code
fn classify_status(status: reqwest::StatusCode, body: String) -> CallError {
    let msg = format!("HTTP {} - {}", status, body);
    if status.as_u16() == 429 || status.is_server_error() {
        CallError::Transient(msg)
    } else {
        CallError::Fatal(msg)
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embedding client for the Ollama batch embed endpoint
///
/// One round trip covers up to `batch_size` texts; larger inputs are split
/// into sequential batches with output order preserved.
pub struct OllamaEmbedder {
    client: Client,
    config: EmbeddingConfig,
}

impl OllamaEmbedder {
    /// Create an embedder from configuration
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Embed one batch with retry on transient faults
    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.config.base_url);

        let result = retry_transient(self.config.max_retries, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .post(&url)
                    .json(&EmbedRequest {
                        model: &self.config.model,
                        input: batch,
                    })
                    .send()
                    .await
                    .map_err(classify_request_error)?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(classify_status(status, body));
                }

                let parsed: EmbedResponse = response
                    .json()
                    .await
                    .map_err(|e| CallError::Fatal(format!("bad embedding response: {}", e)))?;
                Ok(parsed.embeddings)
            }
        })
        .await;

        let vectors = match result {
            Ok(vectors) => vectors,
            Err(CallError::TimedOut) => {
                return Err(Error::EmbeddingTimeout(self.config.timeout_ms))
            }
            Err(CallError::Transient(msg)) | Err(CallError::Fatal(msg)) => {
                return Err(Error::EmbeddingEndpoint(msg))
            }
        };

        if vectors.len() != batch.len() {
            return Err(Error::EmbeddingEndpoint(format!(
                "endpoint returned {} vectors for {} texts",
                vectors.len(),
                batch.len()
            )));
        }
        Ok(vectors)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut all = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.config.batch_size) {
            let vectors = self.embed_batch(batch).await?;
            all.extend(vectors);
        }
        Ok(all)
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Generation client for the Ollama generate endpoint
///
/// Sampling parameters come from configuration; the call is made exactly once
/// per request, no retry, no streaming.
pub struct OllamaGenerator {
    client: Client,
    config: LlmConfig,
}

impl OllamaGenerator {
    /// Create a generator from configuration
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl GenerationProvider for OllamaGenerator {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest {
                model: &self.config.model,
                system,
                prompt,
                stream: false,
                options: GenerateOptions {
                    temperature: self.config.temperature,
                    top_p: self.config.top_p,
                    num_predict: self.config.max_tokens,
                },
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::GenerationTimeout(self.config.timeout_ms)
                } else {
                    Error::GenerationEndpoint(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::GenerationEndpoint(format!(
                "HTTP {} - {}",
                status, body
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::GenerationEndpoint(format!("bad generation response: {}", e)))?;
        Ok(parsed.response)
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retry_surfaces_transient_after_exhaustion() {
        let attempts = AtomicU32::new(0);
        let result: std::result::Result<(), _> = retry_transient(2, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(CallError::Transient("throttled".into())) }
        })
        .await;

        assert!(matches!(result, Err(CallError::Transient(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fatal_errors_are_not_retried() {
        let attempts = AtomicU32::new(0);
        let result: std::result::Result<(), _> = retry_transient(3, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(CallError::Fatal("malformed input".into())) }
        })
        .await;

        assert!(matches!(result, Err(CallError::Fatal(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeouts_are_not_retried() {
        let attempts = AtomicU32::new(0);
        let result: std::result::Result<(), _> = retry_transient(3, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(CallError::TimedOut) }
        })
        .await;

        assert!(matches!(result, Err(CallError::TimedOut)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_error() {
        let attempts = AtomicU32::new(0);
        let result = retry_transient(2, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(CallError::Transient("503".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert!(matches!(result, Ok(42)));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            classify_status(reqwest::StatusCode::TOO_MANY_REQUESTS, String::new()),
            CallError::Transient(_)
        ));
        assert!(matches!(
            classify_status(reqwest::StatusCode::BAD_GATEWAY, String::new()),
            CallError::Transient(_)
        ));
        assert!(matches!(
            classify_status(reqwest::StatusCode::BAD_REQUEST, String::new()),
            CallError::Fatal(_)
        ));
    }
}
