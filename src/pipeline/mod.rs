//! Pipeline orchestrator
//!
//! Sequences loading, chunking, embedding, indexing, retrieval, and
//! generation inside one invocation, enforcing the overall wall-clock budget.
//! Stages run strictly in order; any failure moves straight to the terminal
//! `Failed` state carrying the originating error kind and stage.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::config::{BudgetConfig, RoastConfig};
use crate::error::{Error, Result, Stage};
use crate::generation::PromptBuilder;
use crate::index::EphemeralIndex;
use crate::ingestion::{DocumentLoader, TextChunker};
use crate::providers::{DocumentStore, EmbeddingProvider, GenerationProvider};
use crate::retrieval::Retriever;
use crate::types::{RoastFailure, RoastMetadata, RoastRequest, RoastResult};

/// Tracks elapsed time against the invocation deadline
///
/// Before each stage the orchestrator asks the ledger whether the remaining
/// budget covers that stage's estimated worst-case cost, failing proactively
/// instead of starting work that cannot finish.
struct BudgetLedger<'a> {
    started: Instant,
    budget: &'a BudgetConfig,
}

impl<'a> BudgetLedger<'a> {
    fn new(budget: &'a BudgetConfig) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    /// Wall-clock time left before the overall deadline
    fn remaining(&self) -> Duration {
        self.budget.deadline().saturating_sub(self.started.elapsed())
    }

    /// Check the stage's estimate against the remaining budget
    ///
    /// Returns the remaining allowance, which also caps any external call the
    /// stage makes: if the deadline trips mid-call the call is abandoned, not
    /// awaited further.
    fn enter(&self, stage: Stage) -> Result<Duration> {
        let remaining = self.remaining();
        let required = self.budget.estimate_for(stage);
        if remaining < required {
            return Err(Error::BudgetExceeded {
                stage,
                remaining_ms: remaining.as_millis() as u64,
                required_ms: required.as_millis() as u64,
            });
        }
        tracing::debug!(%stage, remaining_ms = remaining.as_millis() as u64, "entering stage");
        Ok(remaining)
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

/// The bounded-time synchronous RAG pipeline
///
/// Each `run` invocation is independent and shares no mutable state with
/// concurrent invocations; everything intermediate is request-scoped.
pub struct RoastPipeline {
    loader: DocumentLoader,
    chunker: TextChunker,
    retriever: Retriever,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
    config: Arc<RoastConfig>,
}

impl RoastPipeline {
    /// Assemble a pipeline from configuration and injected collaborators
    pub fn new(
        config: RoastConfig,
        store: Arc<dyn DocumentStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            loader: DocumentLoader::new(store, &config.loader),
            chunker: TextChunker::new(&config.chunking),
            retriever: Retriever::new(&config.retrieval),
            embedder,
            generator,
            config: Arc::new(config),
        })
    }

    /// Run one request through the pipeline
    ///
    /// Returns the assembled result on `Done`, or a structured failure naming
    /// the failing stage and error kind. No partial result is ever returned.
    pub async fn run(&self, request: RoastRequest) -> std::result::Result<RoastResult, RoastFailure> {
        let ledger = BudgetLedger::new(&self.config.budget);
        let mut stage = Stage::Loading;

        tracing::info!(request_id = %request.request_id, document = %request.document, "roast request started");

        match self.execute(&request, &ledger, &mut stage).await {
            Ok(result) => {
                tracing::info!(
                    request_id = %request.request_id,
                    elapsed_ms = ledger.elapsed_ms(),
                    "roast request done"
                );
                Ok(result)
            }
            Err(error) => {
                // BudgetExceeded already names the stage it refused to enter.
                if let Error::BudgetExceeded { stage: s, .. } = &error {
                    stage = *s;
                }
                tracing::warn!(
                    request_id = %request.request_id,
                    failing_stage = %stage,
                    error = %error,
                    "roast request failed"
                );
                Err(RoastFailure::from_error(request.request_id.clone(), stage, &error))
            }
        }
    }

    async fn execute(
        &self,
        request: &RoastRequest,
        ledger: &BudgetLedger<'_>,
        stage: &mut Stage,
    ) -> Result<RoastResult> {
        // Loading
        *stage = Stage::Loading;
        let allowance = ledger.enter(Stage::Loading)?;
        let document = self.loader.load(&request.document, allowance).await?;
        let pages_processed = document.pages.len() as u32;

        // Chunking
        *stage = Stage::Chunking;
        ledger.enter(Stage::Chunking)?;
        let chunks = self.chunker.chunk_pages(&document.pages);
        drop(document);
        if chunks.is_empty() {
            return Err(Error::EmptyDocument);
        }
        let chunks_processed = chunks.len() as u32;
        tracing::debug!(chunks = chunks_processed, pages = pages_processed, "document chunked");

        // Embedding
        *stage = Stage::Embedding;
        let allowance = ledger.enter(Stage::Embedding)?;
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = timeout(allowance, self.embedder.embed(&texts))
            .await
            .map_err(|_| Error::EmbeddingTimeout(allowance.as_millis() as u64))??;
        self.check_dimensions(&vectors)?;

        // Indexing; the index lives inside this call and is dropped on every
        // exit path with the request scope.
        *stage = Stage::Indexing;
        ledger.enter(Stage::Indexing)?;
        let index = EphemeralIndex::build(chunks, vectors)?;

        // Retrieving
        *stage = Stage::Retrieving;
        let allowance = ledger.enter(Stage::Retrieving)?;
        let query_vector = timeout(allowance, self.retriever.embed_query(self.embedder.as_ref()))
            .await
            .map_err(|_| Error::EmbeddingTimeout(allowance.as_millis() as u64))??;
        let context = self.retriever.retrieve(&index, &query_vector)?;
        drop(index);

        // Generating
        *stage = Stage::Generating;
        let allowance = ledger.enter(Stage::Generating)?;
        let chunks_retrieved = context.chunks_kept();
        let context_chars = context.text.chars().count();
        let prompt = PromptBuilder::build_roast_prompt(&context);
        drop(context);
        let generated_text = timeout(
            allowance,
            self.generator
                .generate(PromptBuilder::system_instruction(), &prompt),
        )
        .await
        .map_err(|_| Error::GenerationTimeout(allowance.as_millis() as u64))??;

        // Done
        Ok(RoastResult {
            request_id: request.request_id.clone(),
            generated_text,
            metadata: RoastMetadata {
                pages_processed,
                chunks_processed,
                chunks_retrieved,
                context_chars,
                processing_time_ms: ledger.elapsed_ms(),
                embedding_model_id: self.embedder.model_id().to_string(),
                generation_model_id: self.generator.model_id().to_string(),
            },
        })
    }

    /// Every chunk vector must match the endpoint's declared dimensions
    fn check_dimensions(&self, vectors: &[Vec<f32>]) -> Result<()> {
        let expected = self.embedder.dimensions();
        for (i, vector) in vectors.iter().enumerate() {
            if vector.len() != expected {
                return Err(Error::invariant(format!(
                    "chunk vector {} has dimension {}, endpoint declares {}",
                    i,
                    vector.len(),
                    expected
                )));
            }
        }
        Ok(())
    }
}
