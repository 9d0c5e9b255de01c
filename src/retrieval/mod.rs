//! Retrieval: fixed critique query and bounded context assembly

use crate::config::RetrievalConfig;
use crate::error::Result;
use crate::index::{EphemeralIndex, ScoredChunk};
use crate::providers::EmbeddingProvider;

/// The fixed synthetic query the pipeline retrieves against
///
/// The task is always the same critique, so the query never comes from the
/// request.
pub const CRITIQUE_QUERY: &str =
    "work experience, accomplishments, skills, qualifications, and formatting \
     or presentation weaknesses in this resume";

/// Context assembled from the top retrieved chunks
#[derive(Debug, Clone)]
pub struct RetrievedContext {
    /// Numbered sections with page attribution, ready for the prompt
    pub text: String,
    /// Sequence indices of the chunks that were kept, in similarity order
    pub kept: Vec<u32>,
}

impl RetrievedContext {
    /// Number of chunks that made it into the context
    pub fn chunks_kept(&self) -> u32 {
        self.kept.len() as u32
    }
}

/// Retrieves relevant passages and packs them into a bounded context
pub struct Retriever {
    top_k: usize,
    char_budget: usize,
}

impl Retriever {
    /// Create a retriever from configuration
    pub fn new(config: &RetrievalConfig) -> Self {
        Self {
            top_k: config.top_k,
            char_budget: config.context_char_budget,
        }
    }

    /// Embed the fixed critique query
    pub async fn embed_query(&self, embedder: &dyn EmbeddingProvider) -> Result<Vec<f32>> {
        let mut vectors = embedder.embed(&[CRITIQUE_QUERY.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| crate::error::Error::invariant("embedder returned no query vector"))
    }

    /// Query the index and assemble the context
    ///
    /// Chunks are appended in descending similarity order until the next one
    /// would push the context past the character budget; the remainder are
    /// dropped. The result never exceeds the budget.
    pub fn retrieve(&self, index: &EphemeralIndex, query_vector: &[f32]) -> Result<RetrievedContext> {
        let hits = index.query(query_vector, self.top_k)?;
        Ok(self.assemble(&hits))
    }

    fn assemble(&self, hits: &[ScoredChunk<'_>]) -> RetrievedContext {
        let mut text = String::new();
        let mut kept = Vec::new();

        for (i, hit) in hits.iter().enumerate() {
            let section = format_section(i + 1, hit);
            if text.chars().count() + section.chars().count() > self.char_budget {
                tracing::debug!(
                    kept = kept.len(),
                    dropped = hits.len() - kept.len(),
                    "context budget reached"
                );
                break;
            }
            text.push_str(&section);
            kept.push(hit.chunk.seq);
        }

        RetrievedContext { text, kept }
    }
}

/// Format one retrieved chunk as a numbered context section
fn format_section(number: usize, hit: &ScoredChunk<'_>) -> String {
    let pages = if hit.chunk.page_start == hit.chunk.page_end {
        format!("Page {}", hit.chunk.page_start)
    } else {
        format!("Pages {}-{}", hit.chunk.page_start, hit.chunk.page_end)
    };
    format!(
        "Section {} ({}):\n{}\n\n",
        number, pages, hit.chunk.text
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::EphemeralIndex;
    use crate::types::Chunk;

    fn chunk(seq: u32, text: &str) -> Chunk {
        Chunk {
            seq,
            text: text.to_string(),
            overlap_with_previous: 0,
            char_start: 0,
            char_end: text.len(),
            page_start: 1,
            page_end: 1,
        }
    }

    fn retriever(top_k: usize, budget: usize) -> Retriever {
        Retriever::new(&RetrievalConfig {
            top_k,
            context_char_budget: budget,
        })
    }

    #[test]
    fn test_context_never_exceeds_budget() {
        let chunks = vec![
            chunk(0, &"a".repeat(400)),
            chunk(1, &"b".repeat(400)),
            chunk(2, &"c".repeat(400)),
        ];
        let vectors = vec![vec![1.0, 0.0], vec![0.9, 0.1], vec![0.8, 0.2]];
        let index = EphemeralIndex::build(chunks, vectors).unwrap();

        let budget = 900;
        let context = retriever(3, budget)
            .retrieve(&index, &[1.0, 0.0])
            .unwrap();

        assert!(context.text.chars().count() <= budget);
        // The third chunk would overflow the budget and is dropped.
        assert_eq!(context.kept, vec![0, 1]);
        assert!(context.text.contains("aaa"));
        assert!(context.text.contains("bbb"));
        assert!(!context.text.contains("ccc"));
    }

    #[test]
    fn test_sections_are_ordered_by_similarity() {
        let chunks = vec![chunk(0, "first chunk"), chunk(1, "second chunk")];
        let vectors = vec![vec![0.1, 0.9], vec![1.0, 0.0]];
        let index = EphemeralIndex::build(chunks, vectors).unwrap();

        let context = retriever(2, 10_000)
            .retrieve(&index, &[1.0, 0.0])
            .unwrap();

        assert_eq!(context.kept, vec![1, 0]);
        let first = context.text.find("second chunk").unwrap();
        let second = context.text.find("first chunk").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_single_chunk_document_fills_context() {
        let index = EphemeralIndex::build(
            vec![chunk(0, "the only paragraph")],
            vec![vec![1.0, 0.0]],
        )
        .unwrap();

        let context = retriever(4, 10_000)
            .retrieve(&index, &[1.0, 0.0])
            .unwrap();
        assert_eq!(context.chunks_kept(), 1);
        assert!(context.text.contains("the only paragraph"));
    }

    #[test]
    fn test_page_attribution_in_sections() {
        let mut c = chunk(0, "spans pages");
        c.page_start = 1;
        c.page_end = 2;
        let index = EphemeralIndex::build(vec![c], vec![vec![1.0]]).unwrap();

        let context = retriever(1, 1_000).retrieve(&index, &[1.0]).unwrap();
        assert!(context.text.contains("Pages 1-2"));
    }
}
