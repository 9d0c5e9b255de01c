//! Ephemeral per-request vector index
//!
//! Built fresh from the chunk embeddings of one request, queried once, and
//! dropped with the request scope. Corpora are tens of chunks, so search is
//! an exact cosine scan; no approximate structure is worth its build cost.

use crate::error::{Error, Result};
use crate::types::Chunk;

/// One retrieval hit
#[derive(Debug, Clone)]
pub struct ScoredChunk<'a> {
    /// The matched chunk
    pub chunk: &'a Chunk,
    /// Cosine similarity to the query, higher is better
    pub similarity: f32,
}

/// In-memory similarity index over one request's chunks
pub struct EphemeralIndex {
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
    dimensions: usize,
}

impl EphemeralIndex {
    /// Build an index from chunks and their embeddings
    ///
    /// `vectors[i]` must be the embedding of `chunks[i]`; all vectors must
    /// share one dimension. Violations are fatal, never retried.
    pub fn build(chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> Result<Self> {
        if chunks.len() != vectors.len() {
            return Err(Error::invariant(format!(
                "{} chunks but {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }
        let dimensions = vectors.first().map(|v| v.len()).unwrap_or(0);
        for (i, vector) in vectors.iter().enumerate() {
            if vector.len() != dimensions {
                return Err(Error::invariant(format!(
                    "vector {} has dimension {}, expected {}",
                    i,
                    vector.len(),
                    dimensions
                )));
            }
        }

        Ok(Self {
            chunks,
            vectors,
            dimensions,
        })
    }

    /// Number of indexed chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the index holds no chunks
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Return the `k` chunks most similar to the query vector
    ///
    /// `k` is clamped to the number of indexed chunks. Ties break toward the
    /// earlier chunk sequence index, so results are stable and deterministic.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredChunk<'_>>> {
        if !self.is_empty() && vector.len() != self.dimensions {
            return Err(Error::invariant(format!(
                "query dimension {} does not match index dimension {}",
                vector.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<ScoredChunk<'_>> = self
            .chunks
            .iter()
            .zip(&self.vectors)
            .map(|(chunk, candidate)| ScoredChunk {
                chunk,
                similarity: cosine_similarity(vector, candidate),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.chunk.seq.cmp(&b.chunk.seq))
        });
        scored.truncate(k.min(self.chunks.len()));

        Ok(scored)
    }
}

/// Cosine similarity between two vectors of equal length
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_query_returns_most_similar_first() {
        let index = EphemeralIndex::build(
            vec![chunk(0, "a"), chunk(1, "b"), chunk(2, "c")],
            vec![
                vec![1.0, 0.0],
                vec![0.0, 1.0],
                vec![0.7, 0.7],
            ],
        )
        .unwrap();

        let hits = index.query(&[1.0, 0.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.seq, 0);
        assert_eq!(hits[1].chunk.seq, 2);
        assert!(hits[0].similarity > hits[1].similarity);
    }

    #[test]
    fn test_k_clamps_to_available_chunks() {
        let index = EphemeralIndex::build(
            vec![chunk(0, "only")],
            vec![vec![0.5, 0.5]],
        )
        .unwrap();

        let hits = index.query(&[1.0, 0.0], 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.seq, 0);
    }

    #[test]
    fn test_ties_break_toward_earlier_sequence_index() {
        let index = EphemeralIndex::build(
            vec![chunk(2, "late"), chunk(0, "early"), chunk(1, "mid")],
            vec![
                vec![1.0, 0.0],
                vec![1.0, 0.0],
                vec![1.0, 0.0],
            ],
        )
        .unwrap();

        let hits = index.query(&[1.0, 0.0], 3).unwrap();
        let order: Vec<u32> = hits.iter().map(|h| h.chunk.seq).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_dimension_mismatch_is_invariant_violation() {
        let build = EphemeralIndex::build(
            vec![chunk(0, "a"), chunk(1, "b")],
            vec![vec![1.0, 0.0], vec![1.0, 0.0, 0.0]],
        );
        assert!(matches!(build, Err(Error::InvariantViolation(_))));

        let index =
            EphemeralIndex::build(vec![chunk(0, "a")], vec![vec![1.0, 0.0]]).unwrap();
        assert!(matches!(
            index.query(&[1.0, 0.0, 0.0], 1),
            Err(Error::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_chunk_vector_count_mismatch_rejected() {
        assert!(matches!(
            EphemeralIndex::build(vec![chunk(0, "a")], vec![]),
            Err(Error::InvariantViolation(_))
        ));
    }
}
