//! Deterministic text chunking with overlap and page tracking
//!
//! Chunking is a pure function of the extracted text units and the configured
//! parameters: identical input always yields the identical chunk sequence.

use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;
use crate::types::{Chunk, PageText};

/// Splits ordered text units into overlapping fixed-size chunks
///
/// Pages are joined with blank lines into one document text; chunk boundaries
/// prefer paragraph breaks, then sentence breaks, within `boundary_tolerance`
/// characters of the hard cut. The overlap region is copied verbatim from the
/// end of the previous chunk, so concatenating chunks while dropping each
/// chunk's `overlap_with_previous` prefix reconstructs the document exactly.
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
    tolerance: usize,
}

/// Character span of one page inside the joined document text
struct PageSpan {
    page_number: u32,
    start: usize,
    end: usize,
}

impl TextChunker {
    /// Create a chunker from configuration
    pub fn new(config: &ChunkingConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            overlap: config.chunk_overlap,
            tolerance: config.boundary_tolerance,
        }
    }

    /// Chunk ordered text units into an ordered chunk sequence
    ///
    /// Returns at least one chunk for any input with non-empty text; input
    /// shorter than the chunk size yields exactly one chunk.
    pub fn chunk_pages(&self, pages: &[PageText]) -> Vec<Chunk> {
        let (chars, spans) = join_pages(pages);
        let total = chars.len();
        if total == 0 {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut start = 0usize;
        let mut prev_end = 0usize;
        let mut seq = 0u32;

        loop {
            let hard_end = (start + self.chunk_size).min(total);
            let end = if hard_end == total {
                total
            } else {
                self.natural_break(&chars, start, hard_end)
            };

            let text: String = chars[start..end].iter().collect();
            let overlap_with_previous = if seq == 0 { 0 } else { prev_end - start };

            chunks.push(Chunk {
                seq,
                text,
                overlap_with_previous,
                char_start: start,
                char_end: end,
                page_start: page_containing(&spans, start),
                page_end: page_containing(&spans, end.saturating_sub(1)),
            });

            if end == total {
                break;
            }

            // Next chunk starts `overlap` characters back from this end, but
            // always makes forward progress.
            prev_end = end;
            start = end.saturating_sub(self.overlap).max(start + 1);
            seq += 1;
        }

        chunks
    }

    /// Pick a break position in `(start, hard_end]`, preferring a paragraph
    /// break, then a sentence break, within the tolerance window
    fn natural_break(&self, chars: &[char], start: usize, hard_end: usize) -> usize {
        let window_start = hard_end.saturating_sub(self.tolerance).max(start + 1);

        // Paragraph break: cut after the last blank line in the window.
        let mut pos = hard_end;
        while pos > window_start + 1 {
            if chars[pos - 1] == '\n' && chars[pos - 2] == '\n' {
                return pos;
            }
            pos -= 1;
        }

        // Sentence break: cut after the last sentence boundary in the window.
        let window: String = chars[window_start..hard_end].iter().collect();
        let mut cut = 0usize;
        let mut consumed = 0usize;
        for sentence in window.split_sentence_bounds() {
            consumed += sentence.chars().count();
            if consumed < window.chars().count() {
                cut = consumed;
            }
        }
        if cut > 0 {
            return window_start + cut;
        }

        hard_end
    }
}

/// Join page contents with blank lines, tracking per-page character spans
fn join_pages(pages: &[PageText]) -> (Vec<char>, Vec<PageSpan>) {
    let mut chars = Vec::new();
    let mut spans = Vec::new();

    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            chars.push('\n');
            chars.push('\n');
        }
        let start = chars.len();
        chars.extend(page.content.chars());
        spans.push(PageSpan {
            page_number: page.page_number,
            start,
            end: chars.len(),
        });
    }

    (chars, spans)
}

/// Page number covering a character position; separator characters attribute
/// to the preceding page
fn page_containing(spans: &[PageSpan], pos: usize) -> u32 {
    let mut current = spans.first().map(|s| s.page_number).unwrap_or(1);
    for span in spans {
        if pos >= span.start {
            current = span.page_number;
        }
        if pos < span.end {
            break;
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: u32, content: &str) -> PageText {
        PageText {
            page_number: n,
            content: content.to_string(),
        }
    }

    fn chunker(size: usize, overlap: usize, tolerance: usize) -> TextChunker {
        TextChunker::new(&ChunkingConfig {
            chunk_size: size,
            chunk_overlap: overlap,
            boundary_tolerance: tolerance,
        })
    }

    /// Reconstruct the document by dropping each chunk's overlap prefix
    fn reconstruct(chunks: &[Chunk]) -> String {
        let mut text = String::new();
        for chunk in chunks {
            let tail: String = chunk
                .text
                .chars()
                .skip(chunk.overlap_with_previous)
                .collect();
            text.push_str(&tail);
        }
        text
    }

    #[test]
    fn test_short_input_yields_exactly_one_chunk() {
        let pages = [page(1, "A short paragraph about a resume.")];
        let chunks = chunker(1500, 150, 200).chunk_pages(&pages);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, pages[0].content);
        assert_eq!(chunks[0].seq, 0);
        assert_eq!(chunks[0].overlap_with_previous, 0);
        assert_eq!(chunks[0].page_start, 1);
        assert_eq!(chunks[0].page_end, 1);
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        assert!(chunker(1500, 150, 200).chunk_pages(&[]).is_empty());
        assert!(chunker(1500, 150, 200).chunk_pages(&[page(1, "")]).is_empty());
    }

    #[test]
    fn test_every_chunk_respects_max_length() {
        let text = "word ".repeat(500);
        let chunks = chunker(200, 40, 60).chunk_pages(&[page(1, &text)]);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len_chars() <= 200, "chunk {} too long", chunk.seq);
        }
    }

    #[test]
    fn test_hard_cut_shares_exactly_overlap_characters() {
        // No sentence or paragraph boundaries anywhere, so every cut is hard.
        let text: String = std::iter::repeat('x').take(1000).collect();
        let chunks = chunker(300, 50, 80).chunk_pages(&[page(1, &text)]);
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            assert_eq!(pair[1].overlap_with_previous, 50);
            let prev_tail: String = pair[0].text.chars().rev().take(50).collect();
            let next_head: String = pair[1]
                .text
                .chars()
                .take(50)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            assert_eq!(prev_tail, next_head);
        }
    }

    #[test]
    fn test_reconstruction_is_exact() {
        let body = (0..60)
            .map(|i| format!("Sentence number {} talks about work history. ", i))
            .collect::<String>();
        let pages = [page(1, &body), page(2, "Final page with closing remarks.")];
        let chunks = chunker(250, 40, 80).chunk_pages(&pages);

        let expected = format!("{}\n\n{}", pages[0].content, pages[1].content);
        assert_eq!(reconstruct(&chunks), expected);
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let text = "Led a team of five engineers. Shipped three products. ".repeat(40);
        let pages = [page(1, &text)];
        let a = chunker(300, 60, 100).chunk_pages(&pages);
        let b = chunker(300, 60, 100).chunk_pages(&pages);
        assert_eq!(a, b);
    }

    #[test]
    fn test_prefers_paragraph_break_over_hard_cut() {
        let first = "a".repeat(180);
        let second = "b".repeat(200);
        let text = format!("{}\n\n{}", first, second);
        let chunks = chunker(200, 20, 50).chunk_pages(&[page(1, &text)]);
        // First chunk should end at the paragraph break, not at char 200.
        assert!(chunks[0].text.ends_with("\n\n"));
        assert_eq!(chunks[0].char_end, 182);
    }

    #[test]
    fn test_ordering_and_offsets_are_monotonic() {
        let text = "Improved throughput by forty percent. ".repeat(50);
        let chunks = chunker(280, 50, 90).chunk_pages(&[page(1, &text)]);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.seq, i as u32);
        }
        for pair in chunks.windows(2) {
            assert!(pair[1].char_start > pair[0].char_start);
            assert!(pair[1].char_end > pair[0].char_end);
        }
    }

    #[test]
    fn test_page_attribution_spans_pages() {
        let pages = [page(1, &"p1 ".repeat(80)), page(2, &"p2 ".repeat(80))];
        let chunks = chunker(300, 40, 60).chunk_pages(&pages);
        assert_eq!(chunks.first().unwrap().page_start, 1);
        assert_eq!(chunks.last().unwrap().page_end, 2);
    }
}
