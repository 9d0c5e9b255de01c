//! Document and chunk types

use serde::{Deserialize, Serialize};

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// PDF document
    Pdf,
    /// Plain text or Markdown
    Text,
}

impl DocumentFormat {
    /// Detect format from a filename extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" | "text" | "md" | "markdown" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Text extracted from a single page (or the whole document for plain text)
#[derive(Debug, Clone)]
pub struct PageText {
    /// Page number, 1-indexed
    pub page_number: u32,
    /// Extracted text content
    pub content: String,
}

/// A loaded document: extracted ordered text units
///
/// Owned by the loader until handed to the chunker; immutable afterwards.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// Detected format
    pub format: DocumentFormat,
    /// Ordered non-empty text units
    pub pages: Vec<PageText>,
}

impl LoadedDocument {
    /// Full text: pages joined with blank lines, in document order
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// A contiguous span of document text used as the unit of embedding and
/// retrieval
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Position within the chunk sequence, 0-indexed
    pub seq: u32,
    /// Text content, at most `chunk_size` characters
    pub text: String,
    /// Characters shared verbatim with the end of the previous chunk
    pub overlap_with_previous: usize,
    /// Character offset of this chunk's start in the full document text
    pub char_start: usize,
    /// Character offset one past this chunk's end
    pub char_end: usize,
    /// First source page covered, 1-indexed
    pub page_start: u32,
    /// Last source page covered, 1-indexed
    pub page_end: u32,
}

impl Chunk {
    /// Character length of the chunk text
    pub fn len_chars(&self) -> usize {
        self.text.chars().count()
    }
}
