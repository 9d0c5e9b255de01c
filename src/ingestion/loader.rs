//! Document loader: fetch raw bytes and extract ordered text units
//!
//! Fetched bytes are written to a scratch file for extraction; the scratch
//! file is removed when the loader returns, success or failure, because the
//! `NamedTempFile` guard deletes it on drop.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::config::LoaderConfig;
use crate::error::{Error, Result};
use crate::providers::DocumentStore;
use crate::types::{DocumentFormat, LoadedDocument, PageText};

/// Loads a single document from the configured store
pub struct DocumentLoader {
    store: Arc<dyn DocumentStore>,
    max_bytes: u64,
    timeout: Duration,
}

impl DocumentLoader {
    /// Create a loader backed by a document store
    pub fn new(store: Arc<dyn DocumentStore>, config: &LoaderConfig) -> Self {
        Self {
            store,
            max_bytes: config.max_document_bytes,
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Fetch and extract a document, bounded by the loader time budget
    ///
    /// The budget covers fetch plus extraction; `allowance` further caps it
    /// when the invocation deadline leaves less time than the configured
    /// loader timeout.
    pub async fn load(&self, location: &str, allowance: Duration) -> Result<LoadedDocument> {
        let budget = self.timeout.min(allowance);
        timeout(budget, self.load_inner(location))
            .await
            .map_err(|_| {
                Error::LoaderTimeout(format!("no result within {} ms", budget.as_millis()))
            })?
    }

    async fn load_inner(&self, location: &str) -> Result<LoadedDocument> {
        let format = detect_format(location)?;

        let bytes = self.store.fetch(location).await?;
        if bytes.len() as u64 > self.max_bytes {
            return Err(Error::LoaderTimeout(format!(
                "document is {} bytes, limit is {}",
                bytes.len(),
                self.max_bytes
            )));
        }
        tracing::debug!(
            store = self.store.name(),
            location,
            size = bytes.len(),
            "fetched document"
        );

        let pages = match format {
            DocumentFormat::Pdf => extract_pdf_pages(bytes).await?,
            DocumentFormat::Text => extract_text_pages(bytes)?,
        };

        if pages.is_empty() {
            return Err(Error::EmptyDocument);
        }

        tracing::info!(location, pages = pages.len(), "document loaded");
        Ok(LoadedDocument { format, pages })
    }
}

/// Detect the document format from the location's extension
fn detect_format(location: &str) -> Result<DocumentFormat> {
    let extension = location.rsplit('.').next().unwrap_or("");
    DocumentFormat::from_extension(extension)
        .ok_or_else(|| Error::UnsupportedFormat(format!("unrecognized extension '{}'", extension)))
}

/// Extract per-page text from PDF bytes
///
/// Extraction is CPU-bound and pdf parsing can stall on pathological fonts,
/// so it runs on the blocking pool; the caller's timeout abandons it if it
/// overruns. The scratch file lives only for the duration of this call.
async fn extract_pdf_pages(bytes: Vec<u8>) -> Result<Vec<PageText>> {
    if !bytes.starts_with(b"%PDF") {
        return Err(Error::UnsupportedFormat("missing PDF header".into()));
    }

    let pages = tokio::task::spawn_blocking(move || -> Result<Vec<PageText>> {
        use std::io::Write;

        let mut scratch = tempfile::NamedTempFile::new()?;
        scratch.write_all(&bytes)?;
        scratch.flush()?;

        match pdf_extract::extract_text_by_pages(scratch.path()) {
            Ok(raw_pages) => Ok(clean_pages(raw_pages)),
            Err(e) => {
                tracing::warn!("pdf-extract failed: {}, trying lopdf fallback", e);
                extract_pdf_pages_fallback(&bytes)
            }
        }
    })
    .await
    .map_err(|e| Error::invariant(format!("extraction task panicked: {}", e)))??;

    Ok(pages)
}

/// Fallback extraction using lopdf directly
fn extract_pdf_pages_fallback(bytes: &[u8]) -> Result<Vec<PageText>> {
    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| Error::UnsupportedFormat(format!("not a parseable PDF: {}", e)))?;

    let mut raw_pages = Vec::new();
    for (page_number, _) in doc.get_pages() {
        match doc.extract_text(&[page_number]) {
            Ok(text) => raw_pages.push(text),
            Err(e) => {
                tracing::debug!(page = page_number, "no text on page: {}", e);
                raw_pages.push(String::new());
            }
        }
    }

    Ok(clean_pages(raw_pages))
}

/// A plain-text document is a single text unit
fn extract_text_pages(bytes: Vec<u8>) -> Result<Vec<PageText>> {
    let content = String::from_utf8(bytes)
        .map_err(|_| Error::UnsupportedFormat("text document is not valid UTF-8".into()))?;
    Ok(clean_pages(vec![content]))
}

/// Normalize extracted text and drop pages with no content
fn clean_pages(raw_pages: Vec<String>) -> Vec<PageText> {
    raw_pages
        .into_iter()
        .enumerate()
        .filter_map(|(i, raw)| {
            let content = raw
                .replace('\0', "")
                .lines()
                .map(str::trim_end)
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string();
            if content.is_empty() {
                None
            } else {
                Some(PageText {
                    page_number: i as u32 + 1,
                    content,
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format("a/b/resume.pdf").unwrap(), DocumentFormat::Pdf);
        assert_eq!(detect_format("resume.txt").unwrap(), DocumentFormat::Text);
        assert_eq!(detect_format("notes.MD").unwrap(), DocumentFormat::Text);
        assert!(matches!(
            detect_format("archive.zip"),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(matches!(
            detect_format("no-extension"),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_clean_pages_drops_empty_pages_and_preserves_order() {
        let pages = clean_pages(vec![
            "  First page  \n".into(),
            "   \n\n".into(),
            "Third\0 page".into(),
        ]);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page_number, 1);
        assert_eq!(pages[0].content, "First page");
        assert_eq!(pages[1].page_number, 3);
        assert_eq!(pages[1].content, "Third page");
    }

    #[test]
    fn test_text_extraction_rejects_invalid_utf8() {
        assert!(matches!(
            extract_text_pages(vec![0xff, 0xfe, 0x80]),
            Err(Error::UnsupportedFormat(_))
        ));
    }
}
