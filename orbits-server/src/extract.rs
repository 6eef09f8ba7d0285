//! Pure-Rust PDF text extraction.

use std::path::Path;

use tracing::debug;

use orbits_rag::error::RagError;
use orbits_rag::ingest::TextExtractor;

/// [`TextExtractor`] backed by `lopdf`.
///
/// Pages that fail to extract are kept as empty strings so page numbering
/// stays aligned with the source file.
pub struct LopdfExtractor;

impl TextExtractor for LopdfExtractor {
    fn extract_text(&self, path: &Path) -> orbits_rag::Result<Vec<String>> {
        let document = lopdf::Document::load(path).map_err(|e| {
            RagError::Ingestion(format!("failed to parse {}: {e}", path.display()))
        })?;

        let mut pages = Vec::new();
        for (page_number, _page_id) in document.get_pages() {
            match document.extract_text(&[page_number]) {
                Ok(text) => pages.push(text),
                Err(e) => {
                    debug!(page = page_number, error = %e, "failed to extract page text");
                    pages.push(String::new());
                }
            }
        }
        Ok(pages)
    }
}
