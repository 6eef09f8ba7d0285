//! Corpus ingestion: extract, normalize, chunk.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::chunking::ChunkSplitter;
use crate::document::{Chunk, SourceDocument};
use crate::error::{RagError, Result};
use crate::normalize::normalize;

/// PDF text extraction, implemented by an external collaborator.
///
/// Returns one string per page, in page order.
pub trait TextExtractor: Send + Sync {
    /// Extract page texts from the file at `path`.
    fn extract_text(&self, path: &Path) -> Result<Vec<String>>;
}

/// Chunk a single extracted document.
///
/// Pages are joined with newlines, normalized, and split; chunk metadata
/// (`source`, `chunk_index`, `total_chunks`, `total_pages`) is attached in
/// output order.
pub fn chunk_document(document: &SourceDocument, splitter: &ChunkSplitter) -> Vec<Chunk> {
    let cleaned = normalize(&document.pages.join("\n"));
    let pieces = splitter.split(&cleaned);
    let total_chunks = pieces.len();
    let total_pages = document.total_pages();

    pieces
        .into_iter()
        .enumerate()
        .map(|(i, piece)| Chunk {
            content: piece.content,
            source: document.title.clone(),
            chunk_index: i,
            total_chunks,
            total_pages,
        })
        .collect()
}

/// Load every PDF under `dir` and return the combined chunk collection.
///
/// Non-PDF files are skipped; files are visited in name order so chunk
/// positions are stable across runs. An unreadable directory or a failing
/// extraction is an ingestion error.
pub fn load_corpus(
    dir: &Path,
    extractor: &dyn TextExtractor,
    splitter: &ChunkSplitter,
) -> Result<Vec<Chunk>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| RagError::Ingestion(format!("cannot read {}: {e}", dir.display())))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    paths.sort();

    let mut chunks = Vec::new();
    for path in paths {
        let title = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let pages = extractor.extract_text(&path)?;
        let document = SourceDocument { title, pages };
        let document_chunks = chunk_document(&document, splitter);
        info!(
            document = %document.title,
            chunk_count = document_chunks.len(),
            total_pages = document.total_pages(),
            "ingested document"
        );
        chunks.extend(document_chunks);
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_indexes_are_monotonic_and_metadata_is_attached() {
        let document = SourceDocument {
            title: "paper".to_string(),
            pages: vec!["first page text\n\nmore on page one".to_string(), "second page".to_string()],
        };
        let splitter = ChunkSplitter::new(20, 4, vec!["\n\n".into(), " ".into(), "".into()]);
        let chunks = chunk_document(&document, &splitter);

        assert!(!chunks.is_empty());
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
            assert_eq!(chunk.source, "paper");
            assert_eq!(chunk.total_chunks, chunks.len());
            assert_eq!(chunk.total_pages, 2);
        }
    }

    #[test]
    fn empty_document_yields_no_chunks() {
        let document = SourceDocument { title: "blank".to_string(), pages: vec![] };
        let splitter = ChunkSplitter::new(100, 10, vec!["".into()]);
        assert!(chunk_document(&document, &splitter).is_empty());
    }
}
