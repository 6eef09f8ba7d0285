//! Recursive character splitting with overlap.
//!
//! [`ChunkSplitter`] splits normalized document text into overlapping
//! segments bounded by a character budget, preferring larger semantic
//! separators first and hard-slicing only as a last resort.

use crate::config::RagConfig;

/// A piece of split text plus the byte length of the context it shares with
/// its predecessor.
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    /// The chunk text, overlap prefix included.
    pub content: String,
    /// Byte length of the leading overlap shared with the previous chunk.
    /// Zero for the first chunk. Stripping this prefix from every chunk and
    /// concatenating the rest reconstructs the input exactly.
    pub overlap_len: usize,
}

/// Splits text recursively on a separator ladder, coarsest first.
///
/// Base segments are bounded by `chunk_size - chunk_overlap` so that the
/// emitted chunk (overlap prefix plus segment) stays within `chunk_size`.
/// Every cut lands on a char boundary.
#[derive(Debug, Clone)]
pub struct ChunkSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl ChunkSplitter {
    /// Create a new splitter.
    ///
    /// `separators` is ordered coarsest to finest; an empty-string entry (or
    /// an exhausted ladder) falls back to hard character slicing.
    pub fn new(chunk_size: usize, chunk_overlap: usize, separators: Vec<String>) -> Self {
        Self { chunk_size, chunk_overlap, separators }
    }

    /// Create a splitter from pipeline configuration.
    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap, config.separators.clone())
    }

    /// Split `text` into overlapping chunks.
    ///
    /// Returns an empty `Vec` for empty input. Chunk order follows document
    /// order; the caller assigns `chunk_index` from output order.
    pub fn split(&self, text: &str) -> Vec<TextChunk> {
        if text.is_empty() {
            return Vec::new();
        }

        let target = self.chunk_size.saturating_sub(self.chunk_overlap).max(1);
        let separators: Vec<&str> = self.separators.iter().map(String::as_str).collect();

        let mut spans = Vec::new();
        split_spans(text, 0, &separators, target, &mut spans);
        let spans = merge_spans(spans, target);

        spans
            .iter()
            .enumerate()
            .map(|(i, &(start, end))| {
                let overlap_start = if i == 0 {
                    start
                } else {
                    // Clamp toward the span start so the overlap never
                    // exceeds its byte budget.
                    ceil_char_boundary(text, start.saturating_sub(self.chunk_overlap))
                };
                TextChunk {
                    content: text[overlap_start..end].to_string(),
                    overlap_len: start - overlap_start,
                }
            })
            .collect()
    }
}

/// Recursively split `text` (at absolute offset `base`) into contiguous
/// spans of at most `target` bytes, trying each separator in order.
fn split_spans(
    text: &str,
    base: usize,
    separators: &[&str],
    target: usize,
    out: &mut Vec<(usize, usize)>,
) {
    if text.len() <= target {
        out.push((base, base + text.len()));
        return;
    }

    let Some((separator, finer)) = separators.split_first() else {
        hard_slice(text, base, target, out);
        return;
    };
    if separator.is_empty() {
        hard_slice(text, base, target, out);
        return;
    }

    let pieces = split_keeping_separator(text, separator);
    if pieces.len() <= 1 {
        // Separator absent — fall through to the next level.
        split_spans(text, base, finer, target, out);
        return;
    }

    let mut offset = 0;
    for piece in pieces {
        let piece_base = base + offset;
        if piece.len() <= target {
            out.push((piece_base, piece_base + piece.len()));
        } else {
            split_spans(piece, piece_base, finer, target, out);
        }
        offset += piece.len();
    }
}

/// Split text at a separator while keeping the separator attached to the
/// preceding segment, so the pieces partition the input exactly.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

/// Hard character slicing into spans of at most `target` bytes, cutting only
/// at char boundaries.
fn hard_slice(text: &str, base: usize, target: usize, out: &mut Vec<(usize, usize)>) {
    let mut start = 0;
    while start < text.len() {
        let mut end = (start + target).min(text.len());
        end = floor_char_boundary(text, end);
        if end <= start {
            // A single char wider than the target; emit it whole.
            end = ceil_char_boundary(text, start + 1);
        }
        out.push((base + start, base + end));
        start = end;
    }
}

/// Merge consecutive spans while the combined length stays within `target`.
/// Spans are contiguous, so the merged length is just `end - start`.
fn merge_spans(spans: Vec<(usize, usize)>, target: usize) -> Vec<(usize, usize)> {
    let mut merged: Vec<(usize, usize)> = Vec::new();
    for (start, end) in spans {
        if let Some(last) = merged.last_mut() {
            if end - last.0 <= target {
                last.1 = end;
                continue;
            }
        }
        merged.push((start, end));
    }
    merged
}

fn floor_char_boundary(text: &str, mut i: usize) -> usize {
    while i > 0 && !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_char_boundary(text: &str, mut i: usize) -> usize {
    while i < text.len() && !text.is_char_boundary(i) {
        i += 1;
    }
    i
}
