//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`RecursiveChunker`], which
//! splits text hierarchically (paragraphs → lines → sentences → words →
//! characters), merges the pieces into windows, and carries a fixed overlap
//! from each chunk into the next.
//!
//! Lengths are measured in characters (Unicode scalar values), never bytes, so
//! multi-byte text is never cut inside a character.

use std::ops::Range;

/// Separators tried in order, from coarsest to finest. The empty separator is
/// the character-level fallback.
pub const DEFAULT_SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

/// Default maximum chunk length in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Default overlap between consecutive chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// A strategy for splitting document text into chunks.
///
/// Splitting is a pure function over the input: it never fails, and empty or
/// whitespace-only input yields an empty `Vec`.
pub trait Chunker: Send + Sync {
    /// Split `text` into chunks, in document order.
    fn split(&self, text: &str) -> Vec<String>;
}

/// Splits text recursively on a list of separators, then merges the pieces
/// into overlapping chunks.
///
/// Every chunk is at most `chunk_size` characters. Each chunk after the first
/// starts with the last `chunk_overlap` characters of its predecessor (or the
/// whole predecessor when it is shorter), so information spanning a boundary is
/// retrievable from at least one chunk. Removing that overlap prefix from each
/// chunk and concatenating reconstructs the input exactly.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(500, 50);
/// let chunks = chunker.split(&content);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk (at least 1)
    /// * `chunk_overlap`: characters carried from one chunk into the next;
    ///   clamped below `chunk_size`
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the separator list. The character-level fallback is always
    /// applied after the last separator.
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    /// Maximum chunk length in characters.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap between consecutive chunks in characters.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into byte ranges, one per chunk. Each chunk is
    /// `&text[range]`; ranges are ordered and consecutive ranges overlap.
    pub fn split_spans(&self, text: &str) -> Vec<Range<usize>> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        // Windows leave room for the overlap carried in front of them.
        let budget = self.chunk_size - self.chunk_overlap;

        let mut pieces = Vec::new();
        split_recursive(text, 0..text.len(), &self.separators, budget, &mut pieces);

        merge_pieces(text, &pieces, budget)
            .into_iter()
            .enumerate()
            .map(|(i, window)| {
                if i == 0 {
                    window
                } else {
                    back_off(text, window.start, self.chunk_overlap)..window.end
                }
            })
            .collect()
    }
}

impl Chunker for RecursiveChunker {
    fn split(&self, text: &str) -> Vec<String> {
        self.split_spans(text).into_iter().map(|span| text[span].to_string()).collect()
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split `text[range]` into pieces of at most `budget` characters, using the
/// first separator present in the segment and recursing with the remaining
/// separators on pieces that are still too long.
fn split_recursive(
    text: &str,
    range: Range<usize>,
    separators: &[String],
    budget: usize,
    out: &mut Vec<Range<usize>>,
) {
    let segment = &text[range.clone()];
    if char_len(segment) <= budget {
        out.push(range);
        return;
    }

    let Some(pos) = separators.iter().position(|s| s.is_empty() || segment.contains(s.as_str()))
    else {
        split_by_chars(text, range, budget, out);
        return;
    };

    let separator = separators[pos].as_str();
    if separator.is_empty() {
        split_by_chars(text, range, budget, out);
        return;
    }
    let remaining_separators = &separators[pos + 1..];

    // Keep the separator attached to the preceding piece so no text is lost.
    let mut start = range.start;
    let mut boundaries: Vec<usize> = segment
        .match_indices(separator)
        .map(|(idx, sep)| range.start + idx + sep.len())
        .collect();
    if boundaries.last() != Some(&range.end) {
        boundaries.push(range.end);
    }

    for end in boundaries {
        let piece = start..end;
        start = end;
        if piece.is_empty() {
            continue;
        }
        if char_len(&text[piece.clone()]) <= budget {
            out.push(piece);
        } else {
            split_recursive(text, piece, remaining_separators, budget, out);
        }
    }
}

/// Cut `text[range]` every `budget` characters.
fn split_by_chars(text: &str, range: Range<usize>, budget: usize, out: &mut Vec<Range<usize>>) {
    let mut start = range.start;
    let mut count = 0;
    for (offset, _) in text[range.clone()].char_indices() {
        if count == budget {
            let cut = range.start + offset;
            out.push(start..cut);
            start = cut;
            count = 0;
        }
        count += 1;
    }
    if start < range.end {
        out.push(start..range.end);
    }
}

/// Greedily merge contiguous pieces into windows of at most `budget` characters.
fn merge_pieces(text: &str, pieces: &[Range<usize>], budget: usize) -> Vec<Range<usize>> {
    let mut windows = Vec::new();
    let mut current: Option<(Range<usize>, usize)> = None;

    for piece in pieces {
        let len = char_len(&text[piece.clone()]);
        match current.as_mut() {
            Some((window, window_len)) if *window_len + len <= budget => {
                window.end = piece.end;
                *window_len += len;
            }
            _ => {
                if let Some((window, _)) = current.take() {
                    windows.push(window);
                }
                current = Some((piece.clone(), len));
            }
        }
    }

    if let Some((window, _)) = current {
        windows.push(window);
    }
    windows
}

/// Byte offset `chars` characters before `start`, clamped to 0.
fn back_off(text: &str, start: usize, chars: usize) -> usize {
    text[..start].char_indices().rev().take(chars).last().map(|(i, _)| i).unwrap_or(start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_blank_input_yield_no_chunks() {
        let chunker = RecursiveChunker::default();
        assert!(chunker.split("").is_empty());
        assert!(chunker.split("  \n\n \t").is_empty());
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunker = RecursiveChunker::default();
        assert_eq!(chunker.split("hello world"), vec!["hello world".to_string()]);
    }

    #[test]
    fn paragraphs_are_preferred_boundaries() {
        let chunker = RecursiveChunker::new(30, 5);
        let text = "First paragraph here.\n\nSecond paragraph here.";
        let spans = chunker.split_spans(text);
        assert_eq!(spans.len(), 2);
        // The first chunk ends exactly at the paragraph break.
        assert_eq!(&text[spans[0].clone()], "First paragraph here.\n\n");
        // The second carries the last five characters of the first.
        assert_eq!(&text[spans[1].clone()], "re.\n\nSecond paragraph here.");
    }

    #[test]
    fn character_fallback_bounds_unbroken_text() {
        let chunker = RecursiveChunker::new(10, 2);
        let text = "a".repeat(35);
        let chunks = chunker.split(&text);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
    }

    #[test]
    fn multibyte_text_is_cut_on_char_boundaries() {
        let chunker = RecursiveChunker::new(8, 3);
        let text = "üößäöüßäöüßäöüßä€€€€€€";
        let chunks = chunker.split(text);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 8));
    }

    #[test]
    fn overlap_is_clamped_below_chunk_size() {
        let chunker = RecursiveChunker::new(10, 50);
        assert_eq!(chunker.chunk_overlap(), 9);
        let chunks = chunker.split(&"word ".repeat(20));
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
    }

    #[test]
    fn back_off_clamps_at_start() {
        assert_eq!(back_off("abcdef", 4, 2), 2);
        assert_eq!(back_off("abcdef", 2, 10), 0);
        assert_eq!(back_off("abcdef", 3, 0), 3);
    }
}
