//! Recursive text chunker with page provenance
//!
//! Splits page-tagged document text into overlapping chunks bounded by a
//! configured character size. Chunk boundaries prefer semantic separators
//! (paragraph break, newline, sentence end, word gap) and fall back to a
//! hard character cut when no separator lands inside the window. Each chunk
//! records the page number of its first character, and consecutive chunks
//! from the same page share a fixed-size overlap so context survives the cut.

use crate::types::{Chunk, Page};
use tracing::warn;

/// Separator hierarchy tried in order when choosing a chunk boundary
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Splits page text into bounded, overlapping chunks
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    /// Create a chunker; overlap is clamped below the chunk size so the
    /// window always advances.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        let chunk_overlap = chunk_overlap.min(chunk_size.saturating_sub(1));
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Chunk an ordered sequence of pages.
    ///
    /// Returns an empty vec (and logs) rather than failing when the input
    /// has no usable text.
    pub fn chunk(&self, pages: &[Page], source_id: &str) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for page in pages {
            if page.text.is_empty() {
                continue;
            }
            for text in self.split_page(&page.text) {
                chunks.push(Chunk {
                    text,
                    page: page.page_number,
                    source_id: source_id.to_string(),
                });
            }
        }

        if chunks.is_empty() {
            warn!(source = source_id, "no chunks produced from document text");
        }
        chunks
    }

    /// Split one page's text into chunk strings.
    ///
    /// Works over character indices so multi-byte text never gets cut
    /// mid-codepoint. Successive windows start `chunk_overlap` characters
    /// before the previous window's end.
    fn split_page(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let mut pieces = Vec::new();
        let mut start = 0usize;

        while start < total {
            let window_end = (start + self.chunk_size).min(total);
            let end = if window_end == total {
                total
            } else {
                self.boundary_within(&chars, start, window_end)
            };

            pieces.push(chars[start..end].iter().collect());

            if end == total {
                break;
            }
            // Overlapping restart; end > start + overlap is guaranteed by
            // the boundary floor, so the window always advances.
            start = end - self.chunk_overlap;
        }

        pieces
    }

    /// Pick a cut position in `(floor, window_end]` ending on the best
    /// available separator; hard character cut when none fits.
    ///
    /// The floor sits past the overlap region and at half the window, which
    /// keeps chunks from degenerating when separators cluster early.
    fn boundary_within(&self, chars: &[char], start: usize, window_end: usize) -> usize {
        let floor = (start + self.chunk_size / 2).max(start + self.chunk_overlap + 1);
        if floor >= window_end {
            return window_end;
        }
        let window: String = chars[start..window_end].iter().collect();

        for sep in SEPARATORS {
            // rfind gives the latest occurrence; the separator stays with
            // the left chunk so concatenation loses nothing.
            if let Some(byte_pos) = window.rfind(sep) {
                let char_pos = window[..byte_pos].chars().count();
                let cut = start + char_pos + sep.chars().count();
                if cut > floor && cut <= window_end {
                    return cut;
                }
            }
        }
        window_end
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(800, 80)
    }
}
