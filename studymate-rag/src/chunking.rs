//! Page-aware document chunking.
//!
//! Converts a sequence of parsed elements (each tagged with a page number)
//! into fixed-size, page-attributed [`Chunk`]s. Windowing restarts on each
//! page so chunks never span page boundaries, while the chunk index is a
//! single counter shared across the whole document.

use std::collections::BTreeMap;

use crate::document::{Chunk, ParsedElement};

/// Default chunk window size in characters.
pub const DEFAULT_WINDOW_SIZE: usize = 500;

/// Windows whose trimmed length does not exceed this are dropped as noise.
pub const DEFAULT_MIN_CHUNK_LENGTH: usize = 50;

/// Elements without a declared page number are assigned one page per this
/// many elements, in ordinal order.
const ELEMENTS_PER_FALLBACK_PAGE: usize = 20;

/// Splits parsed elements into page-attributed fixed-size chunks.
///
/// # Example
///
/// ```rust,ignore
/// use studymate_rag::PageAwareChunker;
///
/// let chunker = PageAwareChunker::default();
/// let chunks = chunker.chunk_elements(&elements);
/// ```
#[derive(Debug, Clone)]
pub struct PageAwareChunker {
    window_size: usize,
    min_chunk_length: usize,
}

impl Default for PageAwareChunker {
    fn default() -> Self {
        Self { window_size: DEFAULT_WINDOW_SIZE, min_chunk_length: DEFAULT_MIN_CHUNK_LENGTH }
    }
}

impl PageAwareChunker {
    /// Create a chunker with an explicit window size and minimum chunk length.
    pub fn new(window_size: usize, min_chunk_length: usize) -> Self {
        Self { window_size, min_chunk_length }
    }

    /// Split parsed elements into chunks.
    ///
    /// Elements are grouped by page (declared page number, or
    /// `ordinal / 20 + 1` when absent) and joined with newlines in element
    /// order. Each page's trimmed text is sliced into non-overlapping
    /// windows; windows whose trimmed length does not exceed the minimum
    /// are dropped. Never fails: empty or whitespace-only input yields an
    /// empty result, deterministically.
    pub fn chunk_elements(&self, elements: &[ParsedElement]) -> Vec<Chunk> {
        // BTreeMap keeps page iteration in ascending page order, which
        // makes chunk indices reproducible across runs.
        let mut pages: BTreeMap<u32, String> = BTreeMap::new();

        for (ordinal, element) in elements.iter().enumerate() {
            let page = element
                .page_number
                .filter(|p| *p >= 1)
                .unwrap_or_else(|| (ordinal / ELEMENTS_PER_FALLBACK_PAGE) as u32 + 1);
            let text = pages.entry(page).or_default();
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&element.text);
        }

        let mut chunks = Vec::new();
        let mut chunk_index = 0;

        for (page_number, page_text) in &pages {
            let clean = page_text.trim();
            if clean.is_empty() {
                continue;
            }

            let chars: Vec<char> = clean.chars().collect();
            let mut start = 0;
            while start < chars.len() {
                let end = (start + self.window_size).min(chars.len());
                let window: String = chars[start..end].iter().collect();
                if window.trim().chars().count() > self.min_chunk_length {
                    chunks.push(Chunk {
                        text: window,
                        page_number: *page_number,
                        chunk_index,
                    });
                    chunk_index += 1;
                }
                start = end;
            }
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(text: &str, page: Option<u32>) -> ParsedElement {
        ParsedElement {
            text: text.to_string(),
            page_number: page,
            element_type: "NarrativeText".to_string(),
        }
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let chunker = PageAwareChunker::default();
        assert!(chunker.chunk_elements(&[]).is_empty());
        assert!(chunker.chunk_elements(&[element("   \n  ", Some(1))]).is_empty());
    }

    #[test]
    fn page_shorter_than_minimum_is_dropped() {
        let chunker = PageAwareChunker::default();
        let chunks = chunker.chunk_elements(&[element("too short", Some(1))]);
        assert!(chunks.is_empty());
    }

    #[test]
    fn chunks_never_span_pages() {
        let chunker = PageAwareChunker::default();
        let page_one = "a".repeat(600);
        let page_two = "b".repeat(600);
        let chunks =
            chunker.chunk_elements(&[element(&page_one, Some(1)), element(&page_two, Some(2))]);

        assert_eq!(chunks.len(), 4);
        for chunk in &chunks {
            let first = chunk.text.chars().next().unwrap();
            assert!(chunk.text.chars().all(|c| c == first), "chunk mixes pages");
        }
        assert_eq!(chunks[0].page_number, 1);
        assert_eq!(chunks[2].page_number, 2);
    }

    #[test]
    fn chunk_index_is_global_and_monotonic() {
        let chunker = PageAwareChunker::default();
        let chunks = chunker.chunk_elements(&[
            element(&"a".repeat(1200), Some(1)),
            element(&"b".repeat(700), Some(2)),
        ]);
        let indices: Vec<usize> = chunks.iter().map(|c| c.chunk_index).collect();
        assert_eq!(indices, (0..chunks.len()).collect::<Vec<_>>());
    }

    #[test]
    fn elements_on_the_same_page_are_joined_with_newlines() {
        let chunker = PageAwareChunker::new(500, 10);
        let chunks =
            chunker.chunk_elements(&[element("first sentence", Some(3)), element("second sentence", Some(3))]);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "first sentence\nsecond sentence");
        assert_eq!(chunks[0].page_number, 3);
    }

    #[test]
    fn missing_page_numbers_fall_back_to_ordinal_estimate() {
        let chunker = PageAwareChunker::new(500, 5);
        let elements: Vec<ParsedElement> =
            (0..40).map(|_| element("some element text", None)).collect();
        let chunks = chunker.chunk_elements(&elements);

        let pages: Vec<u32> = chunks.iter().map(|c| c.page_number).collect();
        assert!(pages.contains(&1));
        assert!(pages.contains(&2));
        assert!(!pages.iter().any(|p| *p > 2));
    }

    #[test]
    fn chunking_is_deterministic() {
        let chunker = PageAwareChunker::default();
        let elements = vec![
            element(&"lorem ipsum ".repeat(80), Some(2)),
            element(&"dolor sit amet ".repeat(60), Some(1)),
        ];
        let a = chunker.chunk_elements(&elements);
        let b = chunker.chunk_elements(&elements);
        assert_eq!(a, b);
    }

    #[test]
    fn coverage_is_lossless_except_dropped_tails() {
        let chunker = PageAwareChunker::default();
        let page_text = "k".repeat(1040); // 2 full windows + a 40-char tail
        let chunks = chunker.chunk_elements(&[element(&page_text, Some(1))]);

        assert_eq!(chunks.len(), 2);
        let reconstructed: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert!(page_text.starts_with(&reconstructed));
        // The dropped tail is shorter than the minimum chunk length.
        assert!(page_text.len() - reconstructed.len() < DEFAULT_MIN_CHUNK_LENGTH);
    }
}
