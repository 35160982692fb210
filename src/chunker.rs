//! Text chunking with overlapping windows.
//!
//! Splits page text into windows of at most `chunk_size` characters with
//! exactly `chunk_overlap` characters shared between consecutive windows of
//! the same segment. Cuts prefer sentence or line boundaries; when none is
//! in range the window is cut hard at `chunk_size`.

use crate::error::{Error, Result};
use crate::loader::PageSegment;

/// A text window ready for embedding, with its source reference.
///
/// Each segment is chunked independently, so a chunk always belongs to
/// exactly one page. `position` is the chunk's index within its document.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub text: String,
    pub page: u32,
    pub source: String,
    pub position: usize,
}

#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    /// Create a chunker. The overlap must be strictly smaller than the
    /// chunk size, otherwise windows could never advance.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("chunk_size must be positive".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Split a sequence of page segments into chunks, preserving order.
    pub fn split_segments(&self, segments: &[PageSegment]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut position = 0;

        for segment in segments {
            for text in self.split_text(&segment.text) {
                chunks.push(Chunk {
                    text,
                    page: segment.page,
                    source: segment.source.clone(),
                    position,
                });
                position += 1;
            }
        }

        chunks
    }

    /// Split one text into overlapping windows of at most `chunk_size`
    /// characters (`char` count, so multibyte text never splits a code
    /// point). Whitespace-only input produces no windows.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();
        if chars.len() <= self.chunk_size {
            return vec![text.to_string()];
        }

        let mut windows = Vec::new();
        let mut start = 0;

        loop {
            let remaining = chars.len() - start;
            if remaining <= self.chunk_size {
                windows.push(chars[start..].iter().collect());
                break;
            }

            let cut = self.find_cut(&chars[start..start + self.chunk_size]);
            windows.push(chars[start..start + cut].iter().collect());

            // The next window re-reads exactly `chunk_overlap` characters.
            start += cut - self.chunk_overlap;
        }

        windows
    }

    /// Pick a cut point within a full-size window, searching backwards for
    /// a sentence or line boundary. The search never descends to or below
    /// `chunk_overlap`, so every window consumes fresh text.
    fn find_cut(&self, window: &[char]) -> usize {
        let floor = (self.chunk_size / 2).max(self.chunk_overlap);
        for i in (floor..window.len()).rev() {
            if matches!(window[i], '.' | '!' | '?' | '\n' | '。') {
                return i + 1;
            }
        }
        window.len()
    }
}
