use serde::{Deserialize, Serialize};

use crate::config::ChunkingConfig;
use crate::error::{RagError, Result};

/// A window of consecutive words from the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
    /// Position of the first word in the whole document.
    pub start_word: usize,
    pub word_count: usize,
}

/// Splits text into fixed-size word windows that overlap by `overlap` words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::Config("chunk size must be at least 1 word".to_string()));
        }
        if overlap >= chunk_size {
            return Err(RagError::Config(format!(
                "overlap ({}) must be smaller than chunk size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self { chunk_size, overlap })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }

    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let words: Vec<&str> = text.split_whitespace().collect();

        (0..words.len())
            .step_by(self.stride())
            .enumerate()
            .map(|(index, start)| {
                let end = (start + self.chunk_size).min(words.len());
                Chunk {
                    index,
                    text: words[start..end].join(" "),
                    start_word: start,
                    word_count: end - start,
                }
            })
            .collect()
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_words(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunker = TextChunker::default();
        let chunks = chunker.chunk("Hello   world.\nSecond line");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Hello world. Second line");
        assert_eq!(chunks[0].word_count, 4);
    }

    #[test]
    fn test_empty_text() {
        let chunker = TextChunker::default();
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk(" \n\t ").is_empty());
    }

    #[test]
    fn test_chunk_count_is_ceil_of_stride() {
        for (words, size, overlap) in [(100, 10, 2), (7, 3, 1), (1000, 500, 50), (9, 9, 0), (10, 4, 3)] {
            let chunker = TextChunker::new(size, overlap).unwrap();
            let chunks = chunker.chunk(&numbered_words(words));
            let stride = size - overlap;
            assert_eq!(chunks.len(), (words + stride - 1) / stride, "{} {} {}", words, size, overlap);
        }
    }

    #[test]
    fn test_consecutive_chunks_share_overlap() {
        let chunker = TextChunker::new(10, 3).unwrap();
        let chunks = chunker.chunk(&numbered_words(40));

        for pair in chunks.windows(2) {
            let first: Vec<&str> = pair[0].text.split(' ').collect();
            let second: Vec<&str> = pair[1].text.split(' ').collect();
            if first.len() == 10 && second.len() >= 3 {
                assert_eq!(&first[7..], &second[..3]);
            }
        }
    }

    #[test]
    fn test_final_chunk_may_be_short() {
        let chunker = TextChunker::new(4, 1).unwrap();
        let chunks = chunker.chunk(&numbered_words(8));
        // starts: 0, 3, 6
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].text, "w6 w7");
        assert_eq!(chunks[2].start_word, 6);
        assert_eq!(chunks[2].word_count, 2);
    }

    #[test]
    fn test_indices_follow_text_order() {
        let chunker = TextChunker::new(5, 2).unwrap();
        let chunks = chunker.chunk(&numbered_words(20));
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(chunk.start_word, i * 3);
        }
    }

    #[test]
    fn test_overlap_not_smaller_than_size_fails() {
        assert!(matches!(TextChunker::new(10, 10), Err(RagError::Config(_))));
        assert!(matches!(TextChunker::new(10, 11), Err(RagError::Config(_))));
        assert!(matches!(TextChunker::new(0, 0), Err(RagError::Config(_))));
    }

    #[test]
    fn test_from_config() {
        let chunker = TextChunker::from_config(&ChunkingConfig::default()).unwrap();
        assert_eq!(chunker.chunk_size(), 500);
        assert_eq!(chunker.overlap(), 50);
        assert_eq!(chunker.stride(), 450);
    }
}
