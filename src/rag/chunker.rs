use crate::types::{AppError, Result};

/// A window of words taken from a document.
///
/// `start` and `end` are word offsets, `end` exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Splits text into overlapping fixed-size word windows.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    /// Fails with `InvalidConfiguration` unless `chunk_overlap < chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_overlap >= chunk_size {
            return Err(AppError::InvalidConfiguration(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Chunk texts only.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        self.chunk_with_offsets(text)
            .into_iter()
            .map(|c| c.text)
            .collect()
    }

    pub fn chunk_with_offsets(&self, text: &str) -> Vec<Chunk> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let step = self.chunk_size - self.chunk_overlap;

        (0..words.len())
            .step_by(step)
            .map(|start| {
                let end = (start + self.chunk_size).min(words.len());
                Chunk {
                    start,
                    end,
                    text: words[start..end].join(" "),
                }
            })
            .collect()
    }
}
