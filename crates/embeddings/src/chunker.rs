use akasha_core::{Error, Result};

/// A text chunk with its position in the source document.
///
/// Positions are char offsets, not byte offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    pub content: String,
    pub start_pos: usize,
    pub end_pos: usize,
    pub chunk_id: usize,
    /// Chars shared with the previous chunk (always 0 for the first one).
    pub overlap: usize,
}

impl TextChunk {
    pub fn char_len(&self) -> usize {
        self.end_pos - self.start_pos
    }

    /// The part of this chunk not already covered by the previous chunk.
    pub fn fresh_content(&self) -> &str {
        match self.content.char_indices().nth(self.overlap) {
            Some((byte_idx, _)) => &self.content[byte_idx..],
            None => "",
        }
    }
}

/// Configuration for text chunking, in chars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    pub chunk_size: usize,
    pub overlap_size: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap_size: 0,
        }
    }
}

impl ChunkConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::configuration("chunk_size must be at least 1"));
        }
        if self.overlap_size >= self.chunk_size {
            return Err(Error::configuration(format!(
                "chunk overlap ({}) must be smaller than chunk_size ({})",
                self.overlap_size, self.chunk_size
            )));
        }
        Ok(())
    }

    /// How far back from the window end we look for whitespace before
    /// falling back to a hard cut. Bounded so every non-final chunk is
    /// longer than the overlap.
    pub fn lookback_margin(&self) -> usize {
        (self.chunk_size / 4).min(self.chunk_size - self.overlap_size - 1)
    }
}

/// Text chunker that splits text into overlapping, whitespace-aware chunks
#[derive(Debug, Clone)]
pub struct TextChunker {
    config: ChunkConfig,
}

impl TextChunker {
    pub fn new(config: ChunkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> ChunkConfig {
        self.config
    }

    /// Lazily split `text`. The iterator is `Clone`, so a split can be
    /// restarted from any point without re-validating.
    pub fn split<'a>(&self, text: &'a str) -> Chunks<'a> {
        Chunks {
            text,
            config: self.config,
            start_byte: 0,
            start_char: 0,
            next_id: 0,
            done: text.is_empty(),
        }
    }

    pub fn chunk_text(&self, text: &str) -> Vec<TextChunk> {
        self.split(text).collect()
    }
}

/// Convenience wrapper over [`TextChunker::split`].
pub fn split(text: &str, chunk_size: usize, overlap: usize) -> Result<Chunks<'_>> {
    let chunker = TextChunker::new(ChunkConfig {
        chunk_size,
        overlap_size: overlap,
    })?;
    Ok(chunker.split(text))
}

#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    config: ChunkConfig,
    start_byte: usize,
    start_char: usize,
    next_id: usize,
    done: bool,
}

impl Chunks<'_> {
    /// Number of chars to keep from a full window (`window.len() == chunk_size + 1`).
    fn cut_point(&self, window: &[(usize, char)]) -> usize {
        let size = self.config.chunk_size;

        if window[size].1.is_whitespace() || window[size - 1].1.is_whitespace() {
            return size;
        }

        let margin = self.config.lookback_margin();
        (size - margin..size)
            .rev()
            .find(|&i| window[i].1.is_whitespace())
            .unwrap_or(size)
    }
}

impl Iterator for Chunks<'_> {
    type Item = TextChunk;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let size = self.config.chunk_size;
        let rest = &self.text[self.start_byte..];
        // One char past the window tells us whether the window ends on a boundary
        let window: Vec<(usize, char)> = rest.char_indices().take(size + 1).collect();

        let is_last = window.len() <= size;
        let (chunk_chars, chunk_bytes) = if is_last {
            (window.len(), rest.len())
        } else {
            let cut = self.cut_point(&window);
            (cut, window[cut].0)
        };

        let chunk = TextChunk {
            content: rest[..chunk_bytes].to_string(),
            start_pos: self.start_char,
            end_pos: self.start_char + chunk_chars,
            chunk_id: self.next_id,
            overlap: if self.next_id == 0 {
                0
            } else {
                self.config.overlap_size
            },
        };

        if is_last {
            self.done = true;
        } else {
            let next_start = chunk_chars - self.config.overlap_size;
            self.start_byte += window[next_start].0;
            self.start_char += next_start;
            self.next_id += 1;
        }

        Some(chunk)
    }
}

impl std::iter::FusedIterator for Chunks<'_> {}
