//! Text chunking for embedding
//!
//! Documents are split on blank-line paragraphs and greedily packed into
//! chunks bounded by `max_chars`. A single paragraph longer than the limit is
//! hard-split into fixed-size character windows, with `overlap` characters of
//! trailing context repeated at each boundary. Purely character-count driven,
//! no sentence or token awareness.

use crate::config::ChunkingConfig;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Text chunker for processing documents into bounded segments
pub struct TextChunker {
    config: ChunkingConfig,
    paragraph_regex: Regex,
}

impl TextChunker {
    /// Create a new chunker with the given configuration
    pub fn new(config: ChunkingConfig) -> Self {
        // The pattern is a fixed literal, so compilation cannot fail
        let paragraph_regex = Regex::new(r"\n\s*\n").unwrap();
        Self {
            config,
            paragraph_regex,
        }
    }

    /// Create a chunker with default configuration
    pub fn with_default_config() -> Self {
        Self::new(ChunkingConfig::default())
    }

    /// Split text into paragraph-aggregated chunks of at most `max_chars`
    /// characters each.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let text = self.preprocess_text(text);
        if text.is_empty() {
            return Vec::new();
        }

        let max_chars = self.config.max_chars.max(1);
        let overlap = self.config.overlap.min(max_chars.saturating_sub(1));

        let mut chunks = Vec::new();
        let mut buffer = String::new();
        let mut buffer_chars = 0usize;

        for paragraph in self.paragraph_regex.split(&text) {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }
            let paragraph_chars = paragraph.chars().count();

            // Flush the buffer when the next paragraph would not fit
            let separator_chars = if buffer.is_empty() { 0 } else { 2 };
            if !buffer.is_empty() && buffer_chars + separator_chars + paragraph_chars > max_chars {
                chunks.push(std::mem::take(&mut buffer));
                buffer_chars = 0;
            }

            if paragraph_chars > max_chars {
                // An oversized paragraph cannot be packed; flush whatever is
                // buffered and hard-split it into overlapping windows.
                if !buffer.is_empty() {
                    chunks.push(std::mem::take(&mut buffer));
                    buffer_chars = 0;
                }
                chunks.extend(hard_split(paragraph, max_chars, overlap));
            } else if buffer.is_empty() {
                buffer.push_str(paragraph);
                buffer_chars = paragraph_chars;
            } else {
                buffer.push_str("\n\n");
                buffer.push_str(paragraph);
                buffer_chars += 2 + paragraph_chars;
            }
        }

        if !buffer.is_empty() {
            chunks.push(buffer);
        }

        chunks
    }

    /// Normalize line endings and Unicode form before chunking
    fn preprocess_text(&self, text: &str) -> String {
        let normalized: String = text.nfc().collect();
        normalized.replace("\r\n", "\n").trim().to_string()
    }
}

/// Chunk text with explicit parameters. Convenience wrapper around
/// [`TextChunker`].
pub fn chunk_text(text: &str, max_chars: usize, overlap: usize) -> Vec<String> {
    TextChunker::new(ChunkingConfig { max_chars, overlap }).chunk(text)
}

/// Hard-split an oversized paragraph into `max_chars` character windows, each
/// subsequent window starting `overlap` characters before the previous
/// window's end.
fn hard_split(paragraph: &str, max_chars: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = paragraph.chars().collect();
    let step = max_chars.saturating_sub(overlap).max(1);

    let mut windows = Vec::new();
    let mut start = 0usize;
    while start < chars.len() {
        let end = (start + max_chars).min(chars.len());
        windows.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }
    windows
}
