//! Text processing module
//!
//! Provides paragraph-aggregated chunking with character-count overlap.

pub mod chunking;

pub use chunking::{chunk_text, TextChunker};
