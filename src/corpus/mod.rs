//! Corpus gathering
//!
//! Walks the content tree (chapter folders plus global documents, or an
//! arbitrary folder) and turns source files into embedding-ready chunks with
//! provenance payloads.

pub mod gather;

pub use gather::{gather_chapters, gather_folder, ChapterSelection};

use crate::text::TextChunker;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Provenance metadata for a gathered source document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentPayload {
    /// Chapter number, when the document came from a chapter folder
    pub chapter: Option<u32>,

    /// Scene identifier (file stem) for scene documents
    pub scene: Option<String>,

    /// Structural kind: `scene`, `media`, `doc` or `file`
    pub kind: String,

    /// Source file name
    pub source: String,

    /// Absolute path of the source file
    pub path: String,

    /// Path relative to the gathered root; stable across machines
    pub path_rel: String,

    /// Last modification time, seconds since the Unix epoch
    pub mtime: i64,

    /// Source file size in bytes
    pub size: u64,
}

/// A gathered source document before chunking
#[derive(Debug, Clone)]
pub struct Document {
    /// Full text of the source file
    pub text: String,

    /// Provenance metadata shared by all chunks of this document
    pub payload: DocumentPayload,
}

/// One embedding-ready chunk with its payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentChunk {
    /// Chunk text, bounded by the configured `max_chars`
    pub text: String,

    /// Document provenance
    #[serde(flatten)]
    pub payload: DocumentPayload,

    /// Position of this chunk within its document
    pub chunk_index: usize,

    /// SHA-256 of the chunk text, hex encoded
    pub hash: String,
}

/// Split gathered documents into chunks, attaching per-chunk indices and
/// content hashes. Document order is preserved; chunks of one document stay
/// contiguous.
pub fn chunk_documents(documents: &[Document], chunker: &TextChunker) -> Vec<DocumentChunk> {
    let mut chunks = Vec::new();
    for document in documents {
        for (chunk_index, text) in chunker.chunk(&document.text).into_iter().enumerate() {
            let hash = hex_digest(&text);
            chunks.push(DocumentChunk {
                text,
                payload: document.payload.clone(),
                chunk_index,
                hash,
            });
        }
    }
    chunks
}

/// SHA-256 hex digest of a string
pub fn hex_digest(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
