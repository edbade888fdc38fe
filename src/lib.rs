//! # rag-indexer
//!
//! A resumable corpus indexer: gather an annotated text tree (chapter folders
//! plus global documents, or any folder), chunk it, embed the chunks through
//! an OpenAI-compatible or Ollama HTTP API, and upsert deterministic points
//! into a Qdrant collection. A checkpoint file makes interrupted runs cheap
//! to rerun and completed runs idempotent.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rag_indexer::{Config, Indexer, IndexerOptions};
//! use rag_indexer::corpus::{gather_chapters, ChapterSelection};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(None)?;
//!     let documents = gather_chapters(&config.content, ChapterSelection::All)?;
//!
//!     let indexer = Indexer::new(config, IndexerOptions::default());
//!     let stats = indexer.run(documents, "chapters:all").await?;
//!     println!("indexed {} chunks", stats.indexed_chunks);
//!
//!     Ok(())
//! }
//! ```

// Core modules
pub mod api;
pub mod checkpoint;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod qdrant;
pub mod text;

// Re-export main API types
pub use api::{Indexer, IndexerOptions, IndexingStats};
pub use config::Config;
pub use error::{IndexerError, Result};

// Re-export commonly used types
pub use corpus::{ChapterSelection, DocumentChunk};
pub use qdrant::stable_point_id;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_imports() {
        // Ensure all major types can be imported
        let _config = Config::default();
        let _options = IndexerOptions::default();
    }
}
