//! High-level indexing API
//!
//! [`Indexer`] ties the pipeline together: chunk gathered documents, probe
//! the embedding dimension, ensure the collection, then embed and upsert in
//! batches with a checkpoint after each one.

pub mod indexer;

pub use indexer::{Indexer, IndexerOptions, IndexingStats};
