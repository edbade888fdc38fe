//! Embedding API clients
//!
//! One client wraps the two embedding API shapes the indexer talks to:
//! OpenAI-compatible `/embeddings` endpoints and Ollama's single-text
//! `/api/embeddings` / batch `/api/embed` endpoints.

pub mod client;

pub use client::EmbeddingClient;
