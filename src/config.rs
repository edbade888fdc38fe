//! Configuration for rag-indexer
//!
//! Configuration is resolved in three layers: hardcoded defaults, an optional
//! JSON config file, and environment-variable overrides for a fixed set of
//! keys. Reusable logic never sees absolute paths or connection strings
//! directly; everything flows through these structs.

use crate::error::{IndexerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Qdrant connection settings
    pub qdrant: QdrantConfig,

    /// Embedding API settings
    pub embedding: EmbeddingConfig,

    /// Chunking parameters
    pub chunking: ChunkingConfig,

    /// Corpus layout settings
    pub content: ContentConfig,
}

/// Qdrant connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QdrantConfig {
    /// Base URL of the Qdrant REST API
    pub url: String,

    /// Optional `api-key` header value
    pub api_key: Option<String>,

    /// Target collection name
    pub collection: String,

    /// Distance metric used when the collection is created
    pub distance: String,

    /// Per-request timeout in seconds
    pub timeout_sec: u64,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:6333".to_string(),
            api_key: None,
            collection: "corpus".to_string(),
            distance: "Cosine".to_string(),
            timeout_sec: 60,
        }
    }
}

/// Which embedding API shape the endpoint speaks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingApi {
    /// OpenAI-compatible `/embeddings`: batch input, `{data:[{embedding}]}`
    OpenAi,
    /// Ollama `/api/embeddings`: one `{model, prompt}` request per text
    Ollama,
    /// Ollama `/api/embed`: batch input, `{embeddings:[...]}`
    OllamaBatch,
}

/// Embedding API settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Full endpoint URL, e.g. `http://127.0.0.1:11434/api/embeddings`
    pub endpoint: String,

    /// Model identifier passed to the server
    pub model: String,

    /// Explicit API flavor; when unset the endpoint URL is sniffed
    pub api: Option<EmbeddingApi>,

    /// Optional bearer token for OpenAI-compatible servers
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_sec: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:11434/api/embeddings".to_string(),
            model: "nomic-embed-text".to_string(),
            api: None,
            api_key: None,
            timeout_sec: 120,
        }
    }
}

impl EmbeddingConfig {
    /// Resolve the API flavor: the explicit `api` field wins, otherwise the
    /// endpoint URL is sniffed for the Ollama path shapes.
    pub fn resolved_api(&self) -> EmbeddingApi {
        if let Some(api) = self.api {
            return api;
        }
        if self.endpoint.contains("/api/embed") && !self.endpoint.contains("/api/embeddings") {
            EmbeddingApi::OllamaBatch
        } else if self.endpoint.contains("/api/embeddings") {
            EmbeddingApi::Ollama
        } else {
            EmbeddingApi::OpenAi
        }
    }
}

/// Chunking parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters
    pub max_chars: usize,

    /// Characters of trailing context repeated at hard-split boundaries
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: 1800,
            overlap: 200,
        }
    }
}

/// Corpus layout settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContentConfig {
    /// Corpus root directory; chapter folders live under `<root>/chapters`
    pub root: String,

    /// Include media-sidecar metadata files when gathering chapters
    pub include_media: bool,

    /// Include root-level repository documents when gathering chapters
    pub include_repo_docs: bool,

    /// Extensions considered repository documents (lowercase, no dot)
    pub repo_extensions: Vec<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            root: ".".to_string(),
            include_media: true,
            include_repo_docs: true,
            repo_extensions: vec!["md".to_string(), "json".to_string(), "csv".to_string()],
        }
    }
}

impl Config {
    /// Load configuration: defaults, then the JSON file if given, then
    /// environment overrides. A missing file path is an error; a `None`
    /// path just means defaults + environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p).map_err(|e| {
                    IndexerError::Config(format!("cannot read config {}: {}", p.display(), e))
                })?;
                serde_json::from_str(&raw).map_err(|e| {
                    IndexerError::Config(format!("malformed config {}: {}", p.display(), e))
                })?
            }
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment-variable overrides for the fixed key set.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("QDRANT_URL") {
            self.qdrant.url = v;
        }
        if let Ok(v) = std::env::var("QDRANT_API_KEY") {
            self.qdrant.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("QDRANT_COLLECTION") {
            self.qdrant.collection = v;
        }
        if let Ok(v) = std::env::var("QDRANT_TIMEOUT_SEC") {
            if let Ok(secs) = v.parse() {
                self.qdrant.timeout_sec = secs;
            } else {
                log::warn!("ignoring non-numeric QDRANT_TIMEOUT_SEC={}", v);
            }
        }
        if let Ok(v) = std::env::var("EMBEDDING_ENDPOINT") {
            self.embedding.endpoint = v;
        }
        if let Ok(v) = std::env::var("EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Ok(v) = std::env::var("EMBEDDING_API_KEY") {
            self.embedding.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("EMBEDDING_API") {
            match v.as_str() {
                "openai" | "open_ai" => self.embedding.api = Some(EmbeddingApi::OpenAi),
                "ollama" => self.embedding.api = Some(EmbeddingApi::Ollama),
                "ollama_batch" | "ollama-batch" => {
                    self.embedding.api = Some(EmbeddingApi::OllamaBatch)
                }
                other => log::warn!("ignoring unknown EMBEDDING_API={}", other),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.chunking.max_chars, 1800);
        assert_eq!(config.chunking.overlap, 200);
        assert_eq!(config.qdrant.distance, "Cosine");
        assert!(config.content.include_media);
    }

    #[test]
    fn test_partial_file_merges_over_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"qdrant": {{"collection": "enoch"}}, "chunking": {{"max_chars": 900}}}}"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.qdrant.collection, "enoch");
        assert_eq!(config.chunking.max_chars, 900);
        // Untouched fields keep their defaults
        assert_eq!(config.chunking.overlap, 200);
        assert_eq!(config.qdrant.url, "http://127.0.0.1:6333");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();

        let result = Config::load(Some(file.path()));
        assert!(matches!(result, Err(IndexerError::Config(_))));
    }

    #[test]
    fn test_api_sniffing() {
        let mut config = EmbeddingConfig {
            endpoint: "http://localhost:11434/api/embeddings".to_string(),
            ..Default::default()
        };
        assert_eq!(config.resolved_api(), EmbeddingApi::Ollama);

        config.endpoint = "http://localhost:11434/api/embed".to_string();
        assert_eq!(config.resolved_api(), EmbeddingApi::OllamaBatch);

        config.endpoint = "https://api.openai.com/v1/embeddings".to_string();
        assert_eq!(config.resolved_api(), EmbeddingApi::OpenAi);

        // Explicit field wins over URL sniffing
        config.api = Some(EmbeddingApi::Ollama);
        assert_eq!(config.resolved_api(), EmbeddingApi::Ollama);
    }
}
