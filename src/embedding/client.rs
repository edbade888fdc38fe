//! HTTP embedding client
//!
//! The API flavor comes from the explicit config field, falling back to
//! endpoint-URL sniffing. Each flavor has its own typed response parser; no
//! shape guessing on the response side. Ollama's single-text endpoint gets
//! one request per text, the batch flavors send the whole list at once.

use crate::config::{EmbeddingApi, EmbeddingConfig};
use crate::error::{IndexerError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Text sent to determine the collection's vector dimensionality
const DIMENSION_PROBE: &str = "dimension probe";

/// Client for embedding HTTP APIs
pub struct EmbeddingClient {
    http: reqwest::Client,
    config: EmbeddingConfig,
    api: EmbeddingApi,
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Serialize)]
struct PromptRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// OpenAI-compatible response: `{data:[{embedding,index}]}` with an
/// `{embeddings:[...]}` variant some servers use
#[derive(Deserialize)]
struct OpenAiEmbeddingResponse {
    #[serde(default)]
    data: Vec<OpenAiEmbeddingData>,
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

#[derive(Deserialize)]
struct OpenAiEmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

/// Ollama `/api/embeddings` response for a single prompt
#[derive(Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

/// Ollama `/api/embed` batch response
#[derive(Deserialize)]
struct OllamaBatchResponse {
    embeddings: Vec<Vec<f32>>,
}

impl EmbeddingClient {
    /// Build a client from embedding configuration
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        if config.endpoint.trim().is_empty() {
            return Err(IndexerError::Config(
                "embedding endpoint is not configured".to_string(),
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_sec))
            .build()?;
        let api = config.resolved_api();
        Ok(Self { http, config, api })
    }

    /// Which API flavor this client speaks
    pub fn api(&self) -> EmbeddingApi {
        self.api
    }

    /// Embed a list of texts, returning one vector per input in order.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = match self.api {
            EmbeddingApi::OpenAi => self.embed_openai(texts).await?,
            EmbeddingApi::OllamaBatch => self.embed_ollama_batch(texts).await?,
            EmbeddingApi::Ollama => {
                let mut vectors = Vec::with_capacity(texts.len());
                for text in texts {
                    vectors.push(self.embed_ollama_single(text).await?);
                }
                vectors
            }
        };
        if vectors.len() != texts.len() {
            return Err(IndexerError::Embedding(format!(
                "server returned {} embeddings for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }
        Ok(vectors)
    }

    /// Embed a probe string and return the vector dimensionality.
    pub async fn probe_dimension(&self) -> Result<usize> {
        let vectors = self.embed(&[DIMENSION_PROBE.to_string()]).await?;
        let dim = vectors.first().map(|v| v.len()).unwrap_or(0);
        if dim == 0 {
            return Err(IndexerError::Embedding(
                "dimension probe returned an empty vector".to_string(),
            ));
        }
        log::info!("embedding dimension: {}", dim);
        Ok(dim)
    }

    async fn embed_openai(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = BatchRequest {
            model: &self.config.model,
            input: texts,
        };
        let mut builder = self.http.post(&self.config.endpoint).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }
        let body = self.send(builder).await?;
        parse_openai_response(&body)
    }

    async fn embed_ollama_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = BatchRequest {
            model: &self.config.model,
            input: texts,
        };
        let body = self.send(self.http.post(&self.config.endpoint).json(&request)).await?;
        parse_ollama_batch_response(&body)
    }

    async fn embed_ollama_single(&self, text: &str) -> Result<Vec<f32>> {
        let request = PromptRequest {
            model: &self.config.model,
            prompt: text,
        };
        let body = self.send(self.http.post(&self.config.endpoint).json(&request)).await?;
        parse_ollama_response(&body)
    }

    /// Send a request and return the response body, mapping non-2xx statuses
    /// into embedding errors that keep the server's diagnostics.
    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<String> {
        let response = builder.send().await.map_err(|e| {
            IndexerError::Embedding(format!(
                "request to {} failed: {}",
                self.config.endpoint, e
            ))
        })?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(IndexerError::Embedding(describe_failure(status, &body)));
        }
        Ok(body)
    }
}

fn parse_openai_response(body: &str) -> Result<Vec<Vec<f32>>> {
    let parsed: OpenAiEmbeddingResponse = serde_json::from_str(body)
        .map_err(|e| IndexerError::Embedding(format!("malformed OpenAI-style response: {}", e)))?;
    if !parsed.data.is_empty() {
        let mut data = parsed.data;
        data.sort_by_key(|d| d.index.unwrap_or(0));
        return Ok(data.into_iter().map(|d| d.embedding).collect());
    }
    if !parsed.embeddings.is_empty() {
        return Ok(parsed.embeddings);
    }
    Err(IndexerError::Embedding(
        "response contained no embeddings".to_string(),
    ))
}

fn parse_ollama_batch_response(body: &str) -> Result<Vec<Vec<f32>>> {
    let parsed: OllamaBatchResponse = serde_json::from_str(body)
        .map_err(|e| IndexerError::Embedding(format!("malformed /api/embed response: {}", e)))?;
    if parsed.embeddings.is_empty() {
        return Err(IndexerError::Embedding(
            "response contained no embeddings".to_string(),
        ));
    }
    Ok(parsed.embeddings)
}

fn parse_ollama_response(body: &str) -> Result<Vec<f32>> {
    let parsed: OllamaEmbeddingResponse = serde_json::from_str(body).map_err(|e| {
        IndexerError::Embedding(format!("malformed /api/embeddings response: {}", e))
    })?;
    if parsed.embedding.is_empty() {
        return Err(IndexerError::Embedding(
            "response contained an empty embedding".to_string(),
        ));
    }
    Ok(parsed.embedding)
}

/// Turn an HTTP failure into a message. A "pooling type none" body means the
/// server is configured without an embedding pooling layer, which would
/// otherwise surface as an opaque 500.
fn describe_failure(status: reqwest::StatusCode, body: &str) -> String {
    if body.to_lowercase().contains("pooling type none") {
        return format!(
            "embedding server has no pooling configured ({}); \
             restart it with a pooling type (e.g. --pooling mean) \
             or pick a model that embeds natively",
            status
        );
    }
    format!("embedding request failed ({}): {}", status, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_openai_data_shape() {
        let body = r#"{"data":[{"embedding":[0.1,0.2],"index":1},{"embedding":[0.3,0.4],"index":0}]}"#;
        let vectors = parse_openai_response(body).unwrap();
        // Sorted back into request order by index
        assert_eq!(vectors, vec![vec![0.3, 0.4], vec![0.1, 0.2]]);
    }

    #[test]
    fn test_parse_openai_embeddings_shape() {
        let body = r#"{"embeddings":[[1.0,2.0],[3.0,4.0]]}"#;
        let vectors = parse_openai_response(body).unwrap();
        assert_eq!(vectors.len(), 2);
    }

    #[test]
    fn test_parse_openai_empty_is_error() {
        assert!(parse_openai_response(r#"{"data":[]}"#).is_err());
        assert!(parse_openai_response("not json").is_err());
    }

    #[test]
    fn test_parse_ollama_shapes() {
        let single = parse_ollama_response(r#"{"embedding":[0.5,0.6,0.7]}"#).unwrap();
        assert_eq!(single.len(), 3);
        assert!(parse_ollama_response(r#"{"embedding":[]}"#).is_err());

        let batch = parse_ollama_batch_response(r#"{"embeddings":[[0.1],[0.2]]}"#).unwrap();
        assert_eq!(batch.len(), 2);
        assert!(parse_ollama_batch_response(r#"{"embeddings":[]}"#).is_err());
    }

    #[test]
    fn test_pooling_hint_rewrite() {
        let msg = describe_failure(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":"Pooling type NONE is not supported"}"#,
        );
        assert!(msg.contains("pooling"));
        assert!(msg.contains("--pooling mean"));

        let msg = describe_failure(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        assert!(msg.contains("502"));
        assert!(msg.contains("upstream down"));
    }

    #[test]
    fn test_client_rejects_empty_endpoint() {
        let config = EmbeddingConfig {
            endpoint: "  ".to_string(),
            ..Default::default()
        };
        assert!(EmbeddingClient::new(config).is_err());
    }

    #[tokio::test]
    async fn test_embed_empty_input_is_noop() {
        let client = EmbeddingClient::new(EmbeddingConfig::default()).unwrap();
        let vectors = client.embed(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }
}
