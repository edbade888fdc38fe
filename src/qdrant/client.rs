//! Qdrant REST client
//!
//! Thin client over the collection and point endpoints the indexer needs:
//! `GET/PUT/DELETE /collections/{name}` and
//! `PUT /collections/{name}/points?wait=true`. Any non-2xx response is an
//! error that aborts the run; the checkpoint makes reruns cheap instead of
//! retrying here.

use crate::config::QdrantConfig;
use crate::error::{IndexerError, Result};
use crate::qdrant::Point;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Client for the Qdrant REST API
pub struct QdrantClient {
    http: reqwest::Client,
    base_url: String,
    collection: String,
}

#[derive(Deserialize)]
struct CollectionInfoResponse {
    result: CollectionInfo,
}

/// Subset of collection info the indexer cares about
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionInfo {
    /// Number of points currently stored
    #[serde(default)]
    pub points_count: u64,

    /// Collection status reported by Qdrant (`green`, `yellow`, ...)
    #[serde(default)]
    pub status: Option<String>,
}

impl QdrantClient {
    /// Build a client from Qdrant configuration
    pub fn new(config: &QdrantConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|_| IndexerError::Config("invalid Qdrant API key".to_string()))?;
            headers.insert(HeaderName::from_static("api-key"), value);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_sec))
            .default_headers(headers)
            .build()?;
        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
        })
    }

    /// Collection name this client targets
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Make sure the collection exists with the given vector size. `reset`
    /// deletes any existing collection first; otherwise an existing
    /// collection is left untouched.
    pub async fn ensure_collection(
        &self,
        vector_size: usize,
        distance: &str,
        reset: bool,
    ) -> Result<()> {
        if reset {
            log::warn!("resetting collection {}", self.collection);
            self.delete_collection().await?;
        }
        if self.collection_exists().await? {
            log::info!("collection {} already exists", self.collection);
            return Ok(());
        }
        let url = self.collection_url();
        let body = json!({
            "vectors": {
                "size": vector_size,
                "distance": distance,
            }
        });
        let response = self.http.put(&url).json(&body).send().await?;
        let status = response.status();
        if status.is_success() || status == StatusCode::CONFLICT {
            log::info!(
                "created collection {} (size={}, distance={})",
                self.collection,
                vector_size,
                distance
            );
            Ok(())
        } else {
            Err(self.api_error("create collection", status, response).await)
        }
    }

    /// True when the collection exists
    pub async fn collection_exists(&self) -> Result<bool> {
        let response = self.http.get(self.collection_url()).send().await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(self.api_error("get collection", status, response).await),
        }
    }

    /// Delete the collection; deleting a missing collection is not an error.
    pub async fn delete_collection(&self) -> Result<()> {
        let response = self.http.delete(self.collection_url()).send().await?;
        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(self.api_error("delete collection", status, response).await)
        }
    }

    /// Collection info including the current point count.
    pub async fn collection_info(&self) -> Result<CollectionInfo> {
        let response = self.http.get(self.collection_url()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(self.api_error("get collection", status, response).await);
        }
        let parsed: CollectionInfoResponse = response
            .json()
            .await
            .map_err(|e| IndexerError::Qdrant(format!("malformed collection info: {}", e)))?;
        Ok(parsed.result)
    }

    /// Current point count; zero when the collection does not exist.
    pub async fn count_points(&self) -> Result<u64> {
        if !self.collection_exists().await? {
            return Ok(0);
        }
        Ok(self.collection_info().await?.points_count)
    }

    /// Upsert a batch of points with `wait=true`, so a successful return
    /// means the points are durable before the checkpoint advances.
    pub async fn upsert_points(&self, points: &[Point]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        let url = format!("{}/points", self.collection_url());
        let body = json!({ "points": points });
        let response = self
            .http
            .put(&url)
            .query(&[("wait", "true")])
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            log::debug!("upserted {} points into {}", points.len(), self.collection);
            Ok(())
        } else {
            Err(self.api_error("upsert points", status, response).await)
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.collection)
    }

    async fn api_error(
        &self,
        operation: &str,
        status: StatusCode,
        response: reqwest::Response,
    ) -> IndexerError {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<body unavailable>".to_string());
        IndexerError::Qdrant(format!("{} failed ({}): {}", operation, status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_url_trims_trailing_slash() {
        let config = QdrantConfig {
            url: "http://localhost:6333/".to_string(),
            collection: "corpus".to_string(),
            ..Default::default()
        };
        let client = QdrantClient::new(&config).unwrap();
        assert_eq!(
            client.collection_url(),
            "http://localhost:6333/collections/corpus"
        );
    }

    #[test]
    fn test_invalid_api_key_is_config_error() {
        let config = QdrantConfig {
            api_key: Some("bad\nkey".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            QdrantClient::new(&config),
            Err(IndexerError::Config(_))
        ));
    }

    #[test]
    fn test_collection_info_parsing() {
        let body = r#"{"result":{"points_count":128,"status":"green","config":{}}}"#;
        let parsed: CollectionInfoResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.result.points_count, 128);
        assert_eq!(parsed.result.status.as_deref(), Some("green"));
    }
}
