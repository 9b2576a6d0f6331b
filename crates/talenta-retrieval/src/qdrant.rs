//! Qdrant REST client implementing the rubric vector index.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info, instrument, warn};

use talenta_core::{defaults, Error, Result, RubricHit, RubricIndex, RubricKind, RubricPoint};

/// Timeout for index requests (seconds).
const INDEX_TIMEOUT_SECS: u64 = 30;

/// Configuration for the Qdrant index client.
#[derive(Debug, Clone)]
pub struct QdrantConfig {
    /// Base URL of the Qdrant instance.
    pub url: String,
    /// Optional API key sent as `api-key` header.
    pub api_key: Option<String>,
    /// Collection holding rubric points.
    pub collection: String,
    /// Vector dimensionality of the collection.
    pub dimension: usize,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: defaults::QDRANT_URL.to_string(),
            api_key: None,
            collection: defaults::QDRANT_COLLECTION.to_string(),
            dimension: defaults::EMBED_DIMENSION,
        }
    }
}

impl QdrantConfig {
    /// Create from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `QDRANT_URL` | `http://localhost:6333` | Qdrant endpoint |
    /// | `QDRANT_API_KEY` | unset | API key header |
    /// | `QDRANT_COLLECTION` | `rubrics` | Collection name |
    /// | `GEMINI_EMBED_DIM` | `768` | Vector dimensionality |
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("QDRANT_URL")
                .unwrap_or_else(|_| defaults::QDRANT_URL.to_string()),
            api_key: std::env::var("QDRANT_API_KEY").ok().filter(|k| !k.is_empty()),
            collection: std::env::var("QDRANT_COLLECTION")
                .unwrap_or_else(|_| defaults::QDRANT_COLLECTION.to_string()),
            dimension: std::env::var("GEMINI_EMBED_DIM")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(defaults::EMBED_DIMENSION),
        }
    }
}

/// Qdrant-backed rubric index.
pub struct QdrantIndex {
    client: Client,
    config: QdrantConfig,
}

impl QdrantIndex {
    /// Create a new index client with the given configuration.
    pub fn new(config: QdrantConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(INDEX_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        Self::new(QdrantConfig::from_env())
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{}", self.config.url, path));
        if let Some(ref key) = self.config.api_key {
            builder = builder.header("api-key", key);
        }
        builder
    }

    fn collection_path(&self, suffix: &str) -> String {
        format!("/collections/{}{}", self.config.collection, suffix)
    }

    /// Create a payload index on `field`, tolerating an already-existing one.
    async fn ensure_payload_index(&self, field: &str) -> Result<()> {
        let response = self
            .request(reqwest::Method::PUT, &self.collection_path("/index"))
            .json(&json!({
                "field_name": field,
                "field_schema": "keyword",
            }))
            .send()
            .await
            .map_err(|e| Error::Search(format!("Payload index request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() || status.as_u16() == 409 {
            debug!(field, "Payload index ensured");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            warn!(field, %status, body, "Failed to create payload index");
            Err(Error::Search(format!(
                "Payload index creation returned {}: {}",
                status, body
            )))
        }
    }
}

#[async_trait]
impl RubricIndex for QdrantIndex {
    #[instrument(skip(self), fields(subsystem = "retrieval", component = "qdrant", op = "ensure_collection", collection = %self.config.collection))]
    async fn ensure_collection(&self) -> Result<()> {
        let response = self
            .request(reqwest::Method::GET, &self.collection_path(""))
            .send()
            .await
            .map_err(|e| Error::Search(format!("Collection lookup failed: {}", e)))?;

        match response.status().as_u16() {
            200..=299 => {
                info!("Collection already exists");
            }
            404 => {
                info!(dimension = self.config.dimension, "Creating collection");
                let create = self
                    .request(reqwest::Method::PUT, &self.collection_path(""))
                    .json(&json!({
                        "vectors": {
                            "size": self.config.dimension,
                            "distance": "Cosine",
                        }
                    }))
                    .send()
                    .await
                    .map_err(|e| Error::Search(format!("Collection create failed: {}", e)))?;

                if !create.status().is_success() {
                    let status = create.status();
                    let body = create.text().await.unwrap_or_default();
                    return Err(Error::Search(format!(
                        "Collection creation returned {}: {}",
                        status, body
                    )));
                }
                info!("Collection created");
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::Search(format!(
                    "Collection lookup returned {}: {}",
                    status, body
                )));
            }
        }

        self.ensure_payload_index("kind").await?;
        self.ensure_payload_index("slug").await
    }

    #[instrument(skip_all, fields(subsystem = "retrieval", component = "qdrant", op = "search", kind = %kind, limit = limit))]
    async fn search(
        &self,
        vector: &[f32],
        limit: usize,
        kind: RubricKind,
    ) -> Result<Vec<RubricHit>> {
        let response = self
            .request(
                reqwest::Method::POST,
                &self.collection_path("/points/search"),
            )
            .json(&json!({
                "vector": vector,
                "limit": limit,
                "with_payload": true,
                "filter": {
                    "must": [
                        {"key": "kind", "match": {"value": kind.as_str()}}
                    ]
                }
            }))
            .send()
            .await
            .map_err(|e| Error::Search(format!("Search request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Search(format!(
                "Search returned {}: {}",
                status, body
            )));
        }

        let body: JsonValue = response
            .json()
            .await
            .map_err(|e| Error::Search(format!("Failed to parse search response: {}", e)))?;

        let hits = body
            .get("result")
            .and_then(|r| r.as_array())
            .map(|results| {
                results
                    .iter()
                    .filter_map(|hit| {
                        let text = hit.get("payload")?.get("text")?.as_str()?;
                        if text.is_empty() {
                            return None;
                        }
                        Some(RubricHit {
                            text: text.to_string(),
                            score: hit.get("score").and_then(|s| s.as_f64()).unwrap_or(0.0)
                                as f32,
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        debug!(result_count = hits.len(), "Search complete");
        Ok(hits)
    }

    #[instrument(skip(self, points), fields(subsystem = "retrieval", component = "qdrant", op = "upsert", input_count = points.len()))]
    async fn upsert(&self, points: &[RubricPoint]) -> Result<()> {
        if points.is_empty() {
            warn!("Upsert called with no points");
            return Ok(());
        }

        let payload_points: Vec<JsonValue> = points
            .iter()
            .map(|p| {
                json!({
                    "id": p.id,
                    "vector": p.vector,
                    "payload": {
                        "kind": p.kind.as_str(),
                        "slug": p.slug,
                        "text": p.text,
                    }
                })
            })
            .collect();

        let response = self
            .request(
                reqwest::Method::PUT,
                &format!("{}?wait=true", self.collection_path("/points")),
            )
            .json(&json!({ "points": payload_points }))
            .send()
            .await
            .map_err(|e| Error::Search(format!("Upsert request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Search(format!(
                "Upsert returned {}: {}",
                status, body
            )));
        }

        info!(result_count = points.len(), "Upserted rubric points");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = QdrantConfig::default();
        assert_eq!(config.url, "http://localhost:6333");
        assert_eq!(config.collection, "rubrics");
        assert_eq!(config.dimension, 768);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_collection_paths() {
        let index = QdrantIndex::new(QdrantConfig::default());
        assert_eq!(index.collection_path(""), "/collections/rubrics");
        assert_eq!(
            index.collection_path("/points/search"),
            "/collections/rubrics/points/search"
        );
    }
}
