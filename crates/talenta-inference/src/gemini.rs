//! Gemini inference backend implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, info, instrument, warn};

use talenta_core::{EmbeddingBackend, Error, GenerationBackend, Result};

use crate::config::GeminiConfig;
use crate::response::extract_text;

/// Gemini inference backend for generation and embeddings.
pub struct GeminiBackend {
    client: Client,
    config: GeminiConfig,
}

impl GeminiBackend {
    /// Create a new Gemini backend with the given configuration.
    pub fn new(config: GeminiConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        info!(
            subsystem = "inference",
            component = "gemini",
            gen_model = %config.gen_model,
            embed_model = %config.embed_model,
            key_configured = config.api_key.is_some(),
            "Initializing Gemini backend"
        );

        Self { client, config }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        Self::new(GeminiConfig::from_env())
    }

    /// Whether an API key is configured. Without one every call fails,
    /// so the pipeline skips the model path entirely.
    pub fn has_api_key(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("GEMINI_API_KEY is not set".to_string()))
    }

    /// Map a non-success provider status to an error. 429 and 503 are the
    /// conditions the provider documents as retryable.
    fn status_error(status: u16, body: String) -> Error {
        match status {
            429 | 503 => Error::Transient {
                status,
                message: body,
            },
            _ => Error::Inference(format!("Provider returned {}: {}", status, body)),
        }
    }
}

#[derive(Serialize)]
struct GeneratePart {
    text: String,
}

#[derive(Serialize)]
struct GenerateContent {
    role: String,
    parts: Vec<GeneratePart>,
}

/// Request payload for the `generateContent` endpoint.
#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<GenerateContent>,
}

#[derive(Serialize)]
struct EmbedContent {
    parts: Vec<GeneratePart>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequestItem {
    model: String,
    content: EmbedContent,
    task_type: String,
    output_dimensionality: usize,
}

/// Request payload for the `batchEmbedContents` endpoint.
#[derive(Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedRequestItem>,
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    #[instrument(skip(self, prompt), fields(subsystem = "inference", component = "gemini", op = "generate", model = %self.config.gen_model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let key = self.api_key()?;
        let start = Instant::now();

        let request = GenerateRequest {
            contents: vec![GenerateContent {
                role: "user".to_string(),
                parts: vec![GeneratePart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.gen_model
        );
        let response = self
            .client
            .post(&url)
            .query(&[("key", key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Inference(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::status_error(status, body));
        }

        let body: JsonValue = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse response: {}", e)))?;

        // Empty text after all extraction strategies counts as a failed call.
        let content = extract_text(&body)
            .ok_or_else(|| Error::Inference("Empty response from model".to_string()))?;

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            response_len = content.len(),
            duration_ms = elapsed,
            "Generation complete"
        );
        if elapsed > 30000 {
            warn!(
                duration_ms = elapsed,
                prompt_len = prompt.len(),
                slow = true,
                "Slow generation operation"
            );
        }
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.config.gen_model
    }
}

#[async_trait]
impl EmbeddingBackend for GeminiBackend {
    #[instrument(skip(self, texts), fields(subsystem = "inference", component = "gemini", op = "embed_texts", model = %self.config.embed_model, input_count = texts.len()))]
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let key = self.api_key().map_err(|e| Error::Embedding(e.to_string()))?;
        let start = Instant::now();

        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedRequestItem {
                    model: format!("models/{}", self.config.embed_model),
                    content: EmbedContent {
                        parts: vec![GeneratePart { text: text.clone() }],
                    },
                    task_type: "RETRIEVAL_DOCUMENT".to_string(),
                    output_dimensionality: self.config.embed_dimension,
                })
                .collect(),
        };

        let url = format!(
            "{}/models/{}:batchEmbedContents",
            self.config.base_url, self.config.embed_model
        );
        let response = self
            .client
            .post(&url)
            .query(&[("key", key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!(
                "Provider returned {}: {}",
                status, body
            )));
        }

        let body: JsonValue = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to parse response: {}", e)))?;

        let embeddings = body
            .get("embeddings")
            .and_then(|e| e.as_array())
            .ok_or_else(|| Error::Embedding("Response missing embeddings".to_string()))?;

        // The provider sometimes ignores the requested dimensionality and
        // returns full-width vectors; crop to the expected prefix.
        let vectors: Vec<Vec<f32>> = embeddings
            .iter()
            .map(|e| {
                let values = e
                    .get("values")
                    .and_then(|v| v.as_array())
                    .ok_or_else(|| Error::Embedding("Embedding missing values".to_string()))?;
                let mut vector: Vec<f32> = values
                    .iter()
                    .filter_map(|v| v.as_f64())
                    .map(|v| v as f32)
                    .collect();
                if vector.len() > self.config.embed_dimension {
                    vector.truncate(self.config.embed_dimension);
                }
                Ok(vector)
            })
            .collect::<Result<_>>()?;

        if vectors.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }

        debug!(
            result_count = vectors.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Embedding complete"
        );
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.config.embed_dimension
    }

    fn model_name(&self) -> &str {
        &self.config.embed_model
    }
}
