//! Gemini backend configuration.

use talenta_core::defaults;

/// Configuration for the Gemini backend.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key. `None` means the model path is unavailable and callers
    /// must degrade (the pipeline falls back to heuristic scoring).
    pub api_key: Option<String>,
    /// Base URL for the generative language API.
    pub base_url: String,
    /// Generation model name.
    pub gen_model: String,
    /// Embedding model name.
    pub embed_model: String,
    /// Expected embedding dimension; longer vectors are prefix-truncated.
    pub embed_dimension: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: defaults::GEMINI_BASE_URL.to_string(),
            gen_model: defaults::GEN_MODEL.to_string(),
            embed_model: defaults::EMBED_MODEL.to_string(),
            embed_dimension: defaults::EMBED_DIMENSION,
            timeout_secs: defaults::GEN_TIMEOUT_SECS,
        }
    }
}

impl GeminiConfig {
    /// Create from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `GEMINI_API_KEY` | unset | API key; unset disables the model path |
    /// | `GEMINI_BASE_URL` | Google endpoint | API base URL |
    /// | `GEMINI_MODEL` | `gemini-2.5-flash` | Generation model |
    /// | `GEMINI_EMBED_MODEL` | `gemini-embedding-001` | Embedding model |
    /// | `GEMINI_EMBED_DIM` | `768` | Embedding dimension |
    /// | `GEMINI_TIMEOUT_SECS` | `120` | Request timeout |
    pub fn from_env() -> Self {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());
        let base_url = std::env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| defaults::GEMINI_BASE_URL.to_string());
        let gen_model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| defaults::GEN_MODEL.to_string());
        let embed_model = std::env::var("GEMINI_EMBED_MODEL")
            .unwrap_or_else(|_| defaults::EMBED_MODEL.to_string());
        let embed_dimension = std::env::var("GEMINI_EMBED_DIM")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::EMBED_DIMENSION);
        let timeout_secs = std::env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::GEN_TIMEOUT_SECS);

        Self {
            api_key,
            base_url,
            gen_model,
            embed_model,
            embed_dimension,
            timeout_secs,
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the generation model.
    pub fn with_gen_model(mut self, model: impl Into<String>) -> Self {
        self.gen_model = model.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = GeminiConfig::default();
        assert!(config.api_key.is_none());
        assert_eq!(config.gen_model, "gemini-2.5-flash");
        assert_eq!(config.embed_model, "gemini-embedding-001");
        assert_eq!(config.embed_dimension, 768);
    }

    #[test]
    fn test_config_builder() {
        let config = GeminiConfig::default()
            .with_api_key("test-key")
            .with_base_url("http://localhost:9999")
            .with_gen_model("gemini-2.5-pro");

        assert_eq!(config.api_key.as_deref(), Some("test-key"));
        assert_eq!(config.base_url, "http://localhost:9999");
        assert_eq!(config.gen_model, "gemini-2.5-pro");
    }
}
