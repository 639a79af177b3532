use serde::Deserialize;

use crate::domain::cache::SemanticCacheConfig;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub retrieval: RetrievalConfig,
    pub cache: SemanticCacheConfig,
    pub weaviate: WeaviateConfig,
    pub openai: OpenAiConfig,
    pub cohere: CohereConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of candidates pulled from the vector store
    pub top_k: usize,
    /// Candidates kept by the first rerank stage
    pub first_stage_top_k: usize,
    /// Optional character budget for the assembled context
    pub context_max_chars: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeaviateConfig {
    pub url: String,
    pub collection: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub embedding_model: String,
    pub embedding_dim: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CohereConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub top_n: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 25,
            first_stage_top_k: 5,
            context_max_chars: None,
        }
    }
}

impl Default for WeaviateConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            collection: "LegalChunk".to_string(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dim: 1536,
        }
    }
}

impl Default for CohereConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.cohere.com".to_string(),
            model: "rerank-english-v3.0".to_string(),
            top_n: 3,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_pipeline_expectations() {
        let config = AppConfig::default();

        assert_eq!(config.retrieval.top_k, 25);
        assert_eq!(config.retrieval.first_stage_top_k, 5);
        assert_eq!(config.cache.similarity_threshold, 0.95);
        assert_eq!(config.cache.ttl_secs, 3600);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_cache_disabled_by_default() {
        let config = AppConfig::default();
        assert!(config.cache.redis_url.is_empty());
    }
}
