//! OpenAI embeddings adapter

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::domain::embedding::QueryEmbedder;
use crate::domain::DomainError;

const PROVIDER: &str = "openai";

/// Configuration for the OpenAI embedder
#[derive(Debug, Clone)]
pub struct OpenAiEmbedderConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub dimensions: usize,
}

impl Default for OpenAiEmbedderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Query embedder backed by the OpenAI embeddings API.
///
/// The same model must be used at ingestion time and for the semantic
/// cache, otherwise nearest-neighbor scores are meaningless.
#[derive(Debug)]
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    config: OpenAiEmbedderConfig,
}

impl OpenAiEmbedder {
    pub fn new(config: OpenAiEmbedderConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl QueryEmbedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let body = json!({
            "model": self.config.model,
            "input": [text],
        });

        let response = self
            .client
            .post(self.embeddings_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::provider(PROVIDER, format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::provider(
                PROVIDER,
                format!("HTTP {}: {}", status, body),
            ));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| DomainError::provider(PROVIDER, format!("Malformed response: {}", e)))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| DomainError::provider(PROVIDER, "Response contained no embedding"))
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_embed_returns_first_vector() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "embedding": [0.1, 0.2, 0.3] }]
            })))
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::new(OpenAiEmbedderConfig {
            base_url: server.uri(),
            dimensions: 3,
            ..OpenAiEmbedderConfig::default()
        });

        let vector = embedder.embed("some query").await.unwrap();
        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
        assert_eq!(embedder.dimensions(), 3);
    }

    #[tokio::test]
    async fn test_embed_empty_data_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": [] })),
            )
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::new(OpenAiEmbedderConfig {
            base_url: server.uri(),
            ..OpenAiEmbedderConfig::default()
        });

        assert!(embedder.embed("some query").await.is_err());
    }
}
