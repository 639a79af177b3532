//! Cohere rerank API adapter

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::domain::document::DocumentChunk;
use crate::domain::reranker::Reranker;
use crate::domain::DomainError;

const PROVIDER: &str = "cohere";

/// Configuration for the Cohere reranker
#[derive(Debug, Clone)]
pub struct CohereRerankerConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub top_n: usize,
}

impl Default for CohereRerankerConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.cohere.com".to_string(),
            model: "rerank-english-v3.0".to_string(),
            top_n: 3,
        }
    }
}

/// Second-stage reranker backed by the Cohere `/v2/rerank` endpoint.
///
/// Result order is Cohere's relevance order; each kept chunk gets the
/// returned relevance score attached.
#[derive(Debug)]
pub struct CohereReranker {
    client: reqwest::Client,
    config: CohereRerankerConfig,
}

impl CohereReranker {
    pub fn new(config: CohereRerankerConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn rerank_url(&self) -> String {
        format!("{}/v2/rerank", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Reranker for CohereReranker {
    async fn rerank(
        &self,
        query: &str,
        chunks: Vec<DocumentChunk>,
    ) -> Result<Vec<DocumentChunk>, DomainError> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let documents: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let body = json!({
            "model": self.config.model,
            "query": query,
            "documents": documents,
            "top_n": self.config.top_n,
        });

        let response = self
            .client
            .post(self.rerank_url())
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

        let parsed: RerankResponse = response
            .json()
            .await
            .map_err(|e| DomainError::provider(PROVIDER, format!("Malformed response: {}", e)))?;

        debug!(kept = parsed.results.len(), "Cohere rerank complete");

        let mut reranked = Vec::with_capacity(parsed.results.len());
        for result in parsed.results {
            let chunk = chunks.get(result.index).cloned().ok_or_else(|| {
                DomainError::provider(
                    PROVIDER,
                    format!("Rerank result index {} out of range", result.index),
                )
            })?;
            reranked.push(chunk.with_rerank_score(result.relevance_score));
        }

        Ok(reranked)
    }

    fn stage_name(&self) -> &'static str {
        PROVIDER
    }
}

#[derive(Debug, Deserialize)]
struct RerankResponse {
    results: Vec<RerankResult>,
}

#[derive(Debug, Deserialize)]
struct RerankResult {
    index: usize,
    relevance_score: f32,
}
