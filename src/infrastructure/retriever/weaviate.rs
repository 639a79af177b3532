//! Weaviate vector store adapter

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::domain::document::DocumentChunk;
use crate::domain::embedding::QueryEmbedder;
use crate::domain::retriever::Retriever;
use crate::domain::DomainError;

/// Configuration for the Weaviate retriever
#[derive(Debug, Clone)]
pub struct WeaviateRetrieverConfig {
    pub url: String,
    pub collection: String,
}

impl Default for WeaviateRetrieverConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            collection: "LegalChunk".to_string(),
        }
    }
}

/// Dense retriever over a Weaviate collection.
///
/// Queries are embedded with the configured [`QueryEmbedder`] and searched
/// via GraphQL `nearVector`. Returned distances are converted to cosine
/// similarity scores.
#[derive(Debug)]
pub struct WeaviateRetriever {
    client: reqwest::Client,
    config: WeaviateRetrieverConfig,
    embedder: Arc<dyn QueryEmbedder>,
}

impl WeaviateRetriever {
    pub fn new(config: WeaviateRetrieverConfig, embedder: Arc<dyn QueryEmbedder>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            embedder,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.url.trim_end_matches('/'), path)
    }

    fn parse_hits(&self, body: &Value) -> Result<Vec<DocumentChunk>, DomainError> {
        if let Some(errors) = body.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                return Err(DomainError::retrieval(format!(
                    "Weaviate GraphQL error: {}",
                    errors[0]
                )));
            }
        }

        let objects = body
            .pointer(&format!("/data/Get/{}", self.config.collection))
            .and_then(Value::as_array)
            .ok_or_else(|| DomainError::retrieval("Missing Get payload in Weaviate response"))?;

        let mut chunks = Vec::with_capacity(objects.len());
        for object in objects {
            let text = object
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let mut chunk = DocumentChunk::new(text);
            if let Some(source) = object.get("source").and_then(Value::as_str) {
                chunk = chunk.with_source(source);
            }
            if let Some(distance) = object
                .pointer("/_additional/distance")
                .and_then(Value::as_f64)
            {
                chunk = chunk.with_score(1.0 - distance as f32);
            }
            chunks.push(chunk);
        }

        Ok(chunks)
    }
}

#[async_trait]
impl Retriever for WeaviateRetriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<DocumentChunk>, DomainError> {
        let vector = self.embedder.embed(query).await?;
        let vector_json = serde_json::to_string(&vector)
            .map_err(|e| DomainError::retrieval(format!("Failed to encode query vector: {}", e)))?;

        let graphql = format!(
            "{{ Get {{ {} (nearVector: {{ vector: {} }}, limit: {}) {{ text source _additional {{ distance }} }} }} }}",
            self.config.collection, vector_json, top_k
        );

        let response = self
            .client
            .post(self.endpoint("/v1/graphql"))
            .json(&json!({ "query": graphql }))
            .send()
            .await
            .map_err(|e| DomainError::retrieval(format!("Weaviate request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(DomainError::retrieval(format!(
                "Weaviate returned HTTP {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| DomainError::retrieval(format!("Malformed Weaviate response: {}", e)))?;

        let chunks = self.parse_hits(&body)?;
        debug!(count = chunks.len(), top_k, "Weaviate retrieval complete");
        Ok(chunks)
    }

    async fn batch_load(&self, chunks: Vec<DocumentChunk>) -> Result<usize, DomainError> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let mut objects = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let vector = self.embedder.embed(&chunk.text).await?;
            objects.push(json!({
                "class": self.config.collection,
                "properties": {
                    "text": chunk.text,
                    "source": chunk.source,
                },
                "vector": vector,
            }));
        }

        let response = self
            .client
            .post(self.endpoint("/v1/batch/objects"))
            .json(&json!({ "objects": objects }))
            .send()
            .await
            .map_err(|e| DomainError::retrieval(format!("Weaviate batch failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(DomainError::retrieval(format!(
                "Weaviate batch returned HTTP {}",
                response.status()
            )));
        }

        Ok(chunks.len())
    }

    async fn health_check(&self) -> Result<(), DomainError> {
        let response = self
            .client
            .get(self.endpoint("/v1/.well-known/ready"))
            .send()
            .await
            .map_err(|e| DomainError::retrieval(format!("Weaviate unreachable: {}", e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(DomainError::retrieval(format!(
                "Weaviate not ready: HTTP {}",
                response.status()
            )))
        }
    }

    fn backend_name(&self) -> &'static str {
        "weaviate"
    }
}
