//! Retrieved document chunk

use serde::{Deserialize, Serialize};

/// A chunk of an ingested document, as returned by retrieval and reranking.
///
/// Ordering within a list carries ranking significance (best-first). Chunks
/// are immutable once retrieved; rerankers may attach score annotations but
/// never rewrite text or source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Chunk content text
    #[serde(default)]
    pub text: String,
    /// Source label (document path, citation, etc.)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Similarity score from the vector store, when available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    /// Relevance score attached by a reranking stage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rerank_score: Option<f32>,
}

impl DocumentChunk {
    /// Create a new chunk with content text only
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: None,
            score: None,
            rerank_score: None,
        }
    }

    /// Set the source label
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the retrieval similarity score
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    /// Set the reranker relevance score
    pub fn with_rerank_score(mut self, score: f32) -> Self {
        self.rerank_score = Some(score);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_builder() {
        let chunk = DocumentChunk::new("Consideration is required for a valid contract.")
            .with_source("contracts/basics.md")
            .with_score(0.82)
            .with_rerank_score(0.97);

        assert_eq!(chunk.text, "Consideration is required for a valid contract.");
        assert_eq!(chunk.source.as_deref(), Some("contracts/basics.md"));
        assert_eq!(chunk.score, Some(0.82));
        assert_eq!(chunk.rerank_score, Some(0.97));
    }

    #[test]
    fn test_chunk_deserializes_with_missing_fields() {
        let chunk: DocumentChunk = serde_json::from_str(r#"{"text": "hello"}"#).unwrap();

        assert_eq!(chunk.text, "hello");
        assert!(chunk.source.is_none());
        assert!(chunk.score.is_none());
    }
}
