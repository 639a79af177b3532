//! Query embedding trait and vector math

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;

/// Trait for turning query text into a fixed-dimension embedding vector.
///
/// The dimension must match both the embedding model used at ingestion time
/// and the semantic cache's configured dimension; a mismatch is a deployment
/// configuration error and is not handled defensively downstream.
#[async_trait]
pub trait QueryEmbedder: Send + Sync + Debug {
    /// Embed the given text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError>;

    /// Get the embedding dimension
    fn dimensions(&self) -> usize;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}

/// Cosine similarity between two vectors, 0.0 when either has zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical() {
        let v = vec![0.1, 0.2, 0.3];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_cosine_similarity_zero_norm() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
