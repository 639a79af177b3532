//! Semantic cache trait and configuration
//!
//! A semantic cache is keyed by embedding-space proximity rather than exact
//! key equality: a lookup returns the stored response of the nearest stored
//! embedding when its similarity clears the configured threshold.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Configuration for the semantic response cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticCacheConfig {
    /// Backing store URL; empty means the cache is disabled
    #[serde(default)]
    pub redis_url: String,

    /// Minimum nearest-neighbor similarity for a hit (0.0 to 1.0)
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Time-to-live for cached entries in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Embedding dimension; must match the configured embedding model
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,

    /// Key prefix for cache entries
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Name of the similarity index
    #[serde(default = "default_index_name")]
    pub index_name: String,
}

fn default_similarity_threshold() -> f32 {
    0.95
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_embedding_dim() -> usize {
    1536
}

fn default_key_prefix() -> String {
    "rag_cache:".to_string()
}

fn default_index_name() -> String {
    "rag_cache_idx".to_string()
}

impl Default for SemanticCacheConfig {
    fn default() -> Self {
        Self {
            redis_url: String::new(),
            similarity_threshold: default_similarity_threshold(),
            ttl_secs: default_ttl_secs(),
            embedding_dim: default_embedding_dim(),
            key_prefix: default_key_prefix(),
            index_name: default_index_name(),
        }
    }
}

impl SemanticCacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get TTL as Duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Set the backing store URL
    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = url.into();
        self
    }

    /// Set the similarity threshold, clamped to [0, 1]
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_secs = ttl.as_secs();
        self
    }

    /// Set the embedding dimension
    pub fn with_embedding_dim(mut self, dim: usize) -> Self {
        self.embedding_dim = dim;
        self
    }
}

/// Trait for semantic response caching.
///
/// Implementations are best-effort by contract: errors they return are
/// treated by callers as a miss (`get`) or a skipped write (`set`/`flush`),
/// never surfaced to the user. A disabled cache reports absence from `get`
/// and turns all other operations into no-ops without touching any backend.
#[async_trait]
pub trait SemanticCache: Send + Sync + Debug {
    /// Whether a backing store was configured at construction
    fn enabled(&self) -> bool;

    /// Find the stored response nearest to `embedding`, if its similarity
    /// clears the configured threshold
    async fn get(&self, embedding: &[f32]) -> Result<Option<String>, DomainError>;

    /// Insert `(embedding, response)` under a fresh key with the configured
    /// TTL; never overwrites prior entries
    async fn set(&self, embedding: &[f32], response: &str) -> Result<(), DomainError>;

    /// Delete all cache entries and drop the similarity index
    async fn flush(&self) -> Result<(), DomainError>;

    /// Release the backing connection; idempotent
    async fn close(&self);
}

#[cfg(test)]
pub mod mock {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Scriptable cache double recording every interaction
    #[derive(Debug, Default)]
    pub struct MockSemanticCache {
        response: Option<String>,
        get_error: Option<String>,
        set_error: Option<String>,
        get_calls: AtomicUsize,
        set_calls: AtomicUsize,
        stored: Mutex<Vec<String>>,
    }

    impl MockSemanticCache {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_response(mut self, response: impl Into<String>) -> Self {
            self.response = Some(response.into());
            self
        }

        pub fn with_get_error(mut self, error: impl Into<String>) -> Self {
            self.get_error = Some(error.into());
            self
        }

        pub fn with_set_error(mut self, error: impl Into<String>) -> Self {
            self.set_error = Some(error.into());
            self
        }

        pub fn get_calls(&self) -> usize {
            self.get_calls.load(Ordering::SeqCst)
        }

        pub fn set_calls(&self) -> usize {
            self.set_calls.load(Ordering::SeqCst)
        }

        pub fn stored_responses(&self) -> Vec<String> {
            self.stored.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SemanticCache for MockSemanticCache {
        fn enabled(&self) -> bool {
            true
        }

        async fn get(&self, _embedding: &[f32]) -> Result<Option<String>, DomainError> {
            self.get_calls.fetch_add(1, Ordering::SeqCst);

            if let Some(ref error) = self.get_error {
                return Err(DomainError::cache(error));
            }

            Ok(self.response.clone())
        }

        async fn set(&self, _embedding: &[f32], response: &str) -> Result<(), DomainError> {
            self.set_calls.fetch_add(1, Ordering::SeqCst);

            if let Some(ref error) = self.set_error {
                return Err(DomainError::cache(error));
            }

            self.stored.lock().unwrap().push(response.to_string());
            Ok(())
        }

        async fn flush(&self) -> Result<(), DomainError> {
            self.stored.lock().unwrap().clear();
            Ok(())
        }

        async fn close(&self) {}
    }
}
