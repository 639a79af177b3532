//! In-memory semantic cache
//!
//! Linear-scan cosine search over a HashMap. Suitable for tests and
//! single-process deployments; production uses [`super::RedisSemanticCache`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::cache::SemanticCache;
use crate::domain::embedding::cosine_similarity;
use crate::domain::DomainError;

#[derive(Debug, Clone)]
struct StoredEntry {
    embedding: Vec<f32>,
    response: String,
    expires_at: u64,
}

impl StoredEntry {
    fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// In-memory semantic cache with TTL expiry checked on read
#[derive(Debug)]
pub struct InMemorySemanticCache {
    entries: RwLock<HashMap<String, StoredEntry>>,
    similarity_threshold: f32,
    ttl: Duration,
    closed: AtomicBool,
}

impl InMemorySemanticCache {
    pub fn new(similarity_threshold: f32, ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            similarity_threshold: similarity_threshold.clamp(0.0, 1.0),
            ttl,
            closed: AtomicBool::new(false),
        }
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn active(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SemanticCache for InMemorySemanticCache {
    fn enabled(&self) -> bool {
        true
    }

    async fn get(&self, embedding: &[f32]) -> Result<Option<String>, DomainError> {
        if !self.active() {
            return Ok(None);
        }

        let now = unix_now();
        let entries = self
            .entries
            .read()
            .map_err(|_| DomainError::cache("cache lock poisoned"))?;

        let best = entries
            .values()
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| (cosine_similarity(embedding, &entry.embedding), entry))
            .max_by(|(a, _), (b, _)| a.total_cmp(b));

        Ok(best
            .filter(|(similarity, _)| *similarity >= self.similarity_threshold)
            .map(|(_, entry)| entry.response.clone()))
    }

    async fn set(&self, embedding: &[f32], response: &str) -> Result<(), DomainError> {
        if !self.active() {
            return Ok(());
        }

        let entry = StoredEntry {
            embedding: embedding.to_vec(),
            response: response.to_string(),
            expires_at: unix_now() + self.ttl.as_secs(),
        };

        self.entries
            .write()
            .map_err(|_| DomainError::cache("cache lock poisoned"))?
            .insert(Uuid::new_v4().simple().to_string(), entry);

        Ok(())
    }

    async fn flush(&self) -> Result<(), DomainError> {
        if !self.active() {
            return Ok(());
        }

        self.entries
            .write()
            .map_err(|_| DomainError::cache("cache lock poisoned"))?
            .clear();

        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> InMemorySemanticCache {
        InMemorySemanticCache::new(0.95, Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn test_roundtrip_identical_embedding() {
        let cache = cache();
        let embedding = vec![0.3, 0.5, 0.2];

        cache.set(&embedding, "stored answer").await.unwrap();

        assert_eq!(
            cache.get(&embedding).await.unwrap().as_deref(),
            Some("stored answer")
        );
    }

    #[tokio::test]
    async fn test_dissimilar_embedding_misses() {
        let cache = cache();

        cache.set(&[1.0, 0.0], "stored answer").await.unwrap();

        assert_eq!(cache.get(&[0.0, 1.0]).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_nearest_of_several_wins() {
        let cache = InMemorySemanticCache::new(0.5, Duration::from_secs(3600));

        cache.set(&[1.0, 0.0], "exact").await.unwrap();
        cache.set(&[0.9, 0.1], "close").await.unwrap();

        assert_eq!(cache.get(&[1.0, 0.0]).await.unwrap().as_deref(), Some("exact"));
    }

    #[tokio::test]
    async fn test_set_never_overwrites() {
        let cache = cache();
        let embedding = vec![1.0, 0.0];

        cache.set(&embedding, "first").await.unwrap();
        cache.set(&embedding, "second").await.unwrap();

        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_expired_entries_are_ignored() {
        let cache = InMemorySemanticCache::new(0.95, Duration::from_secs(0));
        let embedding = vec![1.0, 0.0];

        cache.set(&embedding, "short lived").await.unwrap();

        assert_eq!(cache.get(&embedding).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_flush_removes_all_entries() {
        let cache = cache();

        cache.set(&[1.0, 0.0], "a").await.unwrap();
        cache.set(&[0.0, 1.0], "b").await.unwrap();
        cache.flush().await.unwrap();

        assert!(cache.is_empty());
        assert_eq!(cache.get(&[1.0, 0.0]).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_close_twice_then_disabled_semantics() {
        let cache = cache();
        let embedding = vec![1.0, 0.0];

        cache.set(&embedding, "stored").await.unwrap();
        cache.close().await;
        cache.close().await;

        assert_eq!(cache.get(&embedding).await.unwrap(), None);
        cache.set(&embedding, "ignored").await.unwrap();
        assert_eq!(cache.len(), 1);
    }
}
