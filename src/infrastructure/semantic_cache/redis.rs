//! Redis Stack (RediSearch) semantic cache
//!
//! Entries are HASHes holding the query embedding as FLOAT32 bytes plus the
//! generated response, indexed by an HNSW vector index with cosine distance.
//! Lookup is a KNN-1 search; RediSearch returns a distance, converted to
//! similarity as `1 - distance`. Every write inserts under a fresh key with
//! a TTL, so near-duplicate queries coexist until expiry.

use std::fmt;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::cache::{SemanticCache, SemanticCacheConfig};
use crate::domain::DomainError;

/// Field holding the embedding bytes in each cache HASH
const VECTOR_FIELD: &str = "vector";
/// Field holding the cached response text
const RESPONSE_FIELD: &str = "response";
/// Alias RediSearch assigns the KNN distance in search results
const SCORE_ALIAS: &str = "score";

/// Semantic cache backed by Redis Stack vector search.
///
/// Disabled when constructed with an empty URL: no connection is ever
/// opened and every operation is a no-op. The enabled/disabled state is
/// fixed at construction; `close` additionally retires an enabled cache
/// into disabled semantics.
pub struct RedisSemanticCache {
    config: SemanticCacheConfig,
    connection: tokio::sync::Mutex<Option<ConnectionManager>>,
    enabled: bool,
    closed: std::sync::atomic::AtomicBool,
}

impl fmt::Debug for RedisSemanticCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisSemanticCache")
            .field("enabled", &self.enabled)
            .field("index_name", &self.config.index_name)
            .field("similarity_threshold", &self.config.similarity_threshold)
            .finish()
    }
}

/// Convert an embedding to FLOAT32 bytes, native endianness.
///
/// The byte width must match the index schema exactly or similarity scores
/// drift.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for component in embedding {
        bytes.extend_from_slice(&component.to_ne_bytes());
    }
    bytes
}

/// RediSearch COSINE returns a distance in [0, 1]; similarity is its
/// complement.
fn similarity_from_distance(distance: f32) -> f32 {
    1.0 - distance
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::BulkString(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        Value::SimpleString(s) => Some(s.clone()),
        _ => None,
    }
}

fn value_as_count(value: &Value) -> Option<i64> {
    match value {
        Value::Int(n) => Some(*n),
        _ => None,
    }
}

/// Extract `(distance, response)` of the single best hit from a raw
/// FT.SEARCH reply, or `None` when there is no parseable hit.
fn parse_knn_hit(reply: &Value) -> Option<(f32, String)> {
    let Value::Array(items) = reply else {
        return None;
    };

    if value_as_count(items.first()?)? == 0 {
        return None;
    }

    // items[1] is the entry key; items[2] the field/value pairs
    let Value::Array(fields) = items.get(2)? else {
        return None;
    };

    let mut distance = None;
    let mut response = None;

    for pair in fields.chunks(2) {
        let [name, value] = pair else { continue };
        match value_as_string(name)?.as_str() {
            SCORE_ALIAS => distance = value_as_string(value)?.parse::<f32>().ok(),
            RESPONSE_FIELD => response = value_as_string(value),
            _ => {}
        }
    }

    Some((distance?, response?))
}

fn index_is_missing(error: &redis::RedisError) -> bool {
    let message = error.to_string().to_lowercase();
    message.contains("unknown index") || message.contains("no such index")
}

impl RedisSemanticCache {
    /// Create a cache from configuration. No connection is opened here; the
    /// first enabled operation connects lazily.
    pub fn new(config: SemanticCacheConfig) -> Self {
        let enabled = !config.redis_url.trim().is_empty();

        Self {
            config,
            connection: tokio::sync::Mutex::new(None),
            enabled,
            closed: std::sync::atomic::AtomicBool::new(false),
        }
    }

    fn active(&self) -> bool {
        self.enabled && !self.closed.load(std::sync::atomic::Ordering::SeqCst)
    }

    async fn conn(&self) -> Result<ConnectionManager, DomainError> {
        let mut guard = self.connection.lock().await;

        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }

        let client = Client::open(self.config.redis_url.as_str())
            .map_err(|e| DomainError::cache(format!("Failed to create Redis client: {}", e)))?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to connect to Redis: {}", e)))?;

        *guard = Some(conn.clone());
        Ok(conn)
    }

    /// Create the vector index if it does not exist yet. Existence is
    /// detected via the backend's "unknown index" error rather than
    /// pre-checked state.
    async fn ensure_index(&self, conn: &mut ConnectionManager) -> Result<(), DomainError> {
        let info: Result<Value, redis::RedisError> = redis::cmd("FT.INFO")
            .arg(&self.config.index_name)
            .query_async(conn)
            .await;

        match info {
            Ok(_) => return Ok(()),
            Err(e) if index_is_missing(&e) => {}
            Err(e) => {
                return Err(DomainError::cache(format!(
                    "Failed to inspect cache index: {}",
                    e
                )))
            }
        }

        let _: Value = redis::cmd("FT.CREATE")
            .arg(&self.config.index_name)
            .arg("ON")
            .arg("HASH")
            .arg("PREFIX")
            .arg(1)
            .arg(&self.config.key_prefix)
            .arg("SCHEMA")
            .arg(VECTOR_FIELD)
            .arg("VECTOR")
            .arg("HNSW")
            .arg(6)
            .arg("TYPE")
            .arg("FLOAT32")
            .arg("DIM")
            .arg(self.config.embedding_dim)
            .arg("DISTANCE_METRIC")
            .arg("COSINE")
            .arg(RESPONSE_FIELD)
            .arg("TEXT")
            .query_async(conn)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to create cache index: {}", e)))?;

        info!(index = %self.config.index_name, "Created semantic cache index");
        Ok(())
    }
}

#[async_trait]
impl SemanticCache for RedisSemanticCache {
    fn enabled(&self) -> bool {
        self.enabled
    }

    async fn get(&self, embedding: &[f32]) -> Result<Option<String>, DomainError> {
        if !self.active() {
            return Ok(None);
        }

        let mut conn = self.conn().await?;
        self.ensure_index(&mut conn).await?;

        let query = format!("*=>[KNN 1 @{} $vec AS {}]", VECTOR_FIELD, SCORE_ALIAS);
        let reply: Value = redis::cmd("FT.SEARCH")
            .arg(&self.config.index_name)
            .arg(&query)
            .arg("PARAMS")
            .arg(2)
            .arg("vec")
            .arg(&embedding_to_bytes(embedding)[..])
            .arg("SORTBY")
            .arg(SCORE_ALIAS)
            .arg("RETURN")
            .arg(2)
            .arg(RESPONSE_FIELD)
            .arg(SCORE_ALIAS)
            .arg("LIMIT")
            .arg(0)
            .arg(1)
            .arg("DIALECT")
            .arg(2)
            .query_async(&mut conn)
            .await
            .map_err(|e| DomainError::cache(format!("Cache search failed: {}", e)))?;

        let Some((distance, response)) = parse_knn_hit(&reply) else {
            return Ok(None);
        };

        let similarity = similarity_from_distance(distance);
        if similarity < self.config.similarity_threshold {
            debug!(
                similarity,
                threshold = self.config.similarity_threshold,
                "Nearest cache entry below threshold"
            );
            return Ok(None);
        }

        Ok(Some(response))
    }

    async fn set(&self, embedding: &[f32], response: &str) -> Result<(), DomainError> {
        if !self.active() {
            return Ok(());
        }

        let mut conn = self.conn().await?;
        self.ensure_index(&mut conn).await?;

        let key = format!("{}{}", self.config.key_prefix, Uuid::new_v4().simple());

        let _: Value = redis::cmd("HSET")
            .arg(&key)
            .arg(VECTOR_FIELD)
            .arg(&embedding_to_bytes(embedding)[..])
            .arg(RESPONSE_FIELD)
            .arg(response)
            .query_async(&mut conn)
            .await
            .map_err(|e| DomainError::cache(format!("Cache write failed: {}", e)))?;

        let _: Value = redis::cmd("EXPIRE")
            .arg(&key)
            .arg(self.config.ttl_secs)
            .query_async(&mut conn)
            .await
            .map_err(|e| DomainError::cache(format!("Cache expiry failed: {}", e)))?;

        Ok(())
    }

    async fn flush(&self) -> Result<(), DomainError> {
        if !self.active() {
            return Ok(());
        }

        let mut conn = self.conn().await?;
        let pattern = format!("{}*", self.config.key_prefix);

        let mut cursor = 0u64;
        let mut removed = 0usize;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await
                .map_err(|e| DomainError::cache(format!("Cache scan failed: {}", e)))?;

            if !keys.is_empty() {
                let deleted: i64 = redis::cmd("DEL")
                    .arg(&keys)
                    .query_async(&mut conn)
                    .await
                    .map_err(|e| DomainError::cache(format!("Cache delete failed: {}", e)))?;
                removed += deleted as usize;
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        let drop: Result<Value, redis::RedisError> = redis::cmd("FT.DROPINDEX")
            .arg(&self.config.index_name)
            .query_async(&mut conn)
            .await;

        match drop {
            Ok(_) => {}
            Err(e) if index_is_missing(&e) => {}
            Err(e) => {
                return Err(DomainError::cache(format!(
                    "Failed to drop cache index: {}",
                    e
                )))
            }
        }

        info!(removed, "Semantic cache flushed");
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, std::sync::atomic::Ordering::SeqCst);

        // Dropping the manager releases the underlying connection; the
        // second and later calls find nothing to drop.
        let mut guard = self.connection.lock().await;
        if guard.take().is_some() {
            debug!("Semantic cache connection released");
        } else {
            warn!("Semantic cache close called with no open connection");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disabled_cache() -> RedisSemanticCache {
        RedisSemanticCache::new(SemanticCacheConfig::default())
    }

    #[test]
    fn test_embedding_to_bytes_width_and_roundtrip() {
        let embedding = vec![0.25f32, -1.5, 3.0];
        let bytes = embedding_to_bytes(&embedding);

        assert_eq!(bytes.len(), 12);

        let decoded: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(decoded, embedding);
    }

    #[test]
    fn test_threshold_boundary_at_0_95() {
        let threshold = 0.95f32;

        // Distance 0.05 puts the hit exactly on the threshold: accepted.
        assert!(similarity_from_distance(0.05) >= threshold);
        // Distance 0.06 gives similarity 0.94: rejected.
        assert!(similarity_from_distance(0.06) < threshold);
    }

    #[test]
    fn test_parse_knn_hit() {
        let reply = Value::Array(vec![
            Value::Int(1),
            Value::BulkString(b"rag_cache:abc".to_vec()),
            Value::Array(vec![
                Value::BulkString(b"score".to_vec()),
                Value::BulkString(b"0.03".to_vec()),
                Value::BulkString(b"response".to_vec()),
                Value::BulkString(b"cached answer".to_vec()),
            ]),
        ]);

        let (distance, response) = parse_knn_hit(&reply).unwrap();
        assert!((distance - 0.03).abs() < 1e-6);
        assert_eq!(response, "cached answer");
    }

    #[test]
    fn test_parse_knn_hit_empty_result() {
        let reply = Value::Array(vec![Value::Int(0)]);
        assert!(parse_knn_hit(&reply).is_none());
    }

    #[test]
    fn test_parse_knn_hit_unparseable_score() {
        let reply = Value::Array(vec![
            Value::Int(1),
            Value::BulkString(b"rag_cache:abc".to_vec()),
            Value::Array(vec![
                Value::BulkString(b"score".to_vec()),
                Value::BulkString(b"not-a-number".to_vec()),
                Value::BulkString(b"response".to_vec()),
                Value::BulkString(b"cached answer".to_vec()),
            ]),
        ]);

        assert!(parse_knn_hit(&reply).is_none());
    }

    #[test]
    fn test_parse_knn_hit_missing_response_field() {
        let reply = Value::Array(vec![
            Value::Int(1),
            Value::BulkString(b"rag_cache:abc".to_vec()),
            Value::Array(vec![
                Value::BulkString(b"score".to_vec()),
                Value::BulkString(b"0.01".to_vec()),
            ]),
        ]);

        assert!(parse_knn_hit(&reply).is_none());
    }

    #[tokio::test]
    async fn test_disabled_cache_never_touches_backend() {
        // Empty URL: operations succeed without any connection attempt
        // (a connection attempt against an empty URL would error).
        let cache = disabled_cache();

        assert!(!cache.enabled());
        assert_eq!(cache.get(&[0.1, 0.2]).await.unwrap(), None);
        cache.set(&[0.1, 0.2], "answer").await.unwrap();
        cache.flush().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let cache = disabled_cache();

        cache.close().await;
        cache.close().await;

        assert_eq!(cache.get(&[0.1]).await.unwrap(), None);
    }
}
