//! Semantic cache implementations

mod in_memory;
mod redis;

pub use in_memory::InMemorySemanticCache;
pub use redis::RedisSemanticCache;
