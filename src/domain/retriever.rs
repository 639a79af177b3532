//! Vector store retrieval trait

use std::fmt::Debug;

use async_trait::async_trait;

use super::document::DocumentChunk;
use crate::domain::DomainError;

/// Trait for vector store retrieval (Weaviate, pgvector, etc.)
#[async_trait]
pub trait Retriever: Send + Sync + Debug {
    /// Retrieve up to `top_k` chunks by similarity to the query, best-first
    async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<DocumentChunk>, DomainError>;

    /// Load a batch of chunks into the store, returning how many were sent
    async fn batch_load(&self, items: Vec<DocumentChunk>) -> Result<usize, DomainError>;

    /// Check that the backing store is reachable
    async fn health_check(&self) -> Result<(), DomainError>;

    /// Get the backend name
    fn backend_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Debug, Default)]
    pub struct MockRetriever {
        chunks: Vec<DocumentChunk>,
        error: Option<String>,
        retrieve_calls: AtomicUsize,
    }

    impl MockRetriever {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_chunks(mut self, chunks: Vec<DocumentChunk>) -> Self {
            self.chunks = chunks;
            self
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        pub fn retrieve_calls(&self) -> usize {
            self.retrieve_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Retriever for MockRetriever {
        async fn retrieve(
            &self,
            _query: &str,
            top_k: usize,
        ) -> Result<Vec<DocumentChunk>, DomainError> {
            self.retrieve_calls.fetch_add(1, Ordering::SeqCst);

            if let Some(ref error) = self.error {
                return Err(DomainError::retrieval(error));
            }

            Ok(self.chunks.iter().take(top_k).cloned().collect())
        }

        async fn batch_load(&self, items: Vec<DocumentChunk>) -> Result<usize, DomainError> {
            Ok(items.len())
        }

        async fn health_check(&self) -> Result<(), DomainError> {
            match self.error {
                Some(ref error) => Err(DomainError::retrieval(error)),
                None => Ok(()),
            }
        }

        fn backend_name(&self) -> &'static str {
            "mock"
        }
    }
}
