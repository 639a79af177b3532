//! Reranking trait and the identity stage

use std::fmt::Debug;

use async_trait::async_trait;

use super::document::DocumentChunk;
use crate::domain::DomainError;

/// Trait for reranking stages.
///
/// A stage consumes the previous stage's ordered output and produces a
/// re-ordered, possibly truncated list. The pipeline always invokes both
/// configured stages in sequence; a stage that should not reorder anything
/// is expressed as [`NoopReranker`].
#[async_trait]
pub trait Reranker: Send + Sync + Debug {
    /// Rerank chunks by relevance to the query
    async fn rerank(
        &self,
        query: &str,
        chunks: Vec<DocumentChunk>,
    ) -> Result<Vec<DocumentChunk>, DomainError>;

    /// Get the stage name
    fn stage_name(&self) -> &'static str;
}

/// Identity reranking stage
#[derive(Debug, Default)]
pub struct NoopReranker;

impl NoopReranker {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Reranker for NoopReranker {
    async fn rerank(
        &self,
        _query: &str,
        chunks: Vec<DocumentChunk>,
    ) -> Result<Vec<DocumentChunk>, DomainError> {
        Ok(chunks)
    }

    fn stage_name(&self) -> &'static str {
        "noop"
    }
}

#[cfg(test)]
pub mod mock {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Pass-through reranker that counts invocations
    #[derive(Debug, Default)]
    pub struct MockReranker {
        error: Option<String>,
        calls: AtomicUsize,
    }

    impl MockReranker {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Reranker for MockReranker {
        async fn rerank(
            &self,
            _query: &str,
            chunks: Vec<DocumentChunk>,
        ) -> Result<Vec<DocumentChunk>, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if let Some(ref error) = self.error {
                return Err(DomainError::provider("mock-reranker", error));
            }

            Ok(chunks)
        }

        fn stage_name(&self) -> &'static str {
            "mock"
        }
    }
}
