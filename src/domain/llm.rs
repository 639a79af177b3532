//! LLM generation trait

use std::fmt::Debug;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::domain::DomainError;

/// Stream of incremental answer text produced by a generator
pub type AnswerStream = Pin<Box<dyn Stream<Item = Result<String, DomainError>> + Send>>;

/// Trait for answer generation from a query and an assembled context.
#[async_trait]
pub trait LlmGenerator: Send + Sync + Debug {
    /// Generate a complete answer
    async fn generate(&self, query: &str, context: &str) -> Result<String, DomainError>;

    /// Generate an answer as a stream of text chunks.
    ///
    /// Providers without true streaming fall back to yielding the full
    /// `generate` result as a single chunk.
    async fn generate_stream(
        &self,
        query: &str,
        context: &str,
    ) -> Result<AnswerStream, DomainError> {
        let full = self.generate(query, context).await?;
        Ok(Box::pin(futures::stream::once(async move { Ok(full) })))
    }

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Mock generator echoing the query and context length, or replaying
    /// configured chunks on the streaming path.
    #[derive(Debug, Default)]
    pub struct MockLlmGenerator {
        chunks: Option<Vec<String>>,
        error: Option<String>,
        generate_calls: AtomicUsize,
        stream_calls: AtomicUsize,
    }

    impl MockLlmGenerator {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_chunks(mut self, chunks: Vec<&str>) -> Self {
            self.chunks = Some(chunks.into_iter().map(String::from).collect());
            self
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        pub fn generate_calls(&self) -> usize {
            self.generate_calls.load(Ordering::SeqCst)
        }

        pub fn stream_calls(&self) -> usize {
            self.stream_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmGenerator for MockLlmGenerator {
        async fn generate(&self, query: &str, context: &str) -> Result<String, DomainError> {
            self.generate_calls.fetch_add(1, Ordering::SeqCst);

            if let Some(ref error) = self.error {
                return Err(DomainError::provider("mock-llm", error));
            }

            if let Some(ref chunks) = self.chunks {
                return Ok(chunks.concat());
            }

            Ok(format!(
                "ANSWER to '{}' with {} chars of context",
                query,
                context.len()
            ))
        }

        async fn generate_stream(
            &self,
            query: &str,
            context: &str,
        ) -> Result<AnswerStream, DomainError> {
            self.stream_calls.fetch_add(1, Ordering::SeqCst);

            if let Some(ref error) = self.error {
                return Err(DomainError::provider("mock-llm", error));
            }

            let chunks = match self.chunks {
                Some(ref chunks) => chunks.clone(),
                None => vec![self.generate(query, context).await?],
            };

            Ok(Box::pin(futures::stream::iter(chunks.into_iter().map(Ok))))
        }

        fn provider_name(&self) -> &'static str {
            "mock-llm"
        }
    }

    /// Mock generator whose stream fails midway through production
    #[derive(Debug)]
    pub struct FailingStreamGenerator {
        pub chunks_before_failure: Vec<String>,
    }

    #[async_trait]
    impl LlmGenerator for FailingStreamGenerator {
        async fn generate(&self, _query: &str, _context: &str) -> Result<String, DomainError> {
            Err(DomainError::provider("mock-llm", "generation failed"))
        }

        async fn generate_stream(
            &self,
            _query: &str,
            _context: &str,
        ) -> Result<AnswerStream, DomainError> {
            let items: Vec<Result<String, DomainError>> = self
                .chunks_before_failure
                .iter()
                .cloned()
                .map(Ok)
                .chain(std::iter::once(Err(DomainError::provider(
                    "mock-llm",
                    "stream interrupted",
                ))))
                .collect();

            Ok(Box::pin(futures::stream::iter(items)))
        }

        fn provider_name(&self) -> &'static str {
            "mock-llm"
        }
    }
}
