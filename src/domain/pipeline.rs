//! RAG query pipeline with semantic caching
//!
//! One invocation either short-circuits on a cache hit or runs the full
//! path: retrieve, first rerank, second rerank, context assembly, generate,
//! cache write. Cache operations are best-effort; a cache failure is logged
//! and the invocation proceeds as if no cache were configured. Failures of
//! the required path (retrieval, reranking, generation) are fatal to the
//! invocation and propagate to the caller.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use super::cache::SemanticCache;
use super::context::ContextFormatter;
use super::document::DocumentChunk;
use super::embedding::QueryEmbedder;
use super::llm::LlmGenerator;
use super::reranker::Reranker;
use super::retriever::Retriever;
use crate::domain::DomainError;

/// Default number of candidates requested from the vector store
pub const DEFAULT_RETRIEVAL_TOP_K: usize = 25;

/// Default bound of the producer/consumer channel on the streaming path
pub const DEFAULT_STREAM_BUFFER: usize = 32;

/// Default maximum wait for the next streamed chunk
pub const DEFAULT_CHUNK_TIMEOUT: Duration = Duration::from_secs(180);

/// Tuning knobs for a pipeline instance
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Candidates requested from retrieval
    pub retrieval_top_k: usize,
    /// Capacity of the streaming bridge channel
    pub stream_buffer: usize,
    /// Per-chunk receive ceiling on the streaming path; exceeding it is
    /// fatal to the invocation
    pub chunk_timeout: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            retrieval_top_k: DEFAULT_RETRIEVAL_TOP_K,
            stream_buffer: DEFAULT_STREAM_BUFFER,
            chunk_timeout: DEFAULT_CHUNK_TIMEOUT,
        }
    }
}

/// Event emitted on the streaming answer path.
///
/// Any number of `Chunk` events precede exactly one terminal event: `Done`
/// (carrying the concatenated response) on success, or an `Err` item from
/// the stream on failure. Nothing follows a terminal event.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerEvent {
    /// Incremental answer text, in production order
    Chunk(String),
    /// Terminal event with the full concatenated response
    Done { response: String },
}

/// Stream of answer events for one invocation
pub type AnswerEventStream = ReceiverStream<Result<AnswerEvent, DomainError>>;

/// The query-answering pipeline.
///
/// All collaborators are long-lived, shared across concurrent invocations,
/// and used read-only per request; per-call state never leaves the
/// invocation.
#[derive(Debug, Clone)]
pub struct RagPipeline {
    retriever: Arc<dyn Retriever>,
    first_reranker: Arc<dyn Reranker>,
    second_reranker: Arc<dyn Reranker>,
    llm: Arc<dyn LlmGenerator>,
    cache: Option<Arc<dyn SemanticCache>>,
    embedder: Option<Arc<dyn QueryEmbedder>>,
    formatter: ContextFormatter,
    options: PipelineOptions,
}

impl RagPipeline {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        first_reranker: Arc<dyn Reranker>,
        second_reranker: Arc<dyn Reranker>,
        llm: Arc<dyn LlmGenerator>,
    ) -> Self {
        Self {
            retriever,
            first_reranker,
            second_reranker,
            llm,
            cache: None,
            embedder: None,
            formatter: ContextFormatter::new(),
            options: PipelineOptions::default(),
        }
    }

    /// Attach a semantic cache. Caching stays inert unless an embedder is
    /// also attached.
    pub fn with_cache(mut self, cache: Arc<dyn SemanticCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Attach the query-embedding provider used for cache probes and writes
    pub fn with_embedder(mut self, embedder: Arc<dyn QueryEmbedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Replace the context formatter
    pub fn with_formatter(mut self, formatter: ContextFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Replace the pipeline options
    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Whether a usable cache (configured, enabled, embedder present) exists
    fn caching_active(&self) -> Option<(&Arc<dyn SemanticCache>, &Arc<dyn QueryEmbedder>)> {
        match (&self.cache, &self.embedder) {
            (Some(cache), Some(embedder)) if cache.enabled() => Some((cache, embedder)),
            _ => None,
        }
    }

    /// Probe the cache for a previously generated response. Every failure
    /// on this path is swallowed; the caller falls through to the full
    /// pipeline.
    async fn probe_cache(&self, query: &str) -> Option<String> {
        let (cache, embedder) = self.caching_active()?;

        let embedding = match embedder.embed(query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!(error = %e, "Cache probe embedding failed, running full pipeline");
                return None;
            }
        };

        match cache.get(&embedding).await {
            Ok(hit) => {
                if hit.is_some() {
                    debug!("Semantic cache hit");
                }
                hit
            }
            Err(e) => {
                warn!(error = %e, "Cache probe failed, running full pipeline");
                None
            }
        }
    }

    /// Write `(embedding, response)` to the cache. The embedding is
    /// recomputed rather than reused from the probe. Failures are swallowed.
    async fn store_response(&self, query: &str, response: &str) {
        let Some((cache, embedder)) = self.caching_active() else {
            return;
        };

        let embedding = match embedder.embed(query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!(error = %e, "Cache write embedding failed, skipping write");
                return;
            }
        };

        if let Err(e) = cache.set(&embedding, response).await {
            warn!(error = %e, "Cache write failed, answer unaffected");
        }
    }

    /// Run retrieval and both reranking stages, in order
    async fn assemble_chunks(&self, query: &str) -> Result<Vec<DocumentChunk>, DomainError> {
        let retrieved = self
            .retriever
            .retrieve(query, self.options.retrieval_top_k)
            .await?;

        debug!(candidates = retrieved.len(), "Retrieved candidate chunks");

        let filtered = self.first_reranker.rerank(query, retrieved).await?;
        let reranked = self.second_reranker.rerank(query, filtered).await?;

        debug!(
            first_stage = self.first_reranker.stage_name(),
            second_stage = self.second_reranker.stage_name(),
            kept = reranked.len(),
            "Reranking complete"
        );

        Ok(reranked)
    }

    /// Answer a query, short-circuiting via the cache when possible.
    pub async fn answer(&self, query: &str) -> Result<String, DomainError> {
        if let Some(cached) = self.probe_cache(query).await {
            return Ok(cached);
        }

        let chunks = self.assemble_chunks(query).await?;
        let context = self.formatter.format(&chunks);
        let response = self.llm.generate(query, &context).await?;

        self.store_response(query, &response).await;

        Ok(response)
    }

    /// Answer a query as a stream of [`AnswerEvent`]s.
    ///
    /// Production runs in a spawned task; events flow through a bounded
    /// channel so a slow consumer cannot stall generation and a stalled
    /// producer surfaces as a timeout rather than an indefinite hang. A
    /// cache hit yields exactly one `Chunk` holding the full cached
    /// response, then `Done`. On a miss, the cache write happens after the
    /// terminal event has been sent, so it never delays delivery. If the
    /// consumer goes away, production stops at the next send; in-flight
    /// backend calls are not interrupted.
    pub fn answer_stream(&self, query: impl Into<String>) -> AnswerEventStream {
        let (tx, rx) = mpsc::channel(self.options.stream_buffer);
        let pipeline = self.clone();
        let query = query.into();

        tokio::spawn(async move {
            pipeline.produce(&query, tx).await;
        });

        ReceiverStream::new(rx)
    }

    /// Consumer-side guard: apply the per-chunk receive ceiling to an
    /// answer stream. A lapse maps to a fatal `Timeout` error item.
    pub fn guard_stream(
        &self,
        stream: AnswerEventStream,
    ) -> impl futures::Stream<Item = Result<AnswerEvent, DomainError>> + Send {
        let ceiling = self.options.chunk_timeout;

        tokio_stream::StreamExt::timeout(stream, ceiling).map(move |item| match item {
            Ok(inner) => inner,
            Err(_) => Err(DomainError::timeout(format!(
                "no answer chunk within {}s",
                ceiling.as_secs()
            ))),
        })
    }

    async fn produce(&self, query: &str, tx: mpsc::Sender<Result<AnswerEvent, DomainError>>) {
        if let Some(cached) = self.probe_cache(query).await {
            if tx.send(Ok(AnswerEvent::Chunk(cached.clone()))).await.is_err() {
                return;
            }
            let _ = tx.send(Ok(AnswerEvent::Done { response: cached })).await;
            return;
        }

        let chunks = match self.assemble_chunks(query).await {
            Ok(chunks) => chunks,
            Err(e) => {
                let _ = tx.send(Err(e)).await;
                return;
            }
        };

        let context = self.formatter.format(&chunks);

        let mut stream = match self.llm.generate_stream(query, &context).await {
            Ok(stream) => stream,
            Err(e) => {
                let _ = tx.send(Err(e)).await;
                return;
            }
        };

        let mut accumulated = String::new();

        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => {
                    accumulated.push_str(&chunk);
                    if tx.send(Ok(AnswerEvent::Chunk(chunk))).await.is_err() {
                        // Consumer disconnected; stop forwarding. The
                        // generation was not fully delivered, so it is not
                        // cached.
                        return;
                    }
                }
                Err(e) => {
                    // Chunks already delivered remain valid; the error is
                    // the terminal event.
                    let _ = tx.send(Err(e)).await;
                    return;
                }
            }
        }

        let done = AnswerEvent::Done {
            response: accumulated.clone(),
        };
        let delivered = tx.send(Ok(done)).await.is_ok();

        if delivered {
            self.store_response(query, &accumulated).await;
        }
    }
}
