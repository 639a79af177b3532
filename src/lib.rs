//! LexRAG - retrieval-augmented question answering over a legal corpus
//!
//! Queries are answered by a pipeline that retrieves candidate chunks from
//! Weaviate, narrows them through two reranking stages, and generates an
//! answer with an LLM. Semantically similar questions are served from a
//! Redis-backed response cache.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::cache::SemanticCache;
use domain::context::ContextFormatter;
use domain::pipeline::{PipelineOptions, RagPipeline, DEFAULT_CHUNK_TIMEOUT, DEFAULT_STREAM_BUFFER};
use infrastructure::embedding::{OpenAiEmbedder, OpenAiEmbedderConfig};
use infrastructure::llm::{OpenAiGenerator, OpenAiGeneratorConfig};
use infrastructure::reranker::{Bm25Reranker, CohereReranker, CohereRerankerConfig};
use infrastructure::retriever::{WeaviateRetriever, WeaviateRetrieverConfig};
use infrastructure::semantic_cache::RedisSemanticCache;

/// Build the shared application state from configuration.
///
/// All collaborators are constructed once here; handlers only ever see them
/// through [`AppState`].
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let embedder = Arc::new(OpenAiEmbedder::new(OpenAiEmbedderConfig {
        api_key: config.openai.api_key.clone(),
        base_url: config.openai.base_url.clone(),
        model: config.openai.embedding_model.clone(),
        dimensions: config.openai.embedding_dim,
    }));

    let retriever = Arc::new(WeaviateRetriever::new(
        WeaviateRetrieverConfig {
            url: config.weaviate.url.clone(),
            collection: config.weaviate.collection.clone(),
        },
        embedder.clone(),
    ));

    let first_reranker = Arc::new(Bm25Reranker::new(config.retrieval.first_stage_top_k));

    let second_reranker = Arc::new(CohereReranker::new(CohereRerankerConfig {
        api_key: config.cohere.api_key.clone(),
        base_url: config.cohere.base_url.clone(),
        model: config.cohere.model.clone(),
        top_n: config.cohere.top_n,
    }));

    let llm = Arc::new(OpenAiGenerator::new(OpenAiGeneratorConfig {
        api_key: config.openai.api_key.clone(),
        base_url: config.openai.base_url.clone(),
        model: config.openai.model.clone(),
        ..OpenAiGeneratorConfig::default()
    }));

    let cache: Arc<dyn SemanticCache> = Arc::new(RedisSemanticCache::new(config.cache.clone()));

    let formatter = match config.retrieval.context_max_chars {
        Some(budget) => ContextFormatter::with_max_chars(budget),
        None => ContextFormatter::new(),
    };

    let pipeline = RagPipeline::new(retriever.clone(), first_reranker, second_reranker, llm)
        .with_cache(cache.clone())
        .with_embedder(embedder)
        .with_formatter(formatter)
        .with_options(PipelineOptions {
            retrieval_top_k: config.retrieval.top_k,
            stream_buffer: DEFAULT_STREAM_BUFFER,
            chunk_timeout: DEFAULT_CHUNK_TIMEOUT,
        });

    Ok(AppState::new(Arc::new(pipeline), retriever, cache))
}
