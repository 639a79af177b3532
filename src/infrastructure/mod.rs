pub mod embedding;
pub mod llm;
pub mod logging;
pub mod reranker;
pub mod retriever;
pub mod semantic_cache;
