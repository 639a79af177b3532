pub mod cache;
pub mod context;
pub mod document;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod reranker;
pub mod retriever;

pub use document::DocumentChunk;
pub use error::DomainError;
pub use pipeline::RagPipeline;
