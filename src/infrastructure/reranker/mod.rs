pub mod bm25;
pub mod cohere;

pub use bm25::Bm25Reranker;
pub use cohere::{CohereReranker, CohereRerankerConfig};
