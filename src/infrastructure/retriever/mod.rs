pub mod weaviate;

pub use weaviate::{WeaviateRetriever, WeaviateRetrieverConfig};
