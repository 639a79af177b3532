//! Query embedding implementations

mod openai;

pub use openai::{OpenAiEmbedder, OpenAiEmbedderConfig};
