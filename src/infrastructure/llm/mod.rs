//! LLM generator implementations

mod openai;

pub use openai::{OpenAiGenerator, OpenAiGeneratorConfig};
