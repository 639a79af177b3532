//! OpenAI chat-completions generator

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::domain::llm::{AnswerStream, LlmGenerator};
use crate::domain::DomainError;

const PROVIDER: &str = "openai";

/// Default system prompt for legal question answering
const DEFAULT_SYSTEM_PROMPT: &str = "You are a legal research assistant. Answer strictly from the \
provided context. Cite the chunk numbers you rely on and say so explicitly when the context does \
not cover the question.";

/// Configuration for the OpenAI generator
#[derive(Debug, Clone)]
pub struct OpenAiGeneratorConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub system_prompt: String,
}

impl Default for OpenAiGeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// LLM generator backed by the OpenAI chat completions API
#[derive(Debug)]
pub struct OpenAiGenerator {
    client: reqwest::Client,
    config: OpenAiGeneratorConfig,
}

impl OpenAiGenerator {
    pub fn new(config: OpenAiGeneratorConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn user_message(query: &str, context: &str) -> String {
        format!("QUESTION:\n{}\n\nCONTEXT:\n{}", query, context)
    }

    fn request_body(&self, query: &str, context: &str, stream: bool) -> serde_json::Value {
        json!({
            "model": self.config.model,
            "stream": stream,
            "messages": [
                { "role": "system", "content": self.config.system_prompt },
                { "role": "user", "content": Self::user_message(query, context) },
            ],
        })
    }

    async fn post(
        &self,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, DomainError> {
        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| DomainError::provider(PROVIDER, format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::provider(
                PROVIDER,
                format!("HTTP {}: {}", status, body),
            ));
        }

        Ok(response)
    }
}

#[async_trait]
impl LlmGenerator for OpenAiGenerator {
    async fn generate(&self, query: &str, context: &str) -> Result<String, DomainError> {
        let body = self.request_body(query, context, false);
        let response: ChatCompletionResponse = self
            .post(&body)
            .await?
            .json()
            .await
            .map_err(|e| DomainError::provider(PROVIDER, format!("Malformed response: {}", e)))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.map(|m| m.content))
            .ok_or_else(|| DomainError::provider(PROVIDER, "Response contained no choices"))
    }

    async fn generate_stream(
        &self,
        query: &str,
        context: &str,
    ) -> Result<AnswerStream, DomainError> {
        let body = self.request_body(query, context, true);
        let response = self.post(&body).await?;

        debug!(model = %self.config.model, "Streaming generation started");

        let stream = response
            .bytes_stream()
            .map(|result| {
                result.map_err(|e| {
                    DomainError::provider(PROVIDER, format!("Stream read failed: {}", e))
                })
            })
            .filter_map(|result| async move {
                match result {
                    Ok(bytes) => {
                        let text = String::from_utf8_lossy(&bytes);
                        parse_sse_delta(&text).map(Ok)
                    }
                    Err(e) => Some(Err(e)),
                }
            });

        Ok(Box::pin(stream))
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Concatenate the content deltas of every `data:` line in an SSE payload.
/// Returns `None` when the payload carries no content (keep-alives, the
/// `[DONE]` sentinel, role-only deltas).
fn parse_sse_delta(text: &str) -> Option<String> {
    let mut content = String::new();

    for line in text.lines() {
        let Some(data) = line.strip_prefix("data: ") else {
            continue;
        };
        if data.trim() == "[DONE]" {
            break;
        }
        if let Ok(chunk) = serde_json::from_str::<StreamChunk>(data) {
            if let Some(delta) = chunk
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.delta)
                .and_then(|d| d.content)
            {
                content.push_str(&delta);
            }
        }
    }

    if content.is_empty() {
        None
    } else {
        Some(content)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize, Serialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Option<StreamDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}
