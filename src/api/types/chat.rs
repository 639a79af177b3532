//! Chat request and response types

use serde::{Deserialize, Serialize};

/// Who authored a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// Single message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Chat request: prior history plus the current message
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    pub role: Role,
    pub content: String,
}

/// Synchronous chat response
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub history: Vec<ChatMessage>,
    pub received_role: Role,
    pub received_content: String,
    pub history_length: usize,
}

impl ChatResponse {
    pub fn new(history: Vec<ChatMessage>, answer: impl Into<String>) -> Self {
        let history_length = history.len();
        Self {
            history,
            received_role: Role::Agent,
            received_content: answer.into(),
            history_length,
        }
    }
}

/// One SSE event on the streaming chat path
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    /// Incremental answer text
    Chunk { content: String },
    /// Terminal success event with the full answer
    Done {
        response: String,
        history_length: usize,
    },
    /// Terminal failure event
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_history_defaults_to_empty() {
        let request: ChatRequest =
            serde_json::from_str(r#"{"role": "user", "content": "hi"}"#).unwrap();

        assert!(request.history.is_empty());
        assert_eq!(request.role, Role::User);
    }

    #[test]
    fn test_response_echoes_history() {
        let history = vec![ChatMessage {
            role: Role::User,
            content: "earlier question".to_string(),
        }];

        let response = ChatResponse::new(history, "the answer");

        assert_eq!(response.received_role, Role::Agent);
        assert_eq!(response.received_content, "the answer");
        assert_eq!(response.history_length, 1);
    }

    #[test]
    fn test_stream_event_envelope() {
        let chunk = serde_json::to_string(&StreamEvent::Chunk {
            content: "hello".to_string(),
        })
        .unwrap();
        assert_eq!(chunk, r#"{"type":"chunk","content":"hello"}"#);

        let done = serde_json::to_string(&StreamEvent::Done {
            response: "hello world".to_string(),
            history_length: 0,
        })
        .unwrap();
        assert!(done.starts_with(r#"{"type":"done""#));
    }
}
