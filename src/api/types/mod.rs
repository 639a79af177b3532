//! API request/response types

pub mod chat;
pub mod error;
pub mod json;

pub use chat::{ChatMessage, ChatRequest, ChatResponse, Role, StreamEvent};
pub use error::{ApiError, ApiErrorResponse};
pub use json::Json;
