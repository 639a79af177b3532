//! Chat endpoint handlers

use std::convert::Infallible;

use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use futures::stream::{Stream, StreamExt};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info};
use uuid::Uuid;

use crate::api::state::AppState;
use crate::api::types::{ApiError, ChatRequest, ChatResponse, Json, StreamEvent};
use crate::domain::pipeline::AnswerEvent;

/// POST /v1/chat
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4().to_string();

    info!(
        request_id = %request_id,
        history_length = request.history.len(),
        "Processing chat request"
    );

    if request.content.trim().is_empty() {
        return Err(ApiError::bad_request("Content cannot be empty").with_param("content"));
    }

    let answer = state.pipeline.answer(&request.content).await?;

    Ok(Json(ChatResponse::new(request.history, answer)).into_response())
}

/// POST /v1/chat/stream
pub async fn chat_stream(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4().to_string();

    info!(
        request_id = %request_id,
        history_length = request.history.len(),
        "Processing streaming chat request"
    );

    if request.content.trim().is_empty() {
        return Err(ApiError::bad_request("Content cannot be empty").with_param("content"));
    }

    let stream = create_event_stream(state, request).await;

    Ok(Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response())
}

/// Bridge the pipeline's answer stream into SSE events.
///
/// Each pipeline event becomes one `data:` frame carrying a JSON
/// [`StreamEvent`]. An error item from the pipeline becomes a terminal
/// `error` event; nothing is sent after a terminal event.
async fn create_event_stream(
    state: AppState,
    request: ChatRequest,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let (tx, rx) = tokio::sync::mpsc::channel::<Result<Event, Infallible>>(32);

    tokio::spawn(async move {
        let history_length = request.history.len();
        let answers = state.pipeline.answer_stream(request.content);
        let guarded = state.pipeline.guard_stream(answers);
        futures::pin_mut!(guarded);

        while let Some(item) = guarded.next().await {
            let (event, terminal) = match item {
                Ok(AnswerEvent::Chunk(content)) => (StreamEvent::Chunk { content }, false),
                Ok(AnswerEvent::Done { response }) => (
                    StreamEvent::Done {
                        response,
                        history_length,
                    },
                    true,
                ),
                Err(e) => {
                    error!(error = %e, "Answer stream failed");
                    (
                        StreamEvent::Error {
                            message: e.to_string(),
                        },
                        true,
                    )
                }
            };

            let data = match serde_json::to_string(&event) {
                Ok(data) => data,
                Err(e) => {
                    error!(error = %e, "Failed to encode stream event");
                    break;
                }
            };

            if tx.send(Ok(Event::default().data(data))).await.is_err() {
                break;
            }

            if terminal {
                break;
            }
        }
    });

    ReceiverStream::new(rx)
}
