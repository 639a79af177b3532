//! Semantic cache administration

use axum::extract::State;
use serde::Serialize;
use tracing::info;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};

#[derive(Debug, Serialize)]
pub struct CacheFlushResponse {
    pub flushed: bool,
    pub enabled: bool,
}

/// POST /admin/cache/flush
///
/// Drops every cached response and the similarity index. Meant to be called
/// after the underlying corpus changes, so stale answers cannot be served.
pub async fn flush_cache(State(state): State<AppState>) -> Result<Json<CacheFlushResponse>, ApiError> {
    let enabled = state.cache.enabled();

    if !enabled {
        return Ok(Json(CacheFlushResponse {
            flushed: false,
            enabled,
        }));
    }

    state.cache.flush().await?;
    info!("Semantic cache flushed");

    Ok(Json(CacheFlushResponse {
        flushed: true,
        enabled,
    }))
}
