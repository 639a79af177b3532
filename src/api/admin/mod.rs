//! Administrative endpoints

pub mod cache;

use axum::{routing::post, Router};

use super::state::AppState;

/// Create admin API router
pub fn create_admin_router() -> Router<AppState> {
    Router::new().route("/cache/flush", post(cache::flush_cache))
}
