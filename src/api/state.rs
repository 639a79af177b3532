//! Shared application state

use std::sync::Arc;

use crate::domain::cache::SemanticCache;
use crate::domain::pipeline::RagPipeline;
use crate::domain::retriever::Retriever;

/// State handed to every request handler.
///
/// Built once at startup; all members are shared, long-lived collaborators.
#[derive(Debug, Clone)]
pub struct AppState {
    pub pipeline: Arc<RagPipeline>,
    pub retriever: Arc<dyn Retriever>,
    pub cache: Arc<dyn SemanticCache>,
}

impl AppState {
    pub fn new(
        pipeline: Arc<RagPipeline>,
        retriever: Arc<dyn Retriever>,
        cache: Arc<dyn SemanticCache>,
    ) -> Self {
        Self {
            pipeline,
            retriever,
            cache,
        }
    }
}
