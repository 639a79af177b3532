//! Flush-cache command - invalidates the semantic response cache

use anyhow::Context;
use tracing::info;

use crate::config::AppConfig;
use crate::domain::cache::SemanticCache;
use crate::infrastructure::logging;
use crate::infrastructure::semantic_cache::RedisSemanticCache;

/// Drop every cached response and the similarity index, then exit
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&logging::LoggingConfig {
        level: config.logging.level.clone(),
        format: config.logging.format.clone(),
    });

    let cache = RedisSemanticCache::new(config.cache.clone());

    if !cache.enabled() {
        info!("Semantic cache is not configured; nothing to flush");
        return Ok(());
    }

    cache
        .flush()
        .await
        .context("Failed to flush semantic cache")?;
    cache.close().await;

    info!("Semantic cache flushed");
    Ok(())
}
