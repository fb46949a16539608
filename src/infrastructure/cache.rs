use crate::config::ServiceConfig;
use crate::services::cache::{CacheBackend, CacheLayer, MemoryCache, RedisCache};
use std::sync::Arc;
use tracing::info;

pub fn setup_cache(config: &ServiceConfig) -> anyhow::Result<Arc<CacheLayer>> {
    let backend: Box<dyn CacheBackend> = match config.cache_backend.to_lowercase().as_str() {
        "memory" => {
            info!(
                "🧠 Read cache: in-process (capacity {})",
                config.cache_capacity
            );
            Box::new(MemoryCache::new(config.cache_capacity))
        }
        "redis" => {
            info!("🧠 Read cache: redis at {}", config.redis_url);
            Box::new(RedisCache::new(
                &config.redis_url,
                &config.cache_prefix,
                config.cache_pool_size,
            )?)
        }
        other => anyhow::bail!("Unknown cache backend '{}'", other),
    };

    Ok(Arc::new(CacheLayer::new(backend, config.store_timeout)))
}
