use crate::models::{ContentHolder, OwnerScope, RecordKey, SerializedBody};
use crate::services::store::BackendError;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashSet;
use deadpool_redis::{Config, Pool, Runtime};
use redis::AsyncCommands;
use std::future::Future;
use std::time::Duration;

/// Key-addressed byte cache. Implementations must be safe for concurrent use.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<Bytes>, BackendError>;

    async fn set(&self, key: &str, value: Bytes) -> Result<(), BackendError>;

    /// Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), BackendError>;
}

/// Redis-backed cache using a `deadpool-redis` connection pool.
pub struct RedisCache {
    pool: Pool,
    prefix: String,
}

impl RedisCache {
    pub fn new(url: &str, prefix: &str, pool_size: usize) -> Result<Self, BackendError> {
        let pool = Config::from_url(url)
            .builder()
            .map(|b| b.max_size(pool_size).runtime(Runtime::Tokio1).build())
            .map_err(BackendError::transport)?
            .map_err(BackendError::transport)?;

        Ok(Self {
            pool,
            prefix: prefix.to_string(),
        })
    }

    fn redis_key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    async fn conn(&self) -> Result<deadpool_redis::Connection, BackendError> {
        self.pool.get().await.map_err(BackendError::transport)
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, BackendError> {
        let mut conn = self.conn().await?;
        let value: Option<Vec<u8>> = conn
            .get(self.redis_key(key))
            .await
            .map_err(BackendError::transport)?;
        Ok(value.map(Bytes::from))
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<(), BackendError> {
        let mut conn = self.conn().await?;
        let () = conn
            .set(self.redis_key(key), value.as_ref())
            .await
            .map_err(BackendError::transport)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        let mut conn = self.conn().await?;
        let _: i64 = conn
            .del(self.redis_key(key))
            .await
            .map_err(BackendError::transport)?;
        Ok(())
    }
}

/// In-process cache for single-node and development deployments.
pub struct MemoryCache {
    entries: moka::future::Cache<String, Bytes>,
}

impl MemoryCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            entries: moka::future::Cache::builder().max_capacity(capacity).build(),
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, BackendError> {
        Ok(self.entries.get(key).await)
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<(), BackendError> {
        self.entries.insert(key.to_string(), value).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        self.entries.invalidate(key).await;
        Ok(())
    }
}

/// Best-effort read accelerator for info and list responses.
///
/// Nothing in here ever fails the caller: errors and deadline overruns are
/// logged and turn into misses. Invalidations that could not be delivered
/// are remembered and retried on the next read of that key and on
/// [`CacheLayer::flush_pending`].
pub struct CacheLayer {
    backend: Box<dyn CacheBackend>,
    timeout: Duration,
    pending: DashSet<String>,
}

impl CacheLayer {
    pub fn new(backend: Box<dyn CacheBackend>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            pending: DashSet::new(),
        }
    }

    pub async fn get_record(&self, key: &RecordKey) -> Option<Bytes> {
        self.lookup(&key.cache_key()).await
    }

    pub async fn put_record(&self, holder: &ContentHolder<SerializedBody>) {
        self.store(&holder.key().cache_key(), holder.content.bytes())
            .await;
    }

    pub async fn get_list(&self, owner: &OwnerScope) -> Option<Bytes> {
        self.lookup(&owner.list_cache_key()).await
    }

    pub async fn put_list(&self, owner: &OwnerScope, body: SerializedBody) {
        self.store(&owner.list_cache_key(), body.into_bytes()).await;
    }

    /// Drops the record entry, then the owner's list entry.
    pub async fn invalidate(&self, key: &RecordKey) {
        self.remove(key.cache_key()).await;
        self.remove(key.list_cache_key()).await;
    }

    /// Retries every invalidation that previously failed. Returns how many
    /// keys are still pending afterwards.
    pub async fn flush_pending(&self) -> usize {
        let keys: Vec<String> = self.pending.iter().map(|k| k.key().clone()).collect();
        if !keys.is_empty() {
            tracing::info!("🧹 Flushing {} pending cache invalidations", keys.len());
        }
        for key in keys {
            if self.try_delete(&key).await {
                self.pending.remove(&key);
            }
        }
        self.pending.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    async fn lookup(&self, key: &str) -> Option<Bytes> {
        if self.pending.contains(key) {
            // A stale entry may still be present: retry the delete, never serve it.
            if self.try_delete(key).await {
                self.pending.remove(key);
            }
            return None;
        }

        match self.bounded(self.backend.get(key)).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!("Unable to get cache key {}: {}", key, e);
                None
            }
        }
    }

    async fn store(&self, key: &str, value: Bytes) {
        if self.pending.contains(key) {
            return;
        }
        if let Err(e) = self.bounded(self.backend.set(key, value)).await {
            tracing::warn!("Unable to set cache key {}: {}", key, e);
        }
    }

    async fn remove(&self, key: String) {
        if !self.try_delete(&key).await {
            self.pending.insert(key);
        }
    }

    async fn try_delete(&self, key: &str) -> bool {
        match self.bounded(self.backend.delete(key)).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Unable to delete cache key {}: {}", key, e);
                false
            }
        }
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, BackendError>
    where
        F: Future<Output = Result<T, BackendError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(res) => res,
            Err(_) => Err(BackendError::transport(anyhow::anyhow!(
                "{} cache call exceeded {:?}",
                self.backend.name(),
                self.timeout
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Memory cache whose deletes can be made to fail.
    struct FlakyCache {
        inner: MemoryCache,
        fail_deletes: Arc<AtomicBool>,
    }

    #[async_trait]
    impl CacheBackend for FlakyCache {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn get(&self, key: &str) -> Result<Option<Bytes>, BackendError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: Bytes) -> Result<(), BackendError> {
            self.inner.set(key, value).await
        }

        async fn delete(&self, key: &str) -> Result<(), BackendError> {
            if self.fail_deletes.load(Ordering::SeqCst) {
                return Err(BackendError::transport(anyhow::anyhow!("connection reset")));
            }
            self.inner.delete(key).await
        }
    }

    fn owner() -> OwnerScope {
        OwnerScope::new("u1", "Ada", "Lovelace")
    }

    fn serialized(data: &'static [u8]) -> ContentHolder<SerializedBody> {
        ContentHolder::lookup(owner(), "a.txt").with_serialized(SerializedBody::new(data))
    }

    #[tokio::test]
    async fn test_record_and_list_roundtrip() {
        let cache = CacheLayer::new(Box::new(MemoryCache::new(100)), Duration::from_secs(1));
        let key = RecordKey::new("u1", "a.txt");

        assert!(cache.get_record(&key).await.is_none());
        cache.put_record(&serialized(b"{\"v\":1}")).await;
        cache
            .put_list(&owner(), SerializedBody::new(&b"[]"[..]))
            .await;

        assert_eq!(cache.get_record(&key).await.unwrap().as_ref(), b"{\"v\":1}");
        assert_eq!(cache.get_list(&owner()).await.unwrap().as_ref(), b"[]");

        cache.invalidate(&key).await;
        assert!(cache.get_record(&key).await.is_none());
        assert!(cache.get_list(&owner()).await.is_none());
    }

    #[tokio::test]
    async fn test_failed_invalidation_never_serves_stale_entry() {
        let fail = Arc::new(AtomicBool::new(false));
        let backend = FlakyCache {
            inner: MemoryCache::new(100),
            fail_deletes: fail.clone(),
        };
        let cache = CacheLayer::new(Box::new(backend), Duration::from_secs(1));
        let key = RecordKey::new("u1", "a.txt");

        cache.put_record(&serialized(b"stale")).await;
        fail.store(true, Ordering::SeqCst);
        cache.invalidate(&key).await;
        assert_eq!(cache.pending_count(), 2);

        // Still failing: the stale bytes are not returned
        assert!(cache.get_record(&key).await.is_none());
        // Population is suppressed while the key is pending
        cache.put_record(&serialized(b"fresh")).await;
        assert!(cache.get_record(&key).await.is_none());

        fail.store(false, Ordering::SeqCst);
        assert_eq!(cache.flush_pending().await, 0);
        assert!(cache.get_record(&key).await.is_none());

        cache.put_record(&serialized(b"fresh")).await;
        assert_eq!(cache.get_record(&key).await.unwrap().as_ref(), b"fresh");
    }
}
