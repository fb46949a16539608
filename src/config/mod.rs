use std::env;
use std::time::Duration;

/// Service configuration, read from the environment at process start
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Maximum upload size in bytes (default: 10 MiB)
    pub max_file_size: usize,

    /// Metadata database URL (default: local SQLite file)
    pub database_url: String,

    /// S3-compatible endpoint; AWS default resolution when unset
    pub s3_endpoint: Option<String>,
    pub s3_access_key: Option<String>,
    pub s3_secret_key: Option<String>,
    pub s3_region: String,

    /// Blob bucket (default: "uploads")
    pub bucket: String,

    /// Read cache backend: "redis" or "memory" (default: "redis")
    pub cache_backend: String,
    pub redis_url: String,
    pub cache_prefix: String,
    /// Entry limit for the in-memory cache backend
    pub cache_capacity: u64,
    pub cache_pool_size: usize,

    /// Event publisher: "kafka" or "noop" (default: "kafka")
    pub publisher_type: String,
    pub kafka_brokers: String,
    /// Topic for upload events (default: the bucket name)
    pub event_topic: String,

    /// Deadline applied to every store, cache and publisher call
    pub store_timeout: Duration,

    /// How long a resolved session token is remembered
    pub session_ttl: Duration,
    pub session_capacity: u64,

    /// JWT secret used to verify session tokens
    pub jwt_secret: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024, // 10 MiB
            database_url: "sqlite://files.db?mode=rwc".to_string(),
            s3_endpoint: None,
            s3_access_key: None,
            s3_secret_key: None,
            s3_region: "us-east-1".to_string(),
            bucket: "uploads".to_string(),
            cache_backend: "redis".to_string(),
            redis_url: "redis://127.0.0.1:6379".to_string(),
            cache_prefix: "files".to_string(),
            cache_capacity: 10_000,
            cache_pool_size: 16,
            publisher_type: "kafka".to_string(),
            kafka_brokers: "127.0.0.1:9092".to_string(),
            event_topic: "uploads".to_string(),
            store_timeout: Duration::from_secs(10),
            session_ttl: Duration::from_secs(60),
            session_capacity: 100,
            jwt_secret: "secret".to_string(),
        }
    }
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

impl ServiceConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();
        let bucket = env::var("BUCKET").unwrap_or(default.bucket);

        Self {
            max_file_size: parsed("MAX_FILE_SIZE").unwrap_or(default.max_file_size),
            database_url: env::var("DATABASE_URL").unwrap_or(default.database_url),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            s3_access_key: env::var("S3_ACCESS_KEY").ok(),
            s3_secret_key: env::var("S3_SECRET_KEY").ok(),
            s3_region: env::var("S3_REGION").unwrap_or(default.s3_region),
            event_topic: env::var("EVENT_TOPIC").unwrap_or_else(|_| bucket.clone()),
            bucket,
            cache_backend: env::var("CACHE_BACKEND").unwrap_or(default.cache_backend),
            redis_url: env::var("REDIS_URL").unwrap_or(default.redis_url),
            cache_prefix: env::var("CACHE_PREFIX").unwrap_or(default.cache_prefix),
            cache_capacity: parsed("CACHE_CAPACITY").unwrap_or(default.cache_capacity),
            cache_pool_size: parsed("CACHE_POOL_SIZE").unwrap_or(default.cache_pool_size),
            publisher_type: env::var("EVENT_PUBLISHER").unwrap_or(default.publisher_type),
            kafka_brokers: env::var("KAFKA_BROKERS").unwrap_or(default.kafka_brokers),
            store_timeout: parsed("STORE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(default.store_timeout),
            session_ttl: parsed("SESSION_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(default.session_ttl),
            session_capacity: parsed("SESSION_CAPACITY").unwrap_or(default.session_capacity),
            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret),
        }
    }

    /// Create config for development (in-process cache, no broker)
    pub fn development() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            cache_backend: "memory".to_string(),
            publisher_type: "noop".to_string(),
            store_timeout: Duration::from_secs(5),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.cache_backend, "redis");
        assert_eq!(config.publisher_type, "kafka");
        assert_eq!(config.event_topic, config.bucket);
        assert_eq!(config.session_capacity, 100);
        assert_eq!(config.session_ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_development_config() {
        let config = ServiceConfig::development();
        assert_eq!(config.cache_backend, "memory");
        assert_eq!(config.publisher_type, "noop");
        assert_eq!(config.max_file_size, 10 * 1024 * 1024);
    }
}
