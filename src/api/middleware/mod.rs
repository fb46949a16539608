pub mod auth;
pub mod metrics;
pub mod no_cache;
pub mod request_id;
