pub mod cache;
pub mod coordinator;
pub mod events;
pub mod metadata;
pub mod sessions;
pub mod storage;
pub mod store;
