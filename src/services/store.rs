use crate::models::{ContentHolder, FileResponse, OwnerScope, RecordKey, UploadBody};
use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by a backing store, cache backend or publisher.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Transport error: {0}")]
    Transport(anyhow::Error),
}

impl BackendError {
    pub fn transport<E>(err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        BackendError::Transport(err.into())
    }
}

/// Uniform contract implemented by every durable store the coordinator
/// writes to, so the coordinator never depends on a concrete backend.
///
/// - `get` returns `Ok(None)` for an absent record, never an error.
/// - `update` derives version and creation time from the current state and
///   fails with [`BackendError::NotFound`] when there is nothing to update.
/// - `delete` is idempotent.
/// - `exists` only reports presence; transport failures yield `false`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    type Record: Send;

    /// Short backend name used in logs and error reports.
    fn backend(&self) -> &'static str;

    async fn get(&self, key: &RecordKey) -> Result<Option<Self::Record>, BackendError>;

    async fn insert(&self, holder: &ContentHolder<UploadBody>) -> Result<(), BackendError>;

    async fn update(&self, holder: &ContentHolder<UploadBody>) -> Result<(), BackendError>;

    async fn delete(&self, key: &RecordKey) -> Result<(), BackendError>;

    async fn exists(&self, key: &RecordKey) -> bool;

    /// All records under an owner scope. Order is unspecified.
    async fn list(&self, owner: &OwnerScope) -> Result<Vec<FileResponse>, BackendError>;
}
