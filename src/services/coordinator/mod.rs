//! Orchestrates one logical file record across the blob store, the metadata
//! store, the event publisher and the read cache.
//!
//! Each operation runs its steps strictly in sequence. The first failing step
//! aborts the request; earlier steps are not rolled back. Inconsistency
//! windows between stores are repaired by re-uploading, which is idempotent.

use crate::api::error::AppError;
use crate::models::{BlobObject, FileResponse, RecordKey};
use crate::services::cache::CacheLayer;
use crate::services::events::EventPublisher;
use crate::services::store::{BackendError, RecordStore};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub mod delete;
pub mod read;
pub mod upload;

pub type DynBlobStore = dyn RecordStore<Record = BlobObject>;
pub type DynMetadataStore = dyn RecordStore<Record = FileResponse>;

pub struct FileCoordinator {
    blobs: Arc<DynBlobStore>,
    metadata: Arc<DynMetadataStore>,
    cache: Arc<CacheLayer>,
    publisher: Arc<dyn EventPublisher>,
    max_file_size: usize,
    step_timeout: Duration,
}

impl FileCoordinator {
    pub fn new(
        blobs: Arc<DynBlobStore>,
        metadata: Arc<DynMetadataStore>,
        cache: Arc<CacheLayer>,
        publisher: Arc<dyn EventPublisher>,
        max_file_size: usize,
        step_timeout: Duration,
    ) -> Self {
        Self {
            blobs,
            metadata,
            cache,
            publisher,
            max_file_size,
            step_timeout,
        }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    pub fn cache(&self) -> &CacheLayer {
        &self.cache
    }

    /// Rejects a declared request length above the ceiling before any
    /// content is read.
    pub fn check_declared_length(&self, declared: Option<u64>) -> Result<(), AppError> {
        match declared {
            Some(len) if len > self.max_file_size as u64 => Err(self.too_large()),
            _ => Ok(()),
        }
    }

    /// Process teardown: deliver invalidations that failed earlier and flush
    /// the publisher.
    pub async fn shutdown(&self) {
        let remaining = self.cache.flush_pending().await;
        if remaining > 0 {
            tracing::warn!(
                "⚠️  {} cache invalidations could not be delivered before shutdown",
                remaining
            );
        }
        self.publisher.shutdown().await;
    }

    fn too_large(&self) -> AppError {
        AppError::BadRequest(format!(
            "File size exceeded {} MB",
            self.max_file_size / 1024 / 1024
        ))
    }

    /// Runs one step under the step deadline, mapping store failures onto the
    /// request error taxonomy.
    async fn step<T, F>(
        &self,
        backend: &'static str,
        operation: &'static str,
        key: &str,
        fut: F,
    ) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, BackendError>>,
    {
        match tokio::time::timeout(self.step_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(BackendError::NotFound(msg))) => Err(AppError::NotFound(msg)),
            Ok(Err(BackendError::Transport(source))) => Err(AppError::Dependency {
                backend,
                operation,
                key: key.to_string(),
                source,
            }),
            Ok(Err(BackendError::Database(e))) => Err(AppError::Dependency {
                backend,
                operation,
                key: key.to_string(),
                source: e.into(),
            }),
            Err(_) => Err(AppError::Dependency {
                backend,
                operation,
                key: key.to_string(),
                source: anyhow::anyhow!("deadline of {:?} exceeded", self.step_timeout),
            }),
        }
    }

    /// Presence check under the step deadline. An elapsed deadline is a
    /// dependency failure rather than "absent".
    async fn step_exists<R: Send>(
        &self,
        store: &dyn RecordStore<Record = R>,
        key: &RecordKey,
    ) -> Result<bool, AppError> {
        let id = key.to_string();
        self.step(store.backend(), "exists", &id, async {
            Ok(store.exists(key).await)
        })
        .await
    }
}
