use super::FileCoordinator;
use crate::api::error::AppError;
use crate::models::RecordKey;

impl FileCoordinator {
    /// Removes the blob, then the metadata record, then the cached entries.
    /// The owner's parent record is left in place.
    pub async fn delete(&self, key: &RecordKey) -> Result<(), AppError> {
        if !self.step_exists(self.metadata.as_ref(), key).await? {
            return Err(AppError::NotFound(format!("File {} not found", key.file)));
        }

        let id = key.to_string();
        self.step(self.blobs.backend(), "delete", &id, self.blobs.delete(key))
            .await?;
        self.step(
            self.metadata.backend(),
            "delete",
            &id,
            self.metadata.delete(key),
        )
        .await?;
        self.cache.invalidate(key).await;

        tracing::info!("🗑️  Deleted {}", id);
        Ok(())
    }
}
