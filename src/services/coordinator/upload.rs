use super::FileCoordinator;
use crate::api::error::AppError;
use crate::models::{ContentHolder, UploadBody};

impl FileCoordinator {
    /// Publish, then persist to the blob store, then the metadata store, then
    /// drop the cached entries. Re-uploading an existing name produces the
    /// next version of that record.
    pub async fn upload(&self, holder: ContentHolder<UploadBody>) -> Result<(), AppError> {
        self.ensure_within_limit(&holder)?;
        let key = holder.key();
        let id = key.to_string();

        self.step(self.publisher.name(), "publish", &id, self.publisher.publish(&holder))
            .await?;
        self.step(self.blobs.backend(), "insert", &id, self.blobs.insert(&holder))
            .await?;
        self.step(
            self.metadata.backend(),
            "insert",
            &id,
            self.metadata.insert(&holder),
        )
        .await?;
        self.cache.invalidate(&key).await;

        tracing::info!("📤 Stored {} ({} bytes)", id, holder.size);
        Ok(())
    }

    /// Like [`FileCoordinator::upload`], but only for a record that already
    /// exists. A missing record is reported before anything is published.
    pub async fn update(&self, holder: ContentHolder<UploadBody>) -> Result<(), AppError> {
        self.ensure_within_limit(&holder)?;
        let key = holder.key();
        let id = key.to_string();

        if !self.step_exists(self.metadata.as_ref(), &key).await? {
            return Err(AppError::NotFound(format!("File {} not found", holder.file)));
        }

        self.step(self.publisher.name(), "publish", &id, self.publisher.publish(&holder))
            .await?;
        self.step(self.blobs.backend(), "update", &id, self.blobs.update(&holder))
            .await?;
        self.step(
            self.metadata.backend(),
            "update",
            &id,
            self.metadata.update(&holder),
        )
        .await?;
        self.cache.invalidate(&key).await;

        tracing::info!("📝 Updated {} ({} bytes)", id, holder.size);
        Ok(())
    }

    fn ensure_within_limit(&self, holder: &ContentHolder<UploadBody>) -> Result<(), AppError> {
        if holder.content.len() > self.max_file_size {
            return Err(self.too_large());
        }
        Ok(())
    }
}
