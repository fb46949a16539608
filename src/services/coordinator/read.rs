use super::FileCoordinator;
use crate::api::error::AppError;
use crate::models::{BlobObject, ContentHolder, NoContent, OwnerScope, RecordKey, SerializedBody};
use bytes::Bytes;

impl FileCoordinator {
    /// Serialized metadata for one file. Cached bytes are returned verbatim.
    pub async fn info(&self, holder: &ContentHolder<NoContent>) -> Result<Bytes, AppError> {
        let key = holder.key();
        if let Some(hit) = self.cache.get_record(&key).await {
            tracing::debug!("Cache hit for {}", key);
            return Ok(hit);
        }

        let id = key.to_string();
        let record = self
            .step(self.metadata.backend(), "get", &id, self.metadata.get(&key))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("File {} not found", holder.file)))?;

        let body = Bytes::from(serde_json::to_vec(&record)?);
        self.cache
            .put_record(&holder.with_serialized(SerializedBody::new(body.clone())))
            .await;
        Ok(body)
    }

    /// Serialized list of every file the owner has.
    ///
    /// When the metadata store cannot be reached the listing is rebuilt from
    /// the blob store instead. That degraded answer is never cached.
    pub async fn list(&self, owner: &OwnerScope) -> Result<Bytes, AppError> {
        if let Some(hit) = self.cache.get_list(owner).await {
            tracing::debug!("Cache hit for list of {}", owner.id);
            return Ok(hit);
        }

        let scope = owner.object_prefix();
        let listed = self
            .step(self.metadata.backend(), "list", &scope, self.metadata.list(owner))
            .await;

        match listed {
            Ok(files) => {
                let body = Bytes::from(serde_json::to_vec(&files)?);
                self.cache
                    .put_list(owner, SerializedBody::new(body.clone()))
                    .await;
                Ok(body)
            }
            Err(AppError::Dependency { source, .. }) => {
                tracing::warn!(
                    "⚠️  Metadata list failed for {}, falling back to blob listing: {:?}",
                    owner.id,
                    source
                );
                let files = self
                    .step(self.blobs.backend(), "list", &scope, self.blobs.list(owner))
                    .await?;
                Ok(Bytes::from(serde_json::to_vec(&files)?))
            }
            Err(e) => Err(e),
        }
    }

    /// Raw content of one file, straight from the blob store.
    pub async fn download(&self, key: &RecordKey) -> Result<BlobObject, AppError> {
        if !self.step_exists(self.blobs.as_ref(), key).await? {
            return Err(AppError::NotFound(format!("File {} not found", key.file)));
        }

        let id = key.to_string();
        self.step(self.blobs.backend(), "get", &id, self.blobs.get(key))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("File {} not found", key.file)))
    }
}
