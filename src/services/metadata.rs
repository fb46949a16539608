use crate::entities::{prelude::*, *};
use crate::models::{ContentHolder, FileResponse, OwnerScope, RecordKey, UploadBody};
use crate::services::store::{BackendError, RecordStore};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr,
};

/// Versioned attribute storage, partitioned by owner scope.
///
/// Each owner has one `profiles` row; file attributes live in `file_records`
/// keyed by (owner id, file name), so listing an owner is a range over the
/// leading primary-key column.
pub struct MetadataStore {
    db: DatabaseConnection,
}

impl MetadataStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Makes sure the owner's parent record exists, creating it from the
    /// holder's display names if absent. A concurrent creator winning the
    /// race is success, not failure.
    async fn ensure_parent(&self, owner: &OwnerScope) -> Result<(), BackendError> {
        if Profiles::find_by_id(owner.id.clone())
            .one(&self.db)
            .await?
            .is_some()
        {
            return Ok(());
        }

        let profile = profiles::ActiveModel {
            id: Set(owner.id.clone()),
            first_name: Set(owner.first_name.clone()),
            last_name: Set(owner.last_name.clone()),
            created_at: Set(Utc::now()),
        };

        let res = Profiles::insert(profile)
            .on_conflict(
                OnConflict::column(profiles::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await;

        match res {
            Ok(0) => {
                tracing::debug!("Profile {} created concurrently", owner.id);
                Ok(())
            }
            Ok(_) => {
                tracing::info!("👤 Created profile record for owner {}", owner.id);
                Ok(())
            }
            Err(e) if is_conflict(&e) => {
                tracing::debug!("Profile {} already exists: {}", owner.id, e);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Parent record insert failed for {}: {}", owner.id, e);
                Err(e.into())
            }
        }
    }

    async fn find(&self, key: &RecordKey) -> Result<Option<file_records::Model>, BackendError> {
        let record = FileRecords::find_by_id((key.owner.clone(), key.file.clone()))
            .one(&self.db)
            .await?;
        Ok(record)
    }
}

fn is_conflict(err: &DbErr) -> bool {
    matches!(err, DbErr::RecordNotInserted)
        || matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn to_response(record: file_records::Model) -> FileResponse {
    FileResponse {
        file: record.file_name,
        upload_time: record.upload_time,
        last_modified: record.last_modified,
        version: record.version,
        size: record.size,
        content_type: record.content_type,
        description: record.description,
    }
}

#[async_trait]
impl RecordStore for MetadataStore {
    type Record = FileResponse;

    fn backend(&self) -> &'static str {
        "metadata"
    }

    async fn get(&self, key: &RecordKey) -> Result<Option<FileResponse>, BackendError> {
        Ok(self.find(key).await?.map(to_response))
    }

    async fn insert(&self, holder: &ContentHolder<UploadBody>) -> Result<(), BackendError> {
        self.ensure_parent(&holder.owner).await?;

        let now = Utc::now();
        let record = file_records::ActiveModel {
            owner_id: Set(holder.owner.id.clone()),
            file_name: Set(holder.file.clone()),
            size: Set(holder.size),
            content_type: Set(holder.content_type.clone()),
            description: Set(holder.description.clone()),
            upload_time: Set(now),
            last_modified: Set(now),
            version: Set(1),
        };

        // An existing record keeps its version ledger: re-uploading the same
        // name becomes the next version instead of resetting to 1.
        let res = FileRecords::insert(record)
            .on_conflict(
                OnConflict::columns([
                    file_records::Column::OwnerId,
                    file_records::Column::FileName,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await;

        match res {
            Ok(0) => {
                tracing::info!("{} already recorded, storing as a new version", holder.key());
                self.update(holder).await
            }
            Ok(_) => Ok(()),
            Err(e) if is_conflict(&e) => {
                tracing::info!("{} already recorded, storing as a new version", holder.key());
                self.update(holder).await
            }
            Err(e) => {
                tracing::error!("Record insert failed for {}: {}", holder.key(), e);
                Err(e.into())
            }
        }
    }

    async fn update(&self, holder: &ContentHolder<UploadBody>) -> Result<(), BackendError> {
        self.ensure_parent(&holder.owner).await?;

        let key = holder.key();
        let existing = self
            .find(&key)
            .await?
            .ok_or_else(|| BackendError::NotFound(format!("No record to update for {}", key)))?;

        // Keep last_modified strictly increasing even when the clock does not
        // advance between two writes.
        let now = Utc::now().max(existing.last_modified + Duration::microseconds(1));
        let version = existing.version + 1;

        let mut active: file_records::ActiveModel = existing.into();
        active.version = Set(version);
        active.last_modified = Set(now);
        active.size = Set(holder.size);
        active.content_type = Set(holder.content_type.clone());
        // An update without a description keeps the current one
        if !holder.description.is_empty() {
            active.description = Set(holder.description.clone());
        }

        match active.update(&self.db).await {
            Ok(_) => Ok(()),
            Err(DbErr::RecordNotUpdated) => Err(BackendError::NotFound(format!(
                "Record {} vanished during update",
                key
            ))),
            Err(e) => {
                tracing::error!("Record update failed for {}: {}", key, e);
                Err(e.into())
            }
        }
    }

    async fn delete(&self, key: &RecordKey) -> Result<(), BackendError> {
        let res = FileRecords::delete_by_id((key.owner.clone(), key.file.clone()))
            .exec(&self.db)
            .await
            .map_err(|e| {
                tracing::error!("Record delete failed for {}: {}", key, e);
                e
            })?;

        if res.rows_affected == 0 {
            tracing::debug!("Record {} already absent", key);
        }
        Ok(())
    }

    async fn exists(&self, key: &RecordKey) -> bool {
        match self.find(key).await {
            Ok(record) => record.is_some(),
            Err(e) => {
                tracing::warn!("Metadata existence check failed for {}: {}", key, e);
                false
            }
        }
    }

    async fn list(&self, owner: &OwnerScope) -> Result<Vec<FileResponse>, BackendError> {
        let records = FileRecords::find()
            .filter(file_records::Column::OwnerId.eq(&owner.id))
            .all(&self.db)
            .await
            .map_err(|e| {
                tracing::error!("Unable to list records for {}: {}", owner.id, e);
                e
            })?;

        Ok(records.into_iter().map(to_response).collect())
    }
}
