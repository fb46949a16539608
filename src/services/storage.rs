use crate::models::{
    BlobObject, ContentHolder, FileResponse, OwnerScope, RecordKey, UploadBody, decode_component,
};
use crate::services::store::{BackendError, RecordStore};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};

/// Raw content storage in an S3-compatible bucket, addressed by
/// `<owner>/<file>`.
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    async fn put(&self, holder: &ContentHolder<UploadBody>) -> Result<(), BackendError> {
        let key = holder.key().object_key();
        let body = holder.content.bytes();

        let res = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(&holder.content_type)
            .content_length(body.len() as i64)
            .body(ByteStream::from(body))
            .send()
            .await;

        if let Err(e) = res {
            tracing::error!(
                "S3 put_object failed: bucket={}, key={}, error={:?}",
                self.bucket,
                key,
                e
            );
            return Err(BackendError::transport(e));
        }
        Ok(())
    }
}

fn to_chrono(d: &aws_sdk_s3::primitives::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp(d.secs(), d.subsec_nanos()).unwrap_or_default()
}

#[async_trait]
impl RecordStore for S3BlobStore {
    type Record = BlobObject;

    fn backend(&self) -> &'static str {
        "blob"
    }

    async fn get(&self, key: &RecordKey) -> Result<Option<BlobObject>, BackendError> {
        if !self.exists(key).await {
            return Ok(None);
        }

        let res = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key.object_key())
            .send()
            .await
            .map_err(BackendError::transport)?;

        let content_type = res.content_type.clone();
        let body = res
            .body
            .collect()
            .await
            .map_err(BackendError::transport)?
            .into_bytes();

        Ok(Some(BlobObject { body, content_type }))
    }

    async fn insert(&self, holder: &ContentHolder<UploadBody>) -> Result<(), BackendError> {
        self.put(holder).await
    }

    /// Full overwrite; objects have no partial-write semantics.
    async fn update(&self, holder: &ContentHolder<UploadBody>) -> Result<(), BackendError> {
        self.put(holder).await
    }

    async fn delete(&self, key: &RecordKey) -> Result<(), BackendError> {
        if !self.exists(key).await {
            tracing::debug!("Object {} already absent", key);
            return Ok(());
        }

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key.object_key())
            .send()
            .await
            .map_err(BackendError::transport)?;
        Ok(())
    }

    async fn exists(&self, key: &RecordKey) -> bool {
        let res = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key.object_key())
            .send()
            .await;

        match res {
            Ok(_) => true,
            Err(e) => {
                let service_error = e.into_service_error();
                if !service_error.is_not_found() {
                    tracing::warn!("S3 head_object failed for {}: {}", key, service_error);
                }
                false
            }
        }
    }

    /// Expensive fallback enumeration. Objects carry no version ledger, so
    /// every entry reports version 1 and the object's own timestamps.
    async fn list(&self, owner: &OwnerScope) -> Result<Vec<FileResponse>, BackendError> {
        let prefix = owner.object_prefix();
        let mut entries = Vec::new();
        let mut continuation_token = None;

        loop {
            let res = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&prefix)
                .set_continuation_token(continuation_token)
                .send()
                .await
                .map_err(BackendError::transport)?;

            if let Some(contents) = res.contents {
                for object in contents {
                    let Some(file) = object
                        .key
                        .as_deref()
                        .and_then(|key| key.strip_prefix(&prefix))
                        .map(decode_component)
                    else {
                        continue;
                    };
                    let modified = object.last_modified.as_ref().map(to_chrono).unwrap_or_default();
                    entries.push(FileResponse {
                        file,
                        upload_time: modified,
                        last_modified: modified,
                        version: 1,
                        size: object.size.unwrap_or(0),
                        content_type: String::new(),
                        description: String::new(),
                    });
                }
            }

            if res.is_truncated.unwrap_or(false) {
                continuation_token = res.next_continuation_token;
            } else {
                break;
            }
        }

        Ok(entries)
    }
}
