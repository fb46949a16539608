#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use rust_file_store::infrastructure::database::setup_database;
use rust_file_store::models::{
    BlobObject, ContentHolder, FileResponse, OwnerScope, RecordKey, UploadBody, decode_component,
};
use rust_file_store::services::cache::{CacheLayer, MemoryCache};
use rust_file_store::services::coordinator::FileCoordinator;
use rust_file_store::services::events::EventPublisher;
use rust_file_store::services::metadata::MetadataStore;
use rust_file_store::services::store::{BackendError, RecordStore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const MAX_FILE_SIZE: usize = 1024;

/// Shared, ordered record of every backend call made during a test.
pub type OpLog = Arc<Mutex<Vec<String>>>;

fn record(log: &OpLog, entry: String) {
    log.lock().unwrap().push(entry);
}

fn injected(what: &str) -> BackendError {
    BackendError::transport(anyhow::anyhow!("injected {} failure", what))
}

/// In-memory blob store.
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, (Bytes, String)>>,
    pub fail_writes: AtomicBool,
    log: OpLog,
}

impl MemoryBlobStore {
    pub fn new(log: OpLog) -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            fail_writes: AtomicBool::new(false),
            log,
        }
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    fn put(&self, holder: &ContentHolder<UploadBody>) -> Result<(), BackendError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(injected("blob write"));
        }
        self.objects.lock().unwrap().insert(
            holder.key().object_key(),
            (holder.content.bytes(), holder.content_type.clone()),
        );
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryBlobStore {
    type Record = BlobObject;

    fn backend(&self) -> &'static str {
        "blob"
    }

    async fn get(&self, key: &RecordKey) -> Result<Option<BlobObject>, BackendError> {
        record(&self.log, format!("blob.get {}", key));
        Ok(self
            .objects
            .lock()
            .unwrap()
            .get(&key.object_key())
            .map(|(body, content_type)| BlobObject {
                body: body.clone(),
                content_type: Some(content_type.clone()),
            }))
    }

    async fn insert(&self, holder: &ContentHolder<UploadBody>) -> Result<(), BackendError> {
        record(&self.log, format!("blob.insert {}", holder.key()));
        self.put(holder)
    }

    async fn update(&self, holder: &ContentHolder<UploadBody>) -> Result<(), BackendError> {
        record(&self.log, format!("blob.update {}", holder.key()));
        self.put(holder)
    }

    async fn delete(&self, key: &RecordKey) -> Result<(), BackendError> {
        record(&self.log, format!("blob.delete {}", key));
        self.objects.lock().unwrap().remove(&key.object_key());
        Ok(())
    }

    async fn exists(&self, key: &RecordKey) -> bool {
        self.objects
            .lock()
            .unwrap()
            .contains_key(&key.object_key())
    }

    async fn list(&self, owner: &OwnerScope) -> Result<Vec<FileResponse>, BackendError> {
        record(&self.log, format!("blob.list {}", owner.id));
        let prefix = owner.object_prefix();
        let now = Utc::now();
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(key, (body, _))| {
                key.strip_prefix(&prefix).map(|file| FileResponse {
                    file: decode_component(file),
                    upload_time: now,
                    last_modified: now,
                    version: 1,
                    size: body.len() as i64,
                    content_type: String::new(),
                    description: String::new(),
                })
            })
            .collect())
    }
}

/// Real metadata store on in-memory SQLite, with call logging and
/// switchable failures.
pub struct ObservedMetadata {
    inner: MetadataStore,
    pub fail_writes: AtomicBool,
    pub fail_reads: AtomicBool,
    log: OpLog,
}

impl ObservedMetadata {
    fn check(&self, flag: &AtomicBool, what: &str) -> Result<(), BackendError> {
        if flag.load(Ordering::SeqCst) {
            return Err(injected(what));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for ObservedMetadata {
    type Record = FileResponse;

    fn backend(&self) -> &'static str {
        self.inner.backend()
    }

    async fn get(&self, key: &RecordKey) -> Result<Option<FileResponse>, BackendError> {
        record(&self.log, format!("metadata.get {}", key));
        self.check(&self.fail_reads, "metadata read")?;
        self.inner.get(key).await
    }

    async fn insert(&self, holder: &ContentHolder<UploadBody>) -> Result<(), BackendError> {
        record(&self.log, format!("metadata.insert {}", holder.key()));
        self.check(&self.fail_writes, "metadata write")?;
        self.inner.insert(holder).await
    }

    async fn update(&self, holder: &ContentHolder<UploadBody>) -> Result<(), BackendError> {
        record(&self.log, format!("metadata.update {}", holder.key()));
        self.check(&self.fail_writes, "metadata write")?;
        self.inner.update(holder).await
    }

    async fn delete(&self, key: &RecordKey) -> Result<(), BackendError> {
        record(&self.log, format!("metadata.delete {}", key));
        self.check(&self.fail_writes, "metadata write")?;
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &RecordKey) -> bool {
        record(&self.log, format!("metadata.exists {}", key));
        if self.fail_reads.load(Ordering::SeqCst) {
            return false;
        }
        self.inner.exists(key).await
    }

    async fn list(&self, owner: &OwnerScope) -> Result<Vec<FileResponse>, BackendError> {
        record(&self.log, format!("metadata.list {}", owner.id));
        self.check(&self.fail_reads, "metadata read")?;
        self.inner.list(owner).await
    }
}

/// Publisher that remembers what it acknowledged and can be made to fail.
pub struct RecordingPublisher {
    pub fail: AtomicBool,
    log: OpLog,
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn publish(&self, holder: &ContentHolder<UploadBody>) -> Result<(), BackendError> {
        record(&self.log, format!("publish {}", holder.key()));
        if self.fail.load(Ordering::SeqCst) {
            return Err(injected("publish"));
        }
        Ok(())
    }
}

pub struct Harness {
    pub coordinator: Arc<FileCoordinator>,
    pub blobs: Arc<MemoryBlobStore>,
    pub metadata: Arc<ObservedMetadata>,
    pub publisher: Arc<RecordingPublisher>,
    pub cache: Arc<CacheLayer>,
    pub log: OpLog,
}

impl Harness {
    pub async fn new() -> Self {
        let log: OpLog = Arc::new(Mutex::new(Vec::new()));
        let db = setup_database("sqlite::memory:").await.unwrap();

        let blobs = Arc::new(MemoryBlobStore::new(log.clone()));
        let metadata = Arc::new(ObservedMetadata {
            inner: MetadataStore::new(db),
            fail_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
            log: log.clone(),
        });
        let publisher = Arc::new(RecordingPublisher {
            fail: AtomicBool::new(false),
            log: log.clone(),
        });
        let cache = Arc::new(CacheLayer::new(
            Box::new(MemoryCache::new(100)),
            Duration::from_secs(1),
        ));

        let coordinator = Arc::new(FileCoordinator::new(
            blobs.clone(),
            metadata.clone(),
            cache.clone(),
            publisher.clone(),
            MAX_FILE_SIZE,
            Duration::from_secs(5),
        ));

        Self {
            coordinator,
            blobs,
            metadata,
            publisher,
            cache,
            log,
        }
    }

    /// Backend calls made so far; clears the log.
    pub fn take_ops(&self) -> Vec<String> {
        std::mem::take(&mut *self.log.lock().unwrap())
    }
}

pub fn owner() -> OwnerScope {
    OwnerScope::new("u1", "Ada", "Lovelace")
}

pub fn upload(file: &str, content: &'static [u8], description: &str) -> ContentHolder<UploadBody> {
    ContentHolder::upload(
        owner(),
        file,
        "text/plain",
        description,
        UploadBody::new(content),
    )
}
