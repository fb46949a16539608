use bytes::Bytes;
use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Characters escaped in every key component: the separators used when
/// joining components, and `%` itself so the encoding stays injective.
const KEY_COMPONENT: &AsciiSet = &CONTROLS.add(b'%').add(b'/').add(b':');

fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, KEY_COMPONENT).to_string()
}

/// Inverse of the component encoding, for names read back from a key.
pub fn decode_component(encoded: &str) -> String {
    percent_decode_str(encoded).decode_utf8_lossy().into_owned()
}

/// The user a file belongs to, as resolved from an authenticated session.
///
/// The display-name pair is only used to materialize the owner's parent
/// record in the metadata store the first time that owner writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerScope {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
}

impl OwnerScope {
    pub fn new(
        id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// Cache key for this owner's full list response.
    pub fn list_cache_key(&self) -> String {
        format!("files:{}", encode_component(&self.id))
    }

    /// Object-store prefix under which all of this owner's blobs live.
    pub fn object_prefix(&self) -> String {
        format!("{}/", encode_component(&self.id))
    }
}

/// Two-level identity of a file record: (owner scope, file name).
///
/// Stable across updates; every backend derives its own key from it. Each
/// component is escaped before joining, so distinct pairs never share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub owner: String,
    pub file: String,
}

impl RecordKey {
    pub fn new(owner: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            file: file.into(),
        }
    }

    pub fn object_key(&self) -> String {
        format!(
            "{}/{}",
            encode_component(&self.owner),
            encode_component(&self.file)
        )
    }

    pub fn cache_key(&self) -> String {
        format!(
            "file:{}:{}",
            encode_component(&self.owner),
            encode_component(&self.file)
        )
    }

    pub fn list_cache_key(&self) -> String {
        format!("files:{}", encode_component(&self.owner))
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.file)
    }
}

/// Upload content, read off the wire exactly once.
///
/// Cloning is cheap and every consumer (publisher, blob writer) works on its
/// own handle, so no consumer ever sees a stream another one has drained.
#[derive(Debug, Clone, Default)]
pub struct UploadBody(Bytes);

impl UploadBody {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self(data.into())
    }

    pub fn bytes(&self) -> Bytes {
        self.0.clone()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An already-serialized response body destined for the read cache.
#[derive(Debug, Clone)]
pub struct SerializedBody(Bytes);

impl SerializedBody {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self(data.into())
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    pub fn bytes(&self) -> Bytes {
        self.0.clone()
    }
}

/// Marker for holders that carry identity only (reads, deletes).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContent;

/// Per-request aggregate passed between the coordinator and the stores.
///
/// The content parameter fixes at compile time what a consumer may expect:
/// `ContentHolder<UploadBody>` for writes and publishing,
/// `ContentHolder<SerializedBody>` for cache population and
/// `ContentHolder<NoContent>` for lookups.
#[derive(Debug, Clone)]
pub struct ContentHolder<C = NoContent> {
    pub owner: OwnerScope,
    pub file: String,
    pub size: i64,
    pub content_type: String,
    pub description: String,
    pub content: C,
}

impl ContentHolder<NoContent> {
    pub fn lookup(owner: OwnerScope, file: impl Into<String>) -> Self {
        Self {
            owner,
            file: file.into(),
            size: 0,
            content_type: String::new(),
            description: String::new(),
            content: NoContent,
        }
    }
}

impl ContentHolder<UploadBody> {
    /// Builds an upload holder; `size` is taken from the buffered content.
    pub fn upload(
        owner: OwnerScope,
        file: impl Into<String>,
        content_type: impl Into<String>,
        description: impl Into<String>,
        body: UploadBody,
    ) -> Self {
        Self {
            owner,
            file: file.into(),
            size: body.len() as i64,
            content_type: content_type.into(),
            description: description.into(),
            content: body,
        }
    }
}

impl<C> ContentHolder<C> {
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.owner.id.clone(), self.file.clone())
    }

    /// Re-targets this holder at a serialized response for the cache.
    pub fn with_serialized(&self, body: SerializedBody) -> ContentHolder<SerializedBody> {
        ContentHolder {
            owner: self.owner.clone(),
            file: self.file.clone(),
            size: self.size,
            content_type: self.content_type.clone(),
            description: self.description.clone(),
            content: body,
        }
    }
}

/// Public projection of a file record, as returned by info and list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FileResponse {
    pub file: String,
    pub upload_time: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub version: i32,
    pub size: i64,
    #[serde(rename = "type")]
    pub content_type: String,
    pub description: String,
}

/// Raw content fetched back from the blob store.
#[derive(Debug, Clone)]
pub struct BlobObject {
    pub body: Bytes,
    pub content_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> OwnerScope {
        OwnerScope::new("u1", "Ada", "Lovelace")
    }

    #[test]
    fn test_record_keys_are_scoped_by_owner() {
        let key = RecordKey::new("u1", "a.txt");
        assert_eq!(key.object_key(), "u1/a.txt");
        assert_eq!(key.cache_key(), "file:u1:a.txt");
        assert_eq!(key.list_cache_key(), owner().list_cache_key());
        assert_ne!(key.cache_key(), key.list_cache_key());
    }

    #[test]
    fn test_separators_in_components_do_not_collide() {
        let colon_owner = RecordKey::new("a:b", "c");
        let colon_file = RecordKey::new("a", "b:c");
        assert_ne!(colon_owner.cache_key(), colon_file.cache_key());
        assert_ne!(colon_owner.object_key(), colon_file.object_key());

        let slash_owner = RecordKey::new("u1/x", "y");
        let slash_file = RecordKey::new("u1", "x/y");
        assert_ne!(slash_owner.object_key(), slash_file.object_key());
        assert!(
            !slash_owner
                .object_key()
                .starts_with(&OwnerScope::new("u1", "", "").object_prefix())
        );

        // An escaped-looking name stays distinct from the raw separator
        assert_ne!(
            RecordKey::new("a", "b%3Ac").cache_key(),
            colon_file.cache_key()
        );
    }

    #[test]
    fn test_file_component_decodes_back() {
        let key = RecordKey::new("u1", "x/y:z%.txt");
        let prefix = OwnerScope::new("u1", "", "").object_prefix();
        let encoded = key.object_key();
        let file = encoded.strip_prefix(&prefix).unwrap();
        assert_eq!(decode_component(file), "x/y:z%.txt");
    }

    #[test]
    fn test_upload_holder_takes_size_from_content() {
        let holder = ContentHolder::upload(
            owner(),
            "a.txt",
            "text/plain",
            "note",
            UploadBody::new(&b"0123456789"[..]),
        );
        assert_eq!(holder.size, 10);
        assert_eq!(holder.key(), RecordKey::new("u1", "a.txt"));
    }

    #[test]
    fn test_upload_handles_are_independent() {
        let body = UploadBody::new(&b"hello world"[..]);

        let mut first = body.bytes();
        let _ = first.split_to(6);
        let second = body.bytes();

        assert_eq!(first.as_ref(), b"world");
        assert_eq!(second.as_ref(), b"hello world");
        assert_eq!(body.len(), 11);
    }

    #[test]
    fn test_file_response_wire_format() {
        let now = Utc::now();
        let resp = FileResponse {
            file: "a.txt".to_string(),
            upload_time: now,
            last_modified: now,
            version: 3,
            size: 10,
            content_type: "text/plain".to_string(),
            description: "note".to_string(),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["type"], "text/plain");
        assert_eq!(json["version"], 3);
        for field in [
            "file",
            "upload_time",
            "last_modified",
            "version",
            "size",
            "type",
            "description",
        ] {
            assert!(json.get(field).is_some(), "missing {}", field);
        }
    }
}
