//! In-process object store
//!
//! Mirrors the S3 semantics the sync engine depends on: paginated listing
//! in key order, batch deletes with per-key outcomes, canned ACLs and
//! presigned URLs on the virtual-hosted `s3.amazonaws.com` domain.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use url::Url;

use super::{DeleteOutcome, ListPage, ObjectStore, MAX_DELETE_BATCH};
use crate::error::{AssetError, Result};
use crate::types::{ObjectAcl, ObjectOwner, RemoteFileRecord};

/// Default listing page size, same as S3
const DEFAULT_PAGE_SIZE: usize = 1000;

const OWNER_ID: &str = "memory-store-owner";

/// An object held by [`MemoryObjectStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
    pub acl: ObjectAcl,
    pub etag: String,
    pub last_modified: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    buckets: HashMap<String, BTreeMap<String, StoredObject>>,
    failing_keys: HashSet<String>,
    undeletable_keys: HashSet<String>,
    uploads: usize,
    delete_batches: usize,
    list_calls: usize,
    version: u64,
}

/// Thread-safe in-memory bucket collection, cheap to clone
#[derive(Clone)]
pub struct MemoryObjectStore {
    state: Arc<Mutex<State>>,
    page_size: usize,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Use a smaller page size to exercise continuation tokens
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Create an empty bucket; fails if the name is taken
    pub fn create_bucket(&self, bucket: &str) -> Result<()> {
        let mut state = self.state.lock();
        if state.buckets.contains_key(bucket) {
            return Err(AssetError::CloudStorage(format!(
                "BucketAlreadyExists: {}",
                bucket
            )));
        }
        state.buckets.insert(bucket.to_string(), BTreeMap::new());
        Ok(())
    }

    pub fn list_buckets(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().buckets.keys().cloned().collect();
        names.sort();
        names
    }

    /// Store an object directly, bypassing the sync engine
    pub fn put(&self, bucket: &str, key: &str, body: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        state.version += 1;
        let version = state.version;
        let objects = bucket_mut(&mut state, bucket)?;
        objects.insert(
            key.to_string(),
            stored(body.to_vec(), None, ObjectAcl::Private, version),
        );
        Ok(())
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.state
            .lock()
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(key).cloned())
    }

    /// Keys currently in `bucket`, sorted
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.state
            .lock()
            .buckets
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Make every upload of `key` fail with a simulated network error
    pub fn fail_uploads_of(&self, key: &str) {
        self.state.lock().failing_keys.insert(key.to_string());
    }

    /// Make batch deletes report `key` as refused, leaving it in place
    pub fn fail_deletes_of(&self, key: &str) {
        self.state.lock().undeletable_keys.insert(key.to_string());
    }

    /// Number of uploads served so far
    pub fn upload_count(&self) -> usize {
        self.state.lock().uploads
    }

    /// Number of batch delete requests served so far
    pub fn delete_batch_count(&self) -> usize {
        self.state.lock().delete_batches
    }

    /// Number of listing pages served so far
    pub fn list_call_count(&self) -> usize {
        self.state.lock().list_calls
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

fn bucket_mut<'a>(
    state: &'a mut State,
    bucket: &str,
) -> Result<&'a mut BTreeMap<String, StoredObject>> {
    state
        .buckets
        .get_mut(bucket)
        .ok_or_else(|| AssetError::CloudStorage(format!("NoSuchBucket: {}", bucket)))
}

fn stored(body: Vec<u8>, content_type: Option<String>, acl: ObjectAcl, version: u64) -> StoredObject {
    StoredObject {
        etag: format!("\"{:032x}\"", version),
        body,
        content_type,
        acl,
        last_modified: Utc::now(),
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list_page(&self, bucket: &str, continuation: Option<String>) -> Result<ListPage> {
        let mut state = self.state.lock();
        state.list_calls += 1;
        let objects = bucket_mut(&mut state, bucket)?;

        let mut remaining = objects
            .iter()
            .filter(|(key, _)| continuation.as_deref().map_or(true, |token| key.as_str() > token));

        let page: Vec<RemoteFileRecord> = remaining
            .by_ref()
            .take(self.page_size)
            .map(|(key, obj)| RemoteFileRecord {
                key: key.clone(),
                etag: Some(obj.etag.clone()),
                size: Some(obj.body.len() as u64),
                last_modified: Some(obj.last_modified),
                owner: Some(ObjectOwner {
                    id: Some(OWNER_ID.to_string()),
                    display_name: Some("memory".to_string()),
                }),
                storage_class: Some("STANDARD".to_string()),
            })
            .collect();

        let next_token = if remaining.next().is_some() {
            page.last().map(|r| r.key.clone())
        } else {
            None
        };

        Ok(ListPage {
            objects: page,
            next_token,
        })
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<DeleteOutcome> {
        if keys.len() > MAX_DELETE_BATCH {
            return Err(AssetError::InvalidInput(format!(
                "Batch delete accepts at most {} keys, got {}",
                MAX_DELETE_BATCH,
                keys.len()
            )));
        }

        let mut state = self.state.lock();
        state.delete_batches += 1;
        let State {
            buckets,
            undeletable_keys,
            ..
        } = &mut *state;
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| AssetError::CloudStorage(format!("NoSuchBucket: {}", bucket)))?;

        // S3 reports missing keys as deleted too
        let mut outcome = DeleteOutcome::default();
        for key in keys {
            if undeletable_keys.contains(key) {
                outcome
                    .errors
                    .push((key.clone(), "AccessDenied: Access Denied".to_string()));
                continue;
            }
            objects.remove(key);
            outcome.deleted.push(key.clone());
        }

        Ok(outcome)
    }

    async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: Option<&str>,
        acl: ObjectAcl,
    ) -> Result<()> {
        let body = tokio::fs::read(path).await?;

        let mut state = self.state.lock();
        if state.failing_keys.contains(key) {
            return Err(AssetError::CloudStorage(format!(
                "connection reset while uploading {}",
                key
            )));
        }
        state.uploads += 1;
        state.version += 1;
        let version = state.version;
        let objects = bucket_mut(&mut state, bucket)?;
        objects.insert(
            key.to_string(),
            stored(body, content_type.map(String::from), acl, version),
        );
        Ok(())
    }

    async fn presign_get_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String> {
        if !self.state.lock().buckets.contains_key(bucket) {
            return Err(AssetError::CloudStorage(format!("NoSuchBucket: {}", bucket)));
        }

        let mut url = Url::parse(&format!("https://{}.s3.amazonaws.com/", bucket))?;
        url.path_segments_mut()
            .map_err(|_| AssetError::InvalidInput(format!("Bucket {} cannot form a URL", bucket)))?
            .pop_if_empty()
            .extend(key.split('/'));
        url.query_pairs_mut()
            .append_pair("X-Amz-Algorithm", "AWS4-HMAC-SHA256")
            .append_pair("X-Amz-Credential", "memory/us-east-1/s3/aws4_request")
            .append_pair("X-Amz-Date", &Utc::now().format("%Y%m%dT%H%M%SZ").to_string())
            .append_pair("X-Amz-Expires", &expires_in.as_secs().to_string())
            .append_pair("X-Amz-SignedHeaders", "host")
            .append_pair("X-Amz-Signature", &uuid::Uuid::new_v4().simple().to_string());

        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_listing_paginates_in_key_order() {
        let store = MemoryObjectStore::new().with_page_size(2);
        store.create_bucket("b").unwrap();
        for key in ["c", "a", "e", "b", "d"] {
            store.put("b", key, b"x").unwrap();
        }

        let first = store.list_page("b", None).await.unwrap();
        let keys: Vec<_> = first.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(first.next_token.as_deref(), Some("b"));

        let second = store.list_page("b", first.next_token).await.unwrap();
        assert_eq!(second.next_token.as_deref(), Some("d"));

        let last = store.list_page("b", second.next_token).await.unwrap();
        assert_eq!(last.objects.len(), 1);
        assert!(last.next_token.is_none());
    }

    #[tokio::test]
    async fn test_empty_bucket_lists_nothing() {
        let store = MemoryObjectStore::new();
        store.create_bucket("empty").unwrap();
        let page = store.list_page("empty", None).await.unwrap();
        assert!(page.objects.is_empty());
        assert!(page.next_token.is_none());
    }

    #[tokio::test]
    async fn test_missing_bucket_is_a_cloud_error() {
        let store = MemoryObjectStore::new();
        let err = store.list_page("nope", None).await.unwrap_err();
        assert!(err.is_remote());
    }

    #[test]
    fn test_bucket_name_collision() {
        let store = MemoryObjectStore::new();
        store.create_bucket("my-bucket").unwrap();
        store.create_bucket("my-bucket-2").unwrap();
        assert!(store.create_bucket("my-bucket").is_err());
        assert_eq!(store.list_buckets(), vec!["my-bucket", "my-bucket-2"]);
    }

    #[tokio::test]
    async fn test_presigned_url_shape() {
        let store = MemoryObjectStore::new();
        store.create_bucket("my-bucket").unwrap();
        let url = store
            .presign_get_url("my-bucket", "css/style.css", Duration::from_secs(100))
            .await
            .unwrap();
        assert!(url.starts_with("https://my-bucket.s3.amazonaws.com/css/style.css?"));
        assert!(url.contains("X-Amz-Expires=100"));
    }

    #[tokio::test]
    async fn test_refused_delete_is_reported_per_key() {
        let store = MemoryObjectStore::new();
        store.create_bucket("b").unwrap();
        store.put("b", "a", b"x").unwrap();
        store.put("b", "b", b"x").unwrap();
        store.fail_deletes_of("a");

        let keys = vec!["a".to_string(), "b".to_string()];
        let outcome = store.delete_objects("b", &keys).await.unwrap();
        assert_eq!(outcome.deleted, vec!["b"]);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].0, "a");
        assert_eq!(store.keys("b"), vec!["a"]);
    }

    #[tokio::test]
    async fn test_oversized_delete_batch_rejected() {
        let store = MemoryObjectStore::new();
        store.create_bucket("b").unwrap();
        let keys: Vec<String> = (0..=MAX_DELETE_BATCH).map(|i| i.to_string()).collect();
        assert!(store.delete_objects("b", &keys).await.is_err());
    }
}
