//! Object storage capability
//!
//! The sync engine only talks to a bucket through [`ObjectStore`]. The S3
//! backend needs the `cloud` feature; the in-memory backend is always
//! available and backs the test-suite.

mod memory;
#[cfg(feature = "cloud")]
mod s3;

pub use memory::{MemoryObjectStore, StoredObject};
#[cfg(feature = "cloud")]
pub use s3::S3ObjectStore;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ObjectAcl, RemoteFileRecord};

/// Most keys a single batch delete may carry
pub const MAX_DELETE_BATCH: usize = 1000;

/// One page of a bucket listing
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Objects on this page; empty when the bucket has no contents
    pub objects: Vec<RemoteFileRecord>,
    /// Token for the next page, `None` on the last page
    pub next_token: Option<String>,
}

/// Result of a batch delete
#[derive(Debug, Clone, Default)]
pub struct DeleteOutcome {
    /// Keys the provider confirmed as deleted
    pub deleted: Vec<String>,
    /// Keys the provider refused, with its message
    pub errors: Vec<(String, String)>,
}

/// Operations the sync engine needs from a bucket
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch one page of the listing, continuing from `continuation`
    async fn list_page(&self, bucket: &str, continuation: Option<String>) -> Result<ListPage>;

    /// Delete up to [`MAX_DELETE_BATCH`] keys in one request
    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<DeleteOutcome>;

    /// Upload the file at `path` under `key`
    async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: Option<&str>,
        acl: ObjectAcl,
    ) -> Result<()>;

    /// Signed, time-limited GET URL for `key`
    async fn presign_get_url(&self, bucket: &str, key: &str, expires_in: Duration)
        -> Result<String>;
}
