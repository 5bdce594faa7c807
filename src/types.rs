//! Core types for s3-assets

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AssetError, Result};

/// Longest expiry S3 accepts for a presigned URL (7 days)
pub const MAX_PRESIGN_EXPIRY_SECS: u64 = 604_800;

/// A file found under the local static directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFileRecord {
    /// Path relative to the scanned root, `/`-separated
    pub key: String,
    /// Absolute path on disk
    pub path: PathBuf,
    /// MIME type guessed from the extension, `None` when unknown
    pub content_type: Option<String>,
}

/// Owner of a remote object as reported by the listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectOwner {
    pub id: Option<String>,
    pub display_name: Option<String>,
}

/// An object found in the bucket listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFileRecord {
    /// Object key
    pub key: String,
    /// Entity tag, quotes included as the provider sends it
    pub etag: Option<String>,
    /// Size in bytes
    pub size: Option<u64>,
    /// Last modification time
    pub last_modified: Option<DateTime<Utc>>,
    /// Object owner (only present when the listing asked for it)
    pub owner: Option<ObjectOwner>,
    /// Storage class (e.g. "STANDARD")
    pub storage_class: Option<String>,
}

impl RemoteFileRecord {
    /// Record carrying only a key, every other field unknown
    pub fn bare(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            etag: None,
            size: None,
            last_modified: None,
            owner: None,
            storage_class: None,
        }
    }
}

/// What a sync pass does with a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    /// Local file with no remote object
    Create,
    /// Local file that already exists remotely (re-uploaded unconditionally)
    Update,
    /// Remote object with no local file
    Delete,
}

impl std::fmt::Display for SyncAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncAction::Create => f.pad("create"),
            SyncAction::Update => f.pad("update"),
            SyncAction::Delete => f.pad("delete"),
        }
    }
}

/// Unified view of one key across the local tree and the bucket.
///
/// At least one side is always present: entries are only built through
/// [`FileEntry::local`] or [`FileEntry::orphan`], and a remote record can be
/// attached afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    key: String,
    local: Option<LocalFileRecord>,
    remote: Option<RemoteFileRecord>,
}

impl FileEntry {
    /// Entry for a local file, remote side not yet known
    pub fn local(record: LocalFileRecord) -> Self {
        Self {
            key: record.key.clone(),
            local: Some(record),
            remote: None,
        }
    }

    /// Entry for a remote object with no local counterpart
    pub fn orphan(record: RemoteFileRecord) -> Self {
        Self {
            key: record.key.clone(),
            local: None,
            remote: Some(record),
        }
    }

    /// Record the remote object stored under this entry's key
    pub fn attach_remote(&mut self, record: RemoteFileRecord) {
        debug_assert_eq!(self.key, record.key);
        self.remote = Some(record);
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn local_record(&self) -> Option<&LocalFileRecord> {
        self.local.as_ref()
    }

    pub fn remote_record(&self) -> Option<&RemoteFileRecord> {
        self.remote.as_ref()
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Remote-only: scheduled for deletion
    pub fn is_orphan(&self) -> bool {
        self.local.is_none()
    }

    pub fn exists_both(&self) -> bool {
        self.local.is_some() && self.remote.is_some()
    }

    pub fn action(&self) -> SyncAction {
        match (&self.local, &self.remote) {
            (None, _) => SyncAction::Delete,
            (Some(_), Some(_)) => SyncAction::Update,
            (Some(_), None) => SyncAction::Create,
        }
    }
}

/// One entry of a batch delete
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub key: String,
}

/// Aggregate counts of a sync pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub created: usize,
    pub modified: usize,
    pub deleted: usize,
}

impl SyncReport {
    /// Count one applied action
    pub fn record(&mut self, action: SyncAction) {
        match action {
            SyncAction::Create => self.created += 1,
            SyncAction::Update => self.modified += 1,
            SyncAction::Delete => self.deleted += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.created + self.modified + self.deleted
    }
}

impl std::fmt::Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "created: {}, modified: {}, deleted: {}",
            self.created, self.modified, self.deleted
        )
    }
}

/// Canned access grant applied to uploaded objects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectAcl {
    Private,
    #[default]
    PublicRead,
}

impl ObjectAcl {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectAcl::Private => "private",
            ObjectAcl::PublicRead => "public-read",
        }
    }
}

/// Storage configuration, built once by the caller and handed to
/// [`crate::AssetStorage`] and [`crate::store::S3ObjectStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Bucket to mirror into
    pub bucket: String,
    /// Local directory holding the static files
    pub static_dir: PathBuf,
    /// Region override (SDK default chain when unset)
    #[serde(default)]
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible services (MinIO, R2)
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Use path-style addressing instead of virtual-hosted buckets
    #[serde(default)]
    pub force_path_style: bool,
    /// Lifetime of the presigned URL used to derive public URLs
    #[serde(default = "default_presign_expiry")]
    pub presign_expiry_secs: u64,
}

fn default_presign_expiry() -> u64 {
    100
}

impl StorageConfig {
    pub fn new(bucket: impl Into<String>, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            bucket: bucket.into(),
            static_dir: static_dir.into(),
            region: None,
            endpoint: None,
            force_path_style: false,
            presign_expiry_secs: default_presign_expiry(),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn presign_expiry(&self) -> Duration {
        Duration::from_secs(self.presign_expiry_secs)
    }

    /// Reject values the provider would refuse later
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(AssetError::Config("Bucket name cannot be empty".to_string()));
        }
        if self.presign_expiry_secs == 0 || self.presign_expiry_secs > MAX_PRESIGN_EXPIRY_SECS {
            return Err(AssetError::Config(format!(
                "Presign expiry must be between 1 and {} seconds",
                MAX_PRESIGN_EXPIRY_SECS
            )));
        }
        self.validate_connection()
    }

    /// Check only the settings needed to build a client
    pub fn validate_connection(&self) -> Result<()> {
        if let Some(endpoint) = &self.endpoint {
            url::Url::parse(endpoint)
                .map_err(|e| AssetError::Config(format!("Invalid endpoint {}: {}", endpoint, e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(key: &str) -> LocalFileRecord {
        LocalFileRecord {
            key: key.to_string(),
            path: PathBuf::from("/static").join(key),
            content_type: None,
        }
    }

    #[test]
    fn test_entry_actions() {
        let mut entry = FileEntry::local(local("css/style.css"));
        assert_eq!(entry.action(), SyncAction::Create);
        assert!(!entry.has_remote());
        assert!(!entry.is_orphan());

        entry.attach_remote(RemoteFileRecord::bare("css/style.css"));
        assert_eq!(entry.action(), SyncAction::Update);
        assert!(entry.exists_both());

        let orphan = FileEntry::orphan(RemoteFileRecord::bare("old/unused.txt"));
        assert_eq!(orphan.action(), SyncAction::Delete);
        assert!(orphan.is_orphan());
        assert!(orphan.has_remote());
        assert!(!orphan.exists_both());
    }

    #[test]
    fn test_report_counts() {
        let mut report = SyncReport::default();
        report.record(SyncAction::Create);
        report.record(SyncAction::Update);
        report.record(SyncAction::Update);
        report.record(SyncAction::Delete);
        assert_eq!(report.created, 1);
        assert_eq!(report.modified, 2);
        assert_eq!(report.deleted, 1);
        assert_eq!(report.total(), 4);
        assert_eq!(report.to_string(), "created: 1, modified: 2, deleted: 1");
        assert_eq!(format!("{:<6}|", SyncAction::Delete), "delete|");
        assert_eq!(format!("{:>8}", SyncAction::Create), "  create");
    }

    #[test]
    fn test_config_defaults_from_json() {
        let config: StorageConfig =
            serde_json::from_str(r#"{"bucket": "my-bucket", "static_dir": "static"}"#).unwrap();
        assert_eq!(config.presign_expiry_secs, 100);
        assert!(!config.force_path_style);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert!(StorageConfig::new("", "static").validate().is_err());

        let mut config = StorageConfig::new("my-bucket", "static");
        config.presign_expiry_secs = 0;
        assert!(config.validate().is_err());
        config.presign_expiry_secs = MAX_PRESIGN_EXPIRY_SECS + 1;
        assert!(config.validate().is_err());

        let config = StorageConfig::new("my-bucket", "static").with_endpoint("not a url");
        assert!(matches!(config.validate(), Err(AssetError::Config(_))));
    }

    #[test]
    fn test_acl_names() {
        assert_eq!(ObjectAcl::default(), ObjectAcl::PublicRead);
        assert_eq!(ObjectAcl::PublicRead.as_str(), "public-read");
        assert_eq!(
            serde_json::to_string(&ObjectAcl::PublicRead).unwrap(),
            "\"public-read\""
        );
    }
}
