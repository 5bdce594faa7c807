//! Storage handle tying one object store to one static directory

use std::sync::Arc;

use crate::error::Result;
use crate::resolver::UrlResolver;
use crate::store::ObjectStore;
use crate::sync::{self, Inventory};
use crate::types::{StorageConfig, SyncReport};

/// What a sync would do, computed without touching the bucket
#[derive(Debug, Clone)]
pub struct SyncPlan {
    pub inventory: Inventory,
    pub report: SyncReport,
}

/// Entry point for syncing and URL resolution.
///
/// Cloning is cheap; every clone shares the same store handle, so a web
/// server can keep one per worker.
#[derive(Clone)]
pub struct AssetStorage {
    store: Arc<dyn ObjectStore>,
    config: StorageConfig,
}

impl AssetStorage {
    pub fn new(store: Arc<dyn ObjectStore>, config: StorageConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    /// Connect to S3 with the settings in `config`
    #[cfg(feature = "cloud")]
    pub async fn connect(config: StorageConfig) -> Result<Self> {
        let store = crate::store::S3ObjectStore::connect(&config).await?;
        Self::new(Arc::new(store), config)
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn ObjectStore> {
        Arc::clone(&self.store)
    }

    /// Fresh inventory of the static directory against the bucket
    pub async fn inventory(&self) -> Result<Inventory> {
        sync::build_inventory(self.store.as_ref(), &self.config.bucket, &self.config.static_dir)
            .await
    }

    /// Dry run of [`AssetStorage::sync`]
    pub async fn plan(&self) -> Result<SyncPlan> {
        let inventory = self.inventory().await?;
        let report = inventory.planned_report();
        Ok(SyncPlan { inventory, report })
    }

    /// Mirror the static directory into the bucket
    pub async fn sync(&self) -> Result<SyncReport> {
        tracing::info!(
            "Syncing {} to s3://{}",
            self.config.static_dir.display(),
            self.config.bucket
        );
        sync::sync(self.store.as_ref(), &self.config.bucket, &self.config.static_dir).await
    }

    /// Resolver sharing this storage's store handle
    pub fn resolver(&self) -> UrlResolver {
        UrlResolver::new(
            self.store(),
            self.config.bucket.clone(),
            self.config.presign_expiry(),
        )
    }

    /// Public URL for `key`
    pub async fn resolve_url(&self, key: &str) -> Result<String> {
        self.resolver().resolve(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryObjectStore;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_plan_leaves_bucket_untouched() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();

        let memory = MemoryObjectStore::new();
        memory.create_bucket("b").unwrap();
        memory.put("b", "gone.txt", b"x").unwrap();

        let storage = AssetStorage::new(
            Arc::new(memory.clone()),
            StorageConfig::new("b", dir.path()),
        )
        .unwrap();

        let plan = storage.plan().await.unwrap();
        assert_eq!(plan.report.created, 1);
        assert_eq!(plan.report.deleted, 1);
        assert_eq!(memory.keys("b"), vec!["gone.txt"]);
        assert_eq!(memory.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let result = AssetStorage::new(
            Arc::new(MemoryObjectStore::new()),
            StorageConfig::new(" ", "static"),
        );
        assert!(result.is_err());
    }
}
