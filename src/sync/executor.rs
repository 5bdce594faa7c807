//! Apply an inventory to the bucket

use std::path::Path;

use crate::error::{AssetError, Result};
use crate::inventory::{fetch_remote, scan_local};
use crate::store::{ObjectStore, MAX_DELETE_BATCH};
use crate::types::{ObjectAcl, SyncReport};

use super::Inventory;

/// Scan `root`, list `bucket` and reconcile the two
pub async fn build_inventory(
    store: &dyn ObjectStore,
    bucket: &str,
    root: &Path,
) -> Result<Inventory> {
    let root = root.to_path_buf();
    let local = tokio::task::spawn_blocking(move || scan_local(&root))
        .await
        .map_err(|e| AssetError::Internal(format!("Local scan task failed: {}", e)))??;
    let remote = fetch_remote(store, bucket).await?;
    Ok(Inventory::reconcile(local, remote))
}

/// Mirror `root` into `bucket`
pub async fn sync(store: &dyn ObjectStore, bucket: &str, root: &Path) -> Result<SyncReport> {
    let inventory = build_inventory(store, bucket, root).await?;
    sync_inventory(store, bucket, &inventory).await
}

/// Delete every orphan, then upload every local file with a public-read
/// grant. Uploads are unconditional: an unchanged file is sent again.
///
/// Errors abort the pass; whatever was uploaded before the failure stays.
pub async fn sync_inventory(
    store: &dyn ObjectStore,
    bucket: &str,
    inventory: &Inventory,
) -> Result<SyncReport> {
    let mut report = SyncReport::default();

    let doomed: Vec<String> = inventory.delete_set().into_iter().map(|d| d.key).collect();
    if !doomed.is_empty() {
        tracing::info!("Deleting {} missing files from s3://{}", doomed.len(), bucket);
        for batch in doomed.chunks(MAX_DELETE_BATCH) {
            let outcome = store.delete_objects(bucket, batch).await?;
            tracing::debug!(
                "Batch of {} deletes: {} confirmed, {} refused",
                batch.len(),
                outcome.deleted.len(),
                outcome.errors.len()
            );
            for (key, message) in &outcome.errors {
                tracing::warn!("Failed to delete s3://{}/{}: {}", bucket, key, message);
            }
        }
        report.deleted = doomed.len();
    }

    tracing::info!("Uploading files to s3://{}", bucket);
    for entry in inventory.uploads() {
        let Some(local) = entry.local_record() else {
            continue;
        };

        store
            .upload_object(
                bucket,
                &local.key,
                &local.path,
                local.content_type.as_deref(),
                ObjectAcl::PublicRead,
            )
            .await?;

        tracing::debug!(
            "{} s3://{}/{} ({})",
            entry.action(),
            bucket,
            local.key,
            local.content_type.as_deref().unwrap_or("no content type")
        );
        report.record(entry.action());
    }

    tracing::info!("Synced s3://{}: {}", bucket, report);
    Ok(report)
}
