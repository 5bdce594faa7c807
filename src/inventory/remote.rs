//! Remote inventory: full bucket listing

use crate::error::Result;
use crate::store::ObjectStore;
use crate::types::RemoteFileRecord;

/// List every object in `bucket`, following continuation tokens until the
/// provider reports the last page. An empty bucket yields an empty list.
pub async fn fetch_remote(store: &dyn ObjectStore, bucket: &str) -> Result<Vec<RemoteFileRecord>> {
    let mut records = Vec::new();
    let mut continuation: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = store.list_page(bucket, continuation.take()).await?;
        pages += 1;
        tracing::debug!(
            "Listed page {} of s3://{}: {} objects",
            pages,
            bucket,
            page.objects.len()
        );

        records.extend(page.objects);

        match page.next_token {
            Some(token) => continuation = Some(token),
            None => break,
        }
    }

    tracing::debug!("Found {} remote objects in {} pages", records.len(), pages);
    Ok(records)
}
