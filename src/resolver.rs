//! Public asset URLs derived from presigned URLs

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::error::{AssetError, Result};
use crate::store::ObjectStore;

/// Turns object keys into stable-looking public URLs.
///
/// The store presigns a short-lived GET URL and the signature is stripped,
/// leaving `scheme://host/path`. The result only works for publicly readable
/// objects; uploads made by the sync engine are public-read.
#[derive(Clone)]
pub struct UrlResolver {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    expiry: Duration,
}

impl UrlResolver {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>, expiry: Duration) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            expiry,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Public URL for `key`
    pub async fn resolve(&self, key: &str) -> Result<String> {
        if key.is_empty() {
            return Err(AssetError::InvalidInput("Object key cannot be empty".to_string()));
        }
        let signed = self
            .store
            .presign_get_url(&self.bucket, key, self.expiry)
            .await?;
        strip_signature(&signed)
    }
}

/// Drop the query string and fragment of `signed`
pub fn strip_signature(signed: &str) -> Result<String> {
    let mut url = Url::parse(signed)?;
    url.set_query(None);
    url.set_fragment(None);
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryObjectStore;

    #[test]
    fn test_strip_signature() {
        let stripped = strip_signature(
            "https://my-bucket.s3.amazonaws.com/css/style.css?X-Amz-Signature=abc&X-Amz-Expires=100#top",
        )
        .unwrap();
        assert_eq!(stripped, "https://my-bucket.s3.amazonaws.com/css/style.css");
    }

    #[test]
    fn test_strip_signature_rejects_garbage() {
        assert!(matches!(
            strip_signature("not a url"),
            Err(AssetError::Url(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_matches_virtual_hosted_url() {
        let store = MemoryObjectStore::new();
        store.create_bucket("my-bucket").unwrap();
        let resolver = UrlResolver::new(Arc::new(store), "my-bucket", Duration::from_secs(100));

        let url = resolver.resolve("style.css").await.unwrap();
        assert_eq!(url, "https://my-bucket.s3.amazonaws.com/style.css");

        let parsed = Url::parse(&url).unwrap();
        assert_eq!(parsed.scheme(), "https");
        assert!(parsed.query().is_none());
        assert!(parsed.fragment().is_none());
        assert!(parsed.path().ends_with("style.css"));
    }

    #[tokio::test]
    async fn test_resolve_empty_key() {
        let store = MemoryObjectStore::new();
        store.create_bucket("b").unwrap();
        let resolver = UrlResolver::new(Arc::new(store), "b", Duration::from_secs(100));
        assert!(resolver.resolve("").await.is_err());
    }
}
