//! S3 backend (AWS S3, R2, MinIO)

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, Delete, ObjectCannedAcl, ObjectIdentifier,
};
use aws_sdk_s3::Client as S3Client;
use chrono::{DateTime, Utc};

use super::{DeleteOutcome, ListPage, ObjectStore, MAX_DELETE_BATCH};
use crate::error::{AssetError, Result};
use crate::types::{ObjectAcl, ObjectOwner, RemoteFileRecord, StorageConfig};

/// S3-compatible object store; one client per instance
#[derive(Clone)]
pub struct S3ObjectStore {
    client: S3Client,
}

impl S3ObjectStore {
    /// Build a client from the SDK defaults plus the overrides in `config`
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        config.validate_connection()?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        builder = builder.force_path_style(config.force_path_style);

        Ok(Self {
            client: S3Client::from_conf(builder.build()),
        })
    }

    /// Region the client resolved, if any
    pub fn region(&self) -> Option<String> {
        self.client.config().region().map(|r| r.to_string())
    }

    /// Create a bucket in `region`
    pub async fn create_bucket(&self, bucket: &str, region: &str) -> Result<()> {
        let mut request = self.client.create_bucket().bucket(bucket);

        // us-east-1 is the implicit location and rejects an explicit constraint
        if region != "us-east-1" {
            let location = CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region))
                .build();
            request = request.create_bucket_configuration(location);
        }

        request
            .send()
            .await
            .map_err(|e| AssetError::CloudStorage(e.into_service_error().to_string()))?;

        tracing::info!("Created bucket {} in {}", bucket, region);
        Ok(())
    }

    /// Names of every bucket visible to the credentials
    pub async fn list_buckets(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|e| AssetError::CloudStorage(e.into_service_error().to_string()))?;

        Ok(response
            .buckets()
            .iter()
            .filter_map(|b| b.name().map(String::from))
            .collect())
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_page(&self, bucket: &str, continuation: Option<String>) -> Result<ListPage> {
        let response = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .fetch_owner(true)
            .set_continuation_token(continuation)
            .send()
            .await
            .map_err(|e| AssetError::CloudStorage(e.into_service_error().to_string()))?;

        let next_token = if response.is_truncated().unwrap_or(false) {
            response.next_continuation_token().map(String::from)
        } else {
            None
        };

        // An empty bucket comes back without a Contents element at all
        let objects = response
            .contents
            .unwrap_or_default()
            .into_iter()
            .filter_map(|obj| {
                let key = obj.key?;
                Some(RemoteFileRecord {
                    key,
                    etag: obj.e_tag,
                    size: obj.size.and_then(|s| u64::try_from(s).ok()),
                    last_modified: obj
                        .last_modified
                        .and_then(|dt| DateTime::<Utc>::from_timestamp(dt.secs(), dt.subsec_nanos())),
                    owner: obj.owner.map(|o| ObjectOwner {
                        id: o.id,
                        display_name: o.display_name,
                    }),
                    storage_class: obj.storage_class.map(|c| c.as_str().to_string()),
                })
            })
            .collect();

        Ok(ListPage { objects, next_token })
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<DeleteOutcome> {
        if keys.is_empty() {
            return Ok(DeleteOutcome::default());
        }
        if keys.len() > MAX_DELETE_BATCH {
            return Err(AssetError::InvalidInput(format!(
                "Batch delete accepts at most {} keys, got {}",
                MAX_DELETE_BATCH,
                keys.len()
            )));
        }

        let objects = keys
            .iter()
            .map(|key| {
                ObjectIdentifier::builder()
                    .key(key)
                    .build()
                    .map_err(|e| AssetError::CloudStorage(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .build()
            .map_err(|e| AssetError::CloudStorage(e.to_string()))?;

        let response = self
            .client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| AssetError::CloudStorage(e.into_service_error().to_string()))?;

        Ok(DeleteOutcome {
            deleted: response
                .deleted()
                .iter()
                .filter_map(|d| d.key().map(String::from))
                .collect(),
            errors: response
                .errors()
                .iter()
                .map(|e| {
                    (
                        e.key().unwrap_or_default().to_string(),
                        e.message().or(e.code()).unwrap_or("unknown error").to_string(),
                    )
                })
                .collect(),
        })
    }

    async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: Option<&str>,
        acl: ObjectAcl,
    ) -> Result<()> {
        let data = tokio::fs::read(path).await?;
        let size = data.len();
        let body = ByteStream::from(data);

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .acl(ObjectCannedAcl::from(acl.as_str()))
            .set_content_type(content_type.map(String::from))
            .send()
            .await
            .map_err(|e| AssetError::CloudStorage(e.into_service_error().to_string()))?;

        tracing::debug!("Uploaded {} bytes to s3://{}/{}", size, bucket, key);
        Ok(())
    }

    async fn presign_get_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String> {
        let presigning =
            PresigningConfig::expires_in(expires_in).map_err(|e| AssetError::Config(e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| AssetError::CloudStorage(e.to_string()))?;

        Ok(request.uri().to_string())
    }
}
