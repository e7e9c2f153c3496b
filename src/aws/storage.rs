//! S3 object storage operations.

use std::path::Path;

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, ServerSideEncryption,
    ServerSideEncryptionByDefault, ServerSideEncryptionConfiguration, ServerSideEncryptionRule,
};
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{CloudError, Result};

/// Deployment artifact storage backed by S3.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    /// S3 client.
    client: Client,
    /// Region the client was configured for, used for bucket creation.
    region: Option<String>,
}

impl ObjectStore {
    /// Creates an object store from the shared SDK configuration.
    #[must_use]
    pub fn new(config: &aws_config::SdkConfig, region: Option<String>) -> Self {
        Self {
            client: Client::new(config),
            region,
        }
    }

    /// Ensures the deployment bucket exists, creating it with AES-256
    /// default encryption when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if listing, creation, or encryption setup fails.
    pub async fn ensure_bucket(&self, bucket: &str) -> Result<()> {
        let listing = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|e| CloudError::storage(format!("Failed to list buckets: {e}")))?;

        let exists = listing
            .buckets()
            .iter()
            .any(|candidate| candidate.name() == Some(bucket));

        if exists {
            debug!("Bucket {bucket} already exists");
            return Ok(());
        }

        info!("Creating deployment bucket: {bucket}");

        let mut request = self.client.create_bucket().bucket(bucket);
        if let Some(region) = self.region.as_deref() {
            // us-east-1 is the default location and rejects a constraint.
            if region != "us-east-1" {
                let constraint = BucketLocationConstraint::from(region);
                request = request.create_bucket_configuration(
                    CreateBucketConfiguration::builder()
                        .location_constraint(constraint)
                        .build(),
                );
            }
        }
        request
            .send()
            .await
            .map_err(|e| CloudError::storage(format!("Failed to create bucket {bucket}: {e}")))?;

        let sse_default = ServerSideEncryptionByDefault::builder()
            .sse_algorithm(ServerSideEncryption::Aes256)
            .build()
            .map_err(|e| CloudError::storage(format!("Invalid encryption config: {e}")))?;
        let sse_config = ServerSideEncryptionConfiguration::builder()
            .rules(
                ServerSideEncryptionRule::builder()
                    .apply_server_side_encryption_by_default(sse_default)
                    .build(),
            )
            .build()
            .map_err(|e| CloudError::storage(format!("Invalid encryption config: {e}")))?;

        self.client
            .put_bucket_encryption()
            .bucket(bucket)
            .server_side_encryption_configuration(sse_config)
            .send()
            .await
            .map_err(|e| {
                CloudError::storage(format!("Failed to set encryption on {bucket}: {e}"))
            })?;

        info!("Bucket {bucket} created");
        Ok(())
    }

    /// Uploads a local file to `bucket` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the upload fails.
    pub async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<()> {
        info!("Uploading {} to s3://{bucket}/{key}", path.display());

        let body = ByteStream::from_path(path).await.map_err(|e| {
            CloudError::storage(format!("Failed to read {}: {e}", path.display()))
        })?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| CloudError::storage(format!("Failed to upload {key}: {e}")))?;

        debug!("Uploaded s3://{bucket}/{key}");
        Ok(())
    }

    /// Uploads in-memory content to `bucket` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload fails.
    pub async fn put_bytes(&self, bucket: &str, key: &str, content: Vec<u8>) -> Result<()> {
        info!("Uploading {} bytes to s3://{bucket}/{key}", content.len());

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(content.into())
            .send()
            .await
            .map_err(|e| CloudError::storage(format!("Failed to upload {key}: {e}")))?;

        Ok(())
    }
}
