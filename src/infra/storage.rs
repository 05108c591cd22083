//! Object store gateway for listing images.
//!
//! Blobs live under flat random keys (`{uuid}.jpg`). Callers get the key back and
//! build public URLs with [`ImageStore::public_url`].

use async_trait::async_trait;
use bytes::Bytes;
use object_store::{
    aws::AmazonS3Builder, local::LocalFileSystem, path::Path, ObjectStore, PutPayload,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{StorageBackend, StorageConfig, IMAGE_KEY_EXTENSION};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store already-normalized bytes under a fresh key and return the key.
    async fn store(&self, bytes: Bytes) -> AppResult<String>;

    /// Remove a blob. Missing keys are not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// `{endpoint}/{bucket}/{key}`
    fn public_url(&self, key: &str) -> String;
}

/// `ImageStore` over any `object_store` backend.
pub struct ObjectStoreGateway {
    inner: Arc<dyn ObjectStore>,
    endpoint: String,
    bucket: String,
}

impl ObjectStoreGateway {
    pub fn new(
        inner: Arc<dyn ObjectStore>,
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> AppResult<Self> {
        let inner: Arc<dyn ObjectStore> = match config.backend {
            StorageBackend::S3 => {
                let mut builder = AmazonS3Builder::new()
                    .with_bucket_name(&config.bucket)
                    .with_region(&config.region)
                    .with_endpoint(&config.endpoint)
                    .with_allow_http(true);
                if let (Some(key_id), Some(secret)) =
                    (config.access_key_id(), config.secret_access_key())
                {
                    builder = builder
                        .with_access_key_id(key_id)
                        .with_secret_access_key(secret);
                }
                let s3 = builder
                    .build()
                    .map_err(|e| AppError::internal(format!("Invalid S3 configuration: {}", e)))?;
                Arc::new(s3)
            }
            StorageBackend::Local => {
                std::fs::create_dir_all(&config.local_path).map_err(|e| {
                    AppError::internal(format!(
                        "Failed to create storage directory {}: {}",
                        config.local_path, e
                    ))
                })?;
                let local = LocalFileSystem::new_with_prefix(&config.local_path).map_err(|e| {
                    AppError::internal(format!("Invalid local storage path: {}", e))
                })?;
                Arc::new(local)
            }
        };

        tracing::info!(
            backend = ?config.backend,
            bucket = %config.bucket,
            "Object storage configured"
        );
        Ok(Self::new(inner, config.endpoint.clone(), config.bucket.clone()))
    }

    fn new_key() -> String {
        format!("{}.{}", Uuid::new_v4(), IMAGE_KEY_EXTENSION)
    }
}

#[async_trait]
impl ImageStore for ObjectStoreGateway {
    async fn store(&self, bytes: Bytes) -> AppResult<String> {
        let key = Self::new_key();
        self.inner
            .put(&Path::from(key.as_str()), PutPayload::from(bytes))
            .await
            .map_err(|e| {
                tracing::error!(key = %key, error = %e, "Image upload failed");
                AppError::UploadFailure
            })?;

        tracing::debug!(key = %key, "Image stored");
        Ok(key)
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        match self.inner.delete(&Path::from(key)).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Image delete failed");
                Err(AppError::DeleteFailure)
            }
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    fn gateway() -> (ObjectStoreGateway, Arc<InMemory>) {
        let memory = Arc::new(InMemory::new());
        let gateway = ObjectStoreGateway::new(memory.clone(), "http://cdn.test/", "listings");
        (gateway, memory)
    }

    #[tokio::test]
    async fn test_store_returns_fresh_jpg_key() {
        let (gateway, memory) = gateway();

        let first = gateway.store(Bytes::from_static(b"one")).await.unwrap();
        let second = gateway.store(Bytes::from_static(b"two")).await.unwrap();

        assert_ne!(first, second);
        assert!(first.ends_with(".jpg"));
        let stored = memory.get(&Path::from(first.as_str())).await.unwrap();
        assert_eq!(stored.bytes().await.unwrap(), Bytes::from_static(b"one"));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (gateway, memory) = gateway();
        let key = gateway.store(Bytes::from_static(b"img")).await.unwrap();

        gateway.delete(&key).await.unwrap();
        gateway.delete(&key).await.unwrap();
        gateway.delete("never-existed.jpg").await.unwrap();

        assert!(memory.get(&Path::from(key.as_str())).await.is_err());
    }

    #[test]
    fn test_public_url_template() {
        let (gateway, _) = gateway();
        assert_eq!(
            gateway.public_url("abc.jpg"),
            "http://cdn.test/listings/abc.jpg"
        );
    }
}
