//! Image uploads: normalize, store, and undo a partially stored batch.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use super::parallel;
use crate::domain::image_key_from_url;
use crate::errors::{AppError, AppResult};
use crate::infra::images::normalize_blocking;
use crate::infra::ImageStore;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// One stored derived image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StoredImage {
    #[schema(example = "0b7c1c8e-5f5d-4a8e-9d7e-3f2a1b4c5d6e.jpg")]
    pub key: String,
    pub url: String,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ImageService: Send + Sync {
    /// Normalize and store every file concurrently, all or nothing.
    /// On failure the images of this batch that did get stored are removed.
    async fn upload_many(&self, files: Vec<Bytes>) -> AppResult<Vec<StoredImage>>;

    /// Idempotent.
    async fn delete(&self, key: String) -> AppResult<()>;

    /// Delete the blobs behind public URLs (key = last path segment).
    async fn delete_urls(&self, urls: Vec<String>) -> AppResult<()>;

    /// Best-effort cleanup used by compensating paths. Failures are logged only.
    async fn discard(&self, urls: Vec<String>);
}

pub struct ImagePipeline {
    store: Arc<dyn ImageStore>,
}

impl ImagePipeline {
    pub fn new(store: Arc<dyn ImageStore>) -> Self {
        Self { store }
    }

    async fn upload_one(&self, raw: Bytes) -> AppResult<StoredImage> {
        let normalized = normalize_blocking(raw).await?;
        let key = self.store.store(normalized).await?;
        let url = self.store.public_url(&key);
        Ok(StoredImage { key, url })
    }
}

#[async_trait]
impl ImageService for ImagePipeline {
    async fn upload_many(&self, files: Vec<Bytes>) -> AppResult<Vec<StoredImage>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let results =
            futures::future::join_all(files.into_iter().map(|raw| self.upload_one(raw))).await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed == 0 {
            return results.into_iter().collect();
        }

        let stored: Vec<String> = results
            .into_iter()
            .filter_map(Result::ok)
            .map(|image| image.key)
            .collect();
        tracing::warn!(
            failed,
            rolled_back = stored.len(),
            "Image batch failed, removing stored images"
        );
        for key in stored {
            if let Err(e) = self.store.delete(&key).await {
                tracing::error!(key = %key, error = %e, "Failed to remove image from failed batch");
            }
        }
        Err(AppError::UploadFailure)
    }

    async fn delete(&self, key: String) -> AppResult<()> {
        self.store.delete(&key).await
    }

    async fn delete_urls(&self, urls: Vec<String>) -> AppResult<()> {
        let keys: Vec<String> = urls
            .iter()
            .filter_map(|url| image_key_from_url(url))
            .map(str::to_string)
            .collect();

        let store = &self.store;
        parallel::join_all(keys.iter().map(|key| store.delete(key)).collect()).await?;
        Ok(())
    }

    async fn discard(&self, urls: Vec<String>) {
        if urls.is_empty() {
            return;
        }
        if let Err(e) = self.delete_urls(urls).await {
            tracing::error!(error = %e, "Failed to discard uploaded images");
        }
    }
}
