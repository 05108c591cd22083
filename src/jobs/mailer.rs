//! Enqueueing side of the email queue.

use apalis::prelude::Storage;
use apalis_sql::postgres::PostgresStorage;
use async_trait::async_trait;

use super::EmailJob;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Hands email jobs to the worker. A failed enqueue is an error for the caller.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn enqueue(&self, job: EmailJob) -> AppResult<()>;
}

/// `Mailer` over the apalis Postgres queue.
pub struct QueueMailer {
    storage: PostgresStorage<EmailJob>,
}

impl QueueMailer {
    pub fn new(storage: PostgresStorage<EmailJob>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl Mailer for QueueMailer {
    async fn enqueue(&self, job: EmailJob) -> AppResult<()> {
        let to = job.to.clone();
        let mut storage = self.storage.clone();
        storage.push(job).await.map_err(|e| {
            tracing::error!(to = %to, error = %e, "Failed to queue email");
            AppError::internal(format!("Failed to queue email: {}", e))
        })?;

        tracing::debug!(to = %to, "Email queued");
        Ok(())
    }
}
