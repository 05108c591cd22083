//! Rating aggregator: keeps a listing's average rating and review count in step
//! with its reviews.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::RatingSummary;
use crate::errors::AppResult;
use crate::infra::UnitOfWork;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait RatingService: Send + Sync {
    /// Full recomputation from every review of the property. Zero reviews give 0/0.
    async fn recompute(&self, property_id: Uuid) -> AppResult<RatingSummary>;
}

pub struct RatingAggregator<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> RatingAggregator<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> RatingService for RatingAggregator<U> {
    async fn recompute(&self, property_id: Uuid) -> AppResult<RatingSummary> {
        let ratings = self.uow.reviews().ratings_for_property(property_id).await?;
        let summary = RatingSummary::from_ratings(&ratings);

        self.uow.properties().set_rating(property_id, summary).await?;

        tracing::debug!(
            property_id = %property_id,
            average = summary.average_rating,
            total = summary.total_reviews,
            "Rating recomputed"
        );
        Ok(summary)
    }
}
