//! Reviews, likes and the rating refresh they trigger.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::RatingService;
use crate::domain::{
    NewReview, Review, ReviewDraft, ReviewPatch, ReviewSort, ReviewView, ReviewerSummary,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{UnitOfWork, DUPLICATE_REVIEW_MESSAGE};
use crate::types::{Paginated, PaginationParams};

#[async_trait]
pub trait ReviewService: Send + Sync {
    /// One review per (property, user); a second attempt is a `Conflict`.
    async fn create(
        &self,
        user_id: Uuid,
        property_id: Uuid,
        draft: ReviewDraft,
    ) -> AppResult<ReviewView>;

    async fn list_for_property(
        &self,
        property_id: Uuid,
        sort: ReviewSort,
        page: PaginationParams,
    ) -> AppResult<Paginated<ReviewView>>;

    /// Author only.
    async fn update(&self, user_id: Uuid, review_id: Uuid, patch: ReviewPatch)
        -> AppResult<ReviewView>;

    /// Author only.
    async fn delete(&self, user_id: Uuid, review_id: Uuid) -> AppResult<()>;

    /// Like or unlike. Returns the new like count.
    async fn toggle_like(&self, user_id: Uuid, review_id: Uuid) -> AppResult<usize>;

    async fn list_mine(
        &self,
        user_id: Uuid,
        page: PaginationParams,
    ) -> AppResult<Paginated<ReviewView>>;
}

pub struct ReviewManager<U: UnitOfWork> {
    uow: Arc<U>,
    ratings: Arc<dyn RatingService>,
}

impl<U: UnitOfWork> ReviewManager<U> {
    pub fn new(uow: Arc<U>, ratings: Arc<dyn RatingService>) -> Self {
        Self { uow, ratings }
    }

    async fn find_authored(&self, user_id: Uuid, review_id: Uuid) -> AppResult<Review> {
        self.uow
            .reviews()
            .find_by_id(review_id)
            .await?
            .filter(|review| review.user_id == user_id)
            .ok_or_not_owned("Review")
    }

    async fn views(&self, reviews: Vec<Review>) -> AppResult<Vec<ReviewView>> {
        let mut ids: Vec<Uuid> = reviews.iter().map(|r| r.user_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let reviewers: HashMap<Uuid, ReviewerSummary> = self
            .uow
            .users()
            .find_many(ids)
            .await?
            .into_iter()
            .map(|u| (u.id, ReviewerSummary { id: u.id, name: u.name }))
            .collect();

        Ok(reviews
            .into_iter()
            .map(|review| {
                let user = reviewers.get(&review.user_id).cloned();
                ReviewView::new(review, user)
            })
            .collect())
    }

    async fn view(&self, review: Review) -> AppResult<ReviewView> {
        let mut views = self.views(vec![review.clone()]).await?;
        Ok(views.pop().unwrap_or_else(|| ReviewView::new(review, None)))
    }
}

#[async_trait]
impl<U: UnitOfWork> ReviewService for ReviewManager<U> {
    async fn create(
        &self,
        user_id: Uuid,
        property_id: Uuid,
        draft: ReviewDraft,
    ) -> AppResult<ReviewView> {
        let draft = draft.normalized()?;

        self.uow
            .properties()
            .find_by_id(property_id)
            .await?
            .ok_or_not_found("Property")?;

        if self
            .uow
            .reviews()
            .find_for_user(property_id, user_id)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(DUPLICATE_REVIEW_MESSAGE));
        }

        let review = self
            .uow
            .reviews()
            .create(NewReview::from_draft(draft, property_id, user_id))
            .await?;
        self.ratings.recompute(property_id).await?;

        tracing::info!(review_id = %review.id, property_id = %property_id, "Review created");
        self.view(review).await
    }

    async fn list_for_property(
        &self,
        property_id: Uuid,
        sort: ReviewSort,
        page: PaginationParams,
    ) -> AppResult<Paginated<ReviewView>> {
        let (reviews, total) = self
            .uow
            .reviews()
            .list_for_property(property_id, sort, page)
            .await?;
        Ok(Paginated::new(self.views(reviews).await?, &page, total))
    }

    async fn update(
        &self,
        user_id: Uuid,
        review_id: Uuid,
        patch: ReviewPatch,
    ) -> AppResult<ReviewView> {
        let patch = patch.normalized()?;
        let existing = self.find_authored(user_id, review_id).await?;
        let rating_changed = patch.rating.is_some_and(|r| r != existing.rating);

        let review = self.uow.reviews().update(review_id, patch).await?;
        if rating_changed {
            self.ratings.recompute(review.property_id).await?;
        }
        self.view(review).await
    }

    async fn delete(&self, user_id: Uuid, review_id: Uuid) -> AppResult<()> {
        let review = self.find_authored(user_id, review_id).await?;
        self.uow.reviews().delete(review.id).await?;
        self.ratings.recompute(review.property_id).await?;

        tracing::info!(review_id = %review_id, property_id = %review.property_id, "Review deleted");
        Ok(())
    }

    async fn toggle_like(&self, user_id: Uuid, review_id: Uuid) -> AppResult<usize> {
        let review = self
            .uow
            .reviews()
            .toggle_like(review_id, user_id)
            .await?
            .ok_or_not_found("Review")?;
        Ok(review.like_count())
    }

    async fn list_mine(
        &self,
        user_id: Uuid,
        page: PaginationParams,
    ) -> AppResult<Paginated<ReviewView>> {
        let (reviews, total) = self.uow.reviews().list_by_user(user_id, page).await?;
        Ok(Paginated::new(self.views(reviews).await?, &page, total))
    }
}
