//! Review repository.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbBackend, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, Statement,
};
use uuid::Uuid;

use super::entities::review::{self, ActiveModel, Entity as ReviewEntity};
use crate::domain::{NewReview, Review, ReviewPatch, ReviewSort};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Message for a second review of the same property by the same user.
pub const DUPLICATE_REVIEW_MESSAGE: &str = "You have already reviewed this property";

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Insert a review. The (property, user) unique index turns a duplicate into `Conflict`.
    async fn create(&self, review: NewReview) -> AppResult<Review>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Review>>;

    async fn find_for_user(&self, property_id: Uuid, user_id: Uuid) -> AppResult<Option<Review>>;

    async fn list_for_property(
        &self,
        property_id: Uuid,
        sort: ReviewSort,
        page: PaginationParams,
    ) -> AppResult<(Vec<Review>, u64)>;

    async fn list_by_user(
        &self,
        user_id: Uuid,
        page: PaginationParams,
    ) -> AppResult<(Vec<Review>, u64)>;

    /// Every rating currently recorded for the property.
    async fn ratings_for_property(&self, property_id: Uuid) -> AppResult<Vec<i32>>;

    async fn update(&self, id: Uuid, patch: ReviewPatch) -> AppResult<Review>;

    /// Add `user_id` to the likes if absent, otherwise remove it, in one statement.
    /// `None` when the review does not exist.
    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> AppResult<Option<Review>>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

pub struct ReviewStore {
    db: DatabaseConnection,
}

impl ReviewStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_model(&self, id: Uuid) -> AppResult<review::Model> {
        ReviewEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_not_found("Review")
    }

    async fn fetch_page(
        &self,
        query: Select<ReviewEntity>,
        page: &PaginationParams,
    ) -> AppResult<(Vec<Review>, u64)> {
        let paginator = query.paginate(&self.db, page.limit());
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page.page_index()).await?;
        Ok((models.into_iter().map(Review::from).collect(), total))
    }
}

fn sorted(query: Select<ReviewEntity>, sort: ReviewSort) -> Select<ReviewEntity> {
    match sort {
        ReviewSort::Newest => query.order_by_desc(review::Column::CreatedAt),
        ReviewSort::Oldest => query.order_by_asc(review::Column::CreatedAt),
        ReviewSort::Highest => query
            .order_by_desc(review::Column::Rating)
            .order_by_desc(review::Column::CreatedAt),
        ReviewSort::Lowest => query
            .order_by_asc(review::Column::Rating)
            .order_by_desc(review::Column::CreatedAt),
    }
}

#[async_trait]
impl ReviewRepository for ReviewStore {
    async fn create(&self, new: NewReview) -> AppResult<Review> {
        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            property_id: Set(new.property_id),
            user_id: Set(new.user_id),
            rating: Set(new.rating),
            title: Set(new.title),
            comment: Set(new.comment),
            likes: Set(Vec::new()),
            is_verified_stay: Set(false),
            images: Set(new.images),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| AppError::from_db_unique(e, DUPLICATE_REVIEW_MESSAGE))?;
        Ok(Review::from(model))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Review>> {
        let result = ReviewEntity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(Review::from))
    }

    async fn find_for_user(&self, property_id: Uuid, user_id: Uuid) -> AppResult<Option<Review>> {
        let result = ReviewEntity::find()
            .filter(review::Column::PropertyId.eq(property_id))
            .filter(review::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(result.map(Review::from))
    }

    async fn list_for_property(
        &self,
        property_id: Uuid,
        sort: ReviewSort,
        page: PaginationParams,
    ) -> AppResult<(Vec<Review>, u64)> {
        let query = ReviewEntity::find().filter(review::Column::PropertyId.eq(property_id));
        self.fetch_page(sorted(query, sort), &page).await
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        page: PaginationParams,
    ) -> AppResult<(Vec<Review>, u64)> {
        let query = ReviewEntity::find()
            .filter(review::Column::UserId.eq(user_id))
            .order_by_desc(review::Column::CreatedAt);
        self.fetch_page(query, &page).await
    }

    async fn ratings_for_property(&self, property_id: Uuid) -> AppResult<Vec<i32>> {
        let ratings = ReviewEntity::find()
            .select_only()
            .column(review::Column::Rating)
            .filter(review::Column::PropertyId.eq(property_id))
            .into_tuple::<i32>()
            .all(&self.db)
            .await?;
        Ok(ratings)
    }

    async fn update(&self, id: Uuid, patch: ReviewPatch) -> AppResult<Review> {
        let mut active: ActiveModel = self.find_model(id).await?.into();
        if let Some(rating) = patch.rating {
            active.rating = Set(rating);
        }
        if let Some(title) = patch.title {
            active.title = Set(title);
        }
        if let Some(comment) = patch.comment {
            active.comment = Set(comment);
        }
        if let Some(images) = patch.images {
            active.images = Set(images);
        }
        active.updated_at = Set(Utc::now());

        let model = active.update(&self.db).await?;
        Ok(Review::from(model))
    }

    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> AppResult<Option<Review>> {
        let statement = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"UPDATE reviews
               SET likes = CASE WHEN $1 = ANY(likes)
                                THEN array_remove(likes, $1)
                                ELSE array_append(likes, $1) END,
                   updated_at = NOW()
               WHERE id = $2
               RETURNING *"#,
            [user_id.into(), id.into()],
        );

        let result = ReviewEntity::find()
            .from_raw_sql(statement)
            .one(&self.db)
            .await?;
        Ok(result.map(Review::from))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        ReviewEntity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }
}
