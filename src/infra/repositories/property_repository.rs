//! Property repository: listings, search, view counter and rating columns.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, Func, Query},
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select, Set,
};
use uuid::Uuid;

use super::entities::{
    location,
    property::{self, ActiveModel, Entity as PropertyEntity},
};
use crate::domain::{NewProperty, Property, PropertyChanges, PropertyDetails, PropertyFilter, RatingSummary};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait PropertyRepository: Send + Sync {
    async fn create(&self, property: NewProperty) -> AppResult<Property>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Property>>;

    /// The listing only if `owner_id` owns it.
    async fn find_owned(&self, id: Uuid, owner_id: Uuid) -> AppResult<Option<Property>>;

    async fn find_many(&self, ids: Vec<Uuid>) -> AppResult<Vec<Property>>;

    /// Filtered search, newest first. Returns the page and the total match count.
    async fn list(
        &self,
        filter: PropertyFilter,
        page: PaginationParams,
    ) -> AppResult<(Vec<Property>, u64)>;

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        page: PaginationParams,
    ) -> AppResult<(Vec<Property>, u64)>;

    async fn update(&self, id: Uuid, changes: PropertyChanges) -> AppResult<Property>;

    /// Atomic `views = views + 1`. False when the listing does not exist.
    async fn increment_views(&self, id: Uuid) -> AppResult<bool>;

    async fn set_rating(&self, id: Uuid, summary: RatingSummary) -> AppResult<()>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

pub struct PropertyStore {
    db: DatabaseConnection,
}

impl PropertyStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn fetch_page(
        &self,
        query: Select<PropertyEntity>,
        page: &PaginationParams,
    ) -> AppResult<(Vec<Property>, u64)> {
        let paginator = query
            .order_by_desc(property::Column::CreatedAt)
            .paginate(&self.db, page.limit());
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page.page_index()).await?;
        Ok((models.into_iter().map(Property::from).collect(), total))
    }
}

fn details_json(details: &PropertyDetails) -> AppResult<serde_json::Value> {
    serde_json::to_value(details)
        .map_err(|e| AppError::internal(format!("Failed to encode property details: {}", e)))
}

fn apply_filter(mut query: Select<PropertyEntity>, filter: PropertyFilter) -> Select<PropertyEntity> {
    if let Some(property_type) = filter.property_type {
        query = query.filter(property::Column::PropertyType.eq(property_type.as_str()));
    }
    if let Some(status) = filter.status {
        query = query.filter(property::Column::Status.eq(status.as_str()));
    }
    if let Some(min_price) = filter.min_price {
        query = query.filter(property::Column::Price.gte(min_price));
    }
    if let Some(max_price) = filter.max_price {
        query = query.filter(property::Column::Price.lte(max_price));
    }
    if let Some(min_bedrooms) = filter.min_bedrooms {
        query = query.filter(property::Column::Bedrooms.gte(min_bedrooms));
    }
    if let Some(city) = filter.city.filter(|c| !c.trim().is_empty()) {
        let in_city = Query::select()
            .column(location::Column::Id)
            .from(location::Entity)
            .and_where(
                Expr::expr(Func::lower(Expr::col(location::Column::City)))
                    .eq(city.trim().to_lowercase()),
            )
            .to_owned();
        query = query.filter(property::Column::LocationId.in_subquery(in_city));
    }
    query
}

#[async_trait]
impl PropertyRepository for PropertyStore {
    async fn create(&self, new: NewProperty) -> AppResult<Property> {
        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(new.title),
            description: Set(new.description),
            price: Set(new.price),
            bedrooms: Set(new.bedrooms),
            bathrooms: Set(new.bathrooms),
            area: Set(new.area),
            property_type: Set(new.property_type.as_str().to_string()),
            status: Set(new.status.as_str().to_string()),
            owner_id: Set(new.owner_id),
            location_id: Set(new.location_id),
            images: Set(new.images),
            details: Set(details_json(&new.details)?),
            amenities: Set(new.amenities),
            views: Set(0),
            average_rating: Set(0.0),
            total_reviews: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await?;
        Ok(Property::from(model))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Property>> {
        let result = PropertyEntity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(Property::from))
    }

    async fn find_owned(&self, id: Uuid, owner_id: Uuid) -> AppResult<Option<Property>> {
        let result = PropertyEntity::find_by_id(id)
            .filter(property::Column::OwnerId.eq(owner_id))
            .one(&self.db)
            .await?;
        Ok(result.map(Property::from))
    }

    async fn find_many(&self, ids: Vec<Uuid>) -> AppResult<Vec<Property>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = PropertyEntity::find()
            .filter(property::Column::Id.is_in(ids))
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Property::from).collect())
    }

    async fn list(
        &self,
        filter: PropertyFilter,
        page: PaginationParams,
    ) -> AppResult<(Vec<Property>, u64)> {
        let query = apply_filter(PropertyEntity::find(), filter);
        self.fetch_page(query, &page).await
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        page: PaginationParams,
    ) -> AppResult<(Vec<Property>, u64)> {
        let query = PropertyEntity::find().filter(property::Column::OwnerId.eq(owner_id));
        self.fetch_page(query, &page).await
    }

    async fn update(&self, id: Uuid, changes: PropertyChanges) -> AppResult<Property> {
        let existing = PropertyEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_not_found("Property")?;

        let mut active: ActiveModel = existing.into();
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(price) = changes.price {
            active.price = Set(price);
        }
        if let Some(bedrooms) = changes.bedrooms {
            active.bedrooms = Set(bedrooms);
        }
        if let Some(bathrooms) = changes.bathrooms {
            active.bathrooms = Set(bathrooms);
        }
        if let Some(area) = changes.area {
            active.area = Set(area);
        }
        if let Some(property_type) = changes.property_type {
            active.property_type = Set(property_type.as_str().to_string());
        }
        if let Some(status) = changes.status {
            active.status = Set(status.as_str().to_string());
        }
        if let Some(details) = changes.details {
            active.details = Set(details_json(&details)?);
        }
        if let Some(amenities) = changes.amenities {
            active.amenities = Set(amenities);
        }
        if let Some(images) = changes.images {
            active.images = Set(images);
        }
        active.updated_at = Set(Utc::now());

        let model = active.update(&self.db).await?;
        Ok(Property::from(model))
    }

    async fn increment_views(&self, id: Uuid) -> AppResult<bool> {
        let result = PropertyEntity::update_many()
            .col_expr(
                property::Column::Views,
                Expr::col(property::Column::Views).add(1),
            )
            .filter(property::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn set_rating(&self, id: Uuid, summary: RatingSummary) -> AppResult<()> {
        PropertyEntity::update_many()
            .col_expr(
                property::Column::AverageRating,
                Expr::value(summary.average_rating),
            )
            .col_expr(
                property::Column::TotalReviews,
                Expr::value(summary.total_reviews),
            )
            .col_expr(property::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(property::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        PropertyEntity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }
}
