//! Location repository.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use super::entities::location::{self, ActiveModel, Entity as LocationEntity};
use crate::domain::{Location, LocationInput, LocationPatch};
use crate::errors::{AppResult, OptionExt};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait LocationRepository: Send + Sync {
    async fn create(&self, input: LocationInput) -> AppResult<Location>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Location>>;

    async fn find_many(&self, ids: Vec<Uuid>) -> AppResult<Vec<Location>>;

    /// Apply the patch to the existing row in place.
    async fn update(&self, id: Uuid, patch: LocationPatch) -> AppResult<Location>;

    /// Deleting an absent location is not an error.
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

pub struct LocationStore {
    db: DatabaseConnection,
}

impl LocationStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LocationRepository for LocationStore {
    async fn create(&self, input: LocationInput) -> AppResult<Location> {
        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            country: Set(input.country),
            province: Set(input.province),
            city: Set(input.city),
            district: Set(input.district),
            street: Set(input.street),
            latitude: Set(input.latitude),
            longitude: Set(input.longitude),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await?;
        Ok(Location::from(model))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Location>> {
        let result = LocationEntity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(Location::from))
    }

    async fn find_many(&self, ids: Vec<Uuid>) -> AppResult<Vec<Location>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = LocationEntity::find()
            .filter(location::Column::Id.is_in(ids))
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Location::from).collect())
    }

    async fn update(&self, id: Uuid, patch: LocationPatch) -> AppResult<Location> {
        let existing = LocationEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_not_found("Location")?;

        let mut active: ActiveModel = existing.into();
        if let Some(country) = patch.country {
            active.country = Set(country);
        }
        if let Some(province) = patch.province {
            active.province = Set(province);
        }
        if let Some(city) = patch.city {
            active.city = Set(city);
        }
        if let Some(district) = patch.district {
            active.district = Set(Some(district));
        }
        if let Some(street) = patch.street {
            active.street = Set(Some(street));
        }
        if let Some(latitude) = patch.latitude {
            active.latitude = Set(Some(latitude));
        }
        if let Some(longitude) = patch.longitude {
            active.longitude = Set(Some(longitude));
        }
        active.updated_at = Set(Utc::now());

        let model = active.update(&self.db).await?;
        Ok(Location::from(model))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        LocationEntity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }
}
