//! Favorites and wishlist: per-user saved property lists.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::listing_service::populate;
use crate::domain::{merge_ids, PropertyView, SavedList};
use crate::errors::{AppResult, OptionExt};
use crate::infra::UnitOfWork;

/// Both lists as stored on the account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SavedLists {
    #[serde(default)]
    pub favorites: Vec<Uuid>,
    #[serde(default)]
    pub wishlist: Vec<Uuid>,
}

#[async_trait]
pub trait SavedService: Send + Sync {
    /// Add the property when absent, remove it when present. Returns the new list.
    async fn toggle(&self, user_id: Uuid, list: SavedList, property_id: Uuid)
        -> AppResult<Vec<Uuid>>;

    async fn list(&self, user_id: Uuid, list: SavedList) -> AppResult<Vec<PropertyView>>;

    /// Union client-held lists into the stored ones, skipping unknown properties.
    async fn sync(&self, user_id: Uuid, incoming: SavedLists) -> AppResult<SavedLists>;
}

pub struct SavedManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> SavedManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    async fn existing(&self, ids: Vec<Uuid>) -> AppResult<Vec<Uuid>> {
        if ids.is_empty() {
            return Ok(ids);
        }
        let found: Vec<Uuid> = self
            .uow
            .properties()
            .find_many(ids.clone())
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();
        Ok(ids.into_iter().filter(|id| found.contains(id)).collect())
    }
}

fn select(favorites: Vec<Uuid>, wishlist: Vec<Uuid>, list: SavedList) -> Vec<Uuid> {
    match list {
        SavedList::Favorites => favorites,
        SavedList::Wishlist => wishlist,
    }
}

#[async_trait]
impl<U: UnitOfWork> SavedService for SavedManager<U> {
    async fn toggle(
        &self,
        user_id: Uuid,
        list: SavedList,
        property_id: Uuid,
    ) -> AppResult<Vec<Uuid>> {
        self.uow
            .properties()
            .find_by_id(property_id)
            .await?
            .ok_or_not_found("Property")?;

        let ids = self
            .uow
            .users()
            .toggle_saved(user_id, list, property_id)
            .await?
            .ok_or_not_found("User")?;
        let saved = ids.contains(&property_id);
        tracing::debug!(user_id = %user_id, property_id = %property_id, ?list, saved, "Saved list toggled");
        Ok(ids)
    }

    async fn list(&self, user_id: Uuid, list: SavedList) -> AppResult<Vec<PropertyView>> {
        let user = self
            .uow
            .users()
            .find_by_id(user_id)
            .await?
            .ok_or_not_found("User")?;
        let ids = select(user.favorites, user.wishlist, list);
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // Keep the order the user saved them in; deleted listings drop out.
        let mut properties = self.uow.properties().find_many(ids.clone()).await?;
        properties.sort_by_key(|p| ids.iter().position(|id| *id == p.id));
        populate(self.uow.as_ref(), properties).await
    }

    async fn sync(&self, user_id: Uuid, incoming: SavedLists) -> AppResult<SavedLists> {
        let (incoming_favorites, incoming_wishlist) = tokio::try_join!(
            self.existing(incoming.favorites),
            self.existing(incoming.wishlist),
        )?;

        let (mut favorites, mut wishlist) = (Vec::new(), Vec::new());
        merge_ids(&mut favorites, incoming_favorites);
        merge_ids(&mut wishlist, incoming_wishlist);

        let user = self
            .uow
            .users()
            .append_saved(user_id, favorites, wishlist)
            .await?
            .ok_or_not_found("User")?;
        Ok(SavedLists {
            favorites: user.favorites,
            wishlist: user.wishlist,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ListingStatus, Property, PropertyType, User, UserRole};
    use crate::errors::AppError;
    use crate::infra::{
        LocationRepository, MockLocationRepository, MockPropertyRepository, MockUnitOfWork,
        MockUserRepository, PropertyRepository, UserRepository,
    };
    use chrono::Utc;

    fn user(favorites: Vec<Uuid>, wishlist: Vec<Uuid>) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            phone_number: "+250788000001".into(),
            password_hash: String::new(),
            role: UserRole::User,
            is_verified: true,
            verification: None,
            password_reset: None,
            favorites,
            wishlist,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn property(id: Uuid) -> Property {
        Property {
            id,
            title: "Loft".into(),
            description: "Open plan".into(),
            price: 800.0,
            bedrooms: 1,
            bathrooms: 1,
            area: 40.0,
            property_type: PropertyType::Apartment,
            status: ListingStatus::ForRent,
            owner_id: Uuid::new_v4(),
            location_id: Uuid::new_v4(),
            images: vec![],
            details: Default::default(),
            amenities: vec![],
            views: 0,
            average_rating: 0.0,
            total_reviews: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn manager(
        users: MockUserRepository,
        properties: MockPropertyRepository,
    ) -> SavedManager<MockUnitOfWork> {
        let mut locations = MockLocationRepository::new();
        locations.expect_find_many().returning(|_| Ok(vec![]));
        let users: Arc<dyn UserRepository> = Arc::new(users);
        let properties: Arc<dyn PropertyRepository> = Arc::new(properties);
        let locations: Arc<dyn LocationRepository> = Arc::new(locations);
        let mut uow = MockUnitOfWork::new();
        uow.expect_users().returning(move || users.clone());
        uow.expect_properties().returning(move || properties.clone());
        uow.expect_locations().returning(move || locations.clone());
        SavedManager::new(Arc::new(uow))
    }

    #[tokio::test]
    async fn test_toggle_is_a_single_store_update() {
        let property_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().never();
        users
            .expect_toggle_saved()
            .withf(move |id, list, property| {
                *id == user_id && *list == SavedList::Favorites && *property == property_id
            })
            .times(1)
            .returning(|_, _, _| Ok(Some(vec![])));
        let mut properties = MockPropertyRepository::new();
        properties
            .expect_find_by_id()
            .returning(|id| Ok(Some(property(id))));

        let ids = manager(users, properties)
            .toggle(user_id, SavedList::Favorites, property_id)
            .await
            .unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_for_unknown_user() {
        let mut users = MockUserRepository::new();
        users.expect_toggle_saved().returning(|_, _, _| Ok(None));
        let mut properties = MockPropertyRepository::new();
        properties
            .expect_find_by_id()
            .returning(|id| Ok(Some(property(id))));

        let err = manager(users, properties)
            .toggle(Uuid::new_v4(), SavedList::Wishlist, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref e) if e == "User"));
    }

    #[tokio::test]
    async fn test_toggle_unknown_property() {
        let mut users = MockUserRepository::new();
        users.expect_toggle_saved().never();
        let mut properties = MockPropertyRepository::new();
        properties.expect_find_by_id().returning(|_| Ok(None));

        let err = manager(users, properties)
            .toggle(Uuid::new_v4(), SavedList::Wishlist, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_sync_merges_existing_ids_only() {
        let kept = Uuid::new_v4();
        let incoming = Uuid::new_v4();
        let deleted = Uuid::new_v4();
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().never();
        users
            .expect_append_saved()
            .withf(move |_, favorites, wishlist| {
                favorites == &vec![incoming, kept] && wishlist == &vec![incoming]
            })
            .times(1)
            .returning(move |id, favorites, wishlist| {
                // Stored favorites already held `kept`.
                let mut stored = user(vec![kept], wishlist);
                merge_ids(&mut stored.favorites, favorites);
                stored.id = id;
                Ok(Some(stored))
            });
        let mut properties = MockPropertyRepository::new();
        properties.expect_find_many().returning(move |ids| {
            Ok(ids
                .into_iter()
                .filter(|id| *id != deleted)
                .map(property)
                .collect())
        });

        let merged = manager(users, properties)
            .sync(
                Uuid::new_v4(),
                SavedLists {
                    favorites: vec![incoming, kept, deleted, incoming],
                    wishlist: vec![deleted, incoming],
                },
            )
            .await
            .unwrap();
        assert_eq!(merged.favorites, vec![kept, incoming]);
        assert_eq!(merged.wishlist, vec![incoming]);
    }

    #[tokio::test]
    async fn test_list_keeps_saved_order() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let account = user(vec![], vec![first, second]);

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(account.clone())));
        users.expect_find_many().returning(|_| Ok(vec![]));
        let mut properties = MockPropertyRepository::new();
        properties
            .expect_find_many()
            .returning(|ids| Ok(ids.into_iter().rev().map(property).collect()));

        let views = manager(users, properties)
            .list(Uuid::new_v4(), SavedList::Wishlist)
            .await
            .unwrap();
        let ids: Vec<Uuid> = views.iter().map(|v| v.property.id).collect();
        assert_eq!(ids, vec![first, second]);
    }
}
