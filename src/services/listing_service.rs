//! Listing workflow orchestrator.
//!
//! Create runs quota → images → location → property, undoing completed steps in
//! reverse when a later one fails. Update appends new images and patches the
//! location in place. Delete removes images, then the location, then the listing.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::{ImageService, QuotaReservation, QuotaService};
use crate::domain::{
    Actor, Location, NewProperty, OwnerSummary, Property, PropertyChanges, PropertyDraft,
    PropertyFilter, PropertyPatch, PropertyView,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::types::{Paginated, PaginationParams};

#[async_trait]
pub trait ListingService: Send + Sync {
    async fn create(
        &self,
        actor: Actor,
        draft: PropertyDraft,
        images: Vec<Bytes>,
    ) -> AppResult<PropertyView>;

    /// Owner only; anyone else gets `NotFoundOrUnauthorized`.
    async fn update(
        &self,
        actor: Actor,
        id: Uuid,
        patch: PropertyPatch,
        images: Vec<Bytes>,
    ) -> AppResult<PropertyView>;

    async fn delete(&self, actor: Actor, id: Uuid) -> AppResult<()>;

    async fn list(
        &self,
        filter: PropertyFilter,
        page: PaginationParams,
    ) -> AppResult<Paginated<PropertyView>>;

    /// Counts as a view.
    async fn get(&self, id: Uuid) -> AppResult<PropertyView>;

    async fn list_mine(
        &self,
        owner_id: Uuid,
        page: PaginationParams,
    ) -> AppResult<Paginated<PropertyView>>;
}

/// Attach locations and owner summaries to listings, one batched query each.
pub(crate) async fn populate<U: UnitOfWork>(
    uow: &U,
    properties: Vec<Property>,
) -> AppResult<Vec<PropertyView>> {
    if properties.is_empty() {
        return Ok(Vec::new());
    }

    let location_ids: Vec<Uuid> = properties.iter().map(|p| p.location_id).collect();
    let mut owner_ids: Vec<Uuid> = properties.iter().map(|p| p.owner_id).collect();
    owner_ids.sort_unstable();
    owner_ids.dedup();

    let (location_repo, user_repo) = (uow.locations(), uow.users());
    let (locations, owners) = tokio::try_join!(
        location_repo.find_many(location_ids),
        user_repo.find_many(owner_ids),
    )?;

    let mut locations: HashMap<Uuid, Location> =
        locations.into_iter().map(|l| (l.id, l)).collect();
    let owners: HashMap<Uuid, OwnerSummary> = owners
        .iter()
        .map(|u| (u.id, OwnerSummary::from(u)))
        .collect();

    Ok(properties
        .into_iter()
        .map(|property| {
            let location = locations.remove(&property.location_id);
            let owner = owners.get(&property.owner_id).cloned();
            PropertyView::new(property, location, owner)
        })
        .collect())
}

pub struct ListingManager<U: UnitOfWork> {
    uow: Arc<U>,
    quota: Arc<dyn QuotaService>,
    images: Arc<dyn ImageService>,
}

impl<U: UnitOfWork> ListingManager<U> {
    pub fn new(uow: Arc<U>, quota: Arc<dyn QuotaService>, images: Arc<dyn ImageService>) -> Self {
        Self { uow, quota, images }
    }

    async fn view(&self, property: Property) -> AppResult<PropertyView> {
        let (locations, users) = (self.uow.locations(), self.uow.users());
        let (location, owner) = tokio::try_join!(
            locations.find_by_id(property.location_id),
            users.find_by_id(property.owner_id),
        )?;
        Ok(PropertyView::new(
            property,
            location,
            owner.as_ref().map(OwnerSummary::from),
        ))
    }

    async fn paginate(
        &self,
        (properties, total): (Vec<Property>, u64),
        page: &PaginationParams,
    ) -> AppResult<Paginated<PropertyView>> {
        let views = populate(self.uow.as_ref(), properties).await?;
        Ok(Paginated::new(views, page, total))
    }

    /// Everything after the quota reservation. On error, whatever this step
    /// stored has already been removed.
    async fn write_listing(
        &self,
        owner_id: Uuid,
        draft: PropertyDraft,
        files: Vec<Bytes>,
    ) -> AppResult<Property> {
        let image_urls: Vec<String> = self
            .images
            .upload_many(files)
            .await?
            .into_iter()
            .map(|image| image.url)
            .collect();

        let location = match self.uow.locations().create(draft.location.clone()).await {
            Ok(location) => location,
            Err(e) => {
                self.images.discard(image_urls).await;
                return Err(e);
            }
        };

        let new_property = NewProperty::from_draft(draft, owner_id, location.id, image_urls.clone());
        match self.uow.properties().create(new_property).await {
            Ok(property) => Ok(property),
            Err(e) => {
                if let Err(cleanup) = self.uow.locations().delete(location.id).await {
                    tracing::error!(
                        location_id = %location.id,
                        error = %cleanup,
                        "Failed to remove orphan location"
                    );
                }
                self.images.discard(image_urls).await;
                Err(e)
            }
        }
    }

    async fn release_quota(&self, reservation: QuotaReservation) {
        if let Err(e) = self.quota.release(reservation).await {
            tracing::error!(
                agent_id = %reservation.agent_id,
                error = %e,
                "Failed to release quota slot"
            );
        }
    }
}

fn require_lister(actor: &Actor) -> AppResult<()> {
    if actor.role.can_list_properties() {
        Ok(())
    } else {
        Err(AppError::forbidden("Not authorized for this action"))
    }
}

#[async_trait]
impl<U: UnitOfWork> ListingService for ListingManager<U> {
    async fn create(
        &self,
        actor: Actor,
        draft: PropertyDraft,
        images: Vec<Bytes>,
    ) -> AppResult<PropertyView> {
        require_lister(&actor)?;
        let reservation = self.quota.authorize_and_reserve(actor.id).await?;

        let property = match self.write_listing(actor.id, draft, images).await {
            Ok(property) => property,
            Err(e) => {
                self.release_quota(reservation).await;
                return Err(e);
            }
        };

        tracing::info!(
            property_id = %property.id,
            owner_id = %actor.id,
            images = property.images.len(),
            "Property created"
        );
        self.view(property).await
    }

    async fn update(
        &self,
        actor: Actor,
        id: Uuid,
        patch: PropertyPatch,
        images: Vec<Bytes>,
    ) -> AppResult<PropertyView> {
        require_lister(&actor)?;
        let existing = self
            .uow
            .properties()
            .find_owned(id, actor.id)
            .await?
            .ok_or_not_owned("Property")?;

        let new_urls: Vec<String> = self
            .images
            .upload_many(images)
            .await?
            .into_iter()
            .map(|image| image.url)
            .collect();

        let (mut changes, location_patch): (PropertyChanges, _) = PropertyChanges::from_patch(patch);
        if !new_urls.is_empty() {
            let mut all = existing.images.clone();
            all.extend(new_urls.iter().cloned());
            changes.images = Some(all);
        }

        let result: AppResult<Property> = async {
            if let Some(location_patch) = location_patch.filter(|p| !p.is_empty()) {
                self.uow
                    .locations()
                    .update(existing.location_id, location_patch)
                    .await?;
            }
            self.uow.properties().update(id, changes).await
        }
        .await;

        match result {
            Ok(property) => {
                tracing::info!(property_id = %id, added_images = new_urls.len(), "Property updated");
                self.view(property).await
            }
            Err(e) => {
                self.images.discard(new_urls).await;
                Err(e)
            }
        }
    }

    async fn delete(&self, actor: Actor, id: Uuid) -> AppResult<()> {
        require_lister(&actor)?;
        let property = self
            .uow
            .properties()
            .find_owned(id, actor.id)
            .await?
            .ok_or_not_owned("Property")?;

        self.images.delete_urls(property.images.clone()).await?;
        self.uow.locations().delete(property.location_id).await?;
        self.uow.properties().delete(property.id).await?;

        tracing::info!(property_id = %id, owner_id = %actor.id, "Property deleted");
        Ok(())
    }

    async fn list(
        &self,
        filter: PropertyFilter,
        page: PaginationParams,
    ) -> AppResult<Paginated<PropertyView>> {
        let found = self.uow.properties().list(filter, page).await?;
        self.paginate(found, &page).await
    }

    async fn get(&self, id: Uuid) -> AppResult<PropertyView> {
        if !self.uow.properties().increment_views(id).await? {
            return Err(AppError::not_found("Property"));
        }
        let property = self
            .uow
            .properties()
            .find_by_id(id)
            .await?
            .ok_or_not_found("Property")?;
        self.view(property).await
    }

    async fn list_mine(
        &self,
        owner_id: Uuid,
        page: PaginationParams,
    ) -> AppResult<Paginated<PropertyView>> {
        let found = self.uow.properties().list_by_owner(owner_id, page).await?;
        self.paginate(found, &page).await
    }
}
