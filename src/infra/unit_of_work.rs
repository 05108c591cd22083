//! Unit of Work: one hub handing out every repository.
//!
//! Services depend on `UnitOfWork` rather than on individual stores, so a single
//! generic parameter carries all persistence and tests swap in `MockUnitOfWork`.

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use super::repositories::{
    LocationRepository, LocationStore, PropertyRepository, PropertyStore, ReviewRepository,
    ReviewStore, SubscriptionRepository, SubscriptionStore, UserRepository, UserStore,
};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait UnitOfWork: Send + Sync {
    fn users(&self) -> Arc<dyn UserRepository>;

    fn locations(&self) -> Arc<dyn LocationRepository>;

    fn properties(&self) -> Arc<dyn PropertyRepository>;

    fn reviews(&self) -> Arc<dyn ReviewRepository>;

    fn subscriptions(&self) -> Arc<dyn SubscriptionRepository>;
}

/// Database-backed `UnitOfWork`.
pub struct Persistence {
    users: Arc<UserStore>,
    locations: Arc<LocationStore>,
    properties: Arc<PropertyStore>,
    reviews: Arc<ReviewStore>,
    subscriptions: Arc<SubscriptionStore>,
}

impl Persistence {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            users: Arc::new(UserStore::new(db.clone())),
            locations: Arc::new(LocationStore::new(db.clone())),
            properties: Arc::new(PropertyStore::new(db.clone())),
            reviews: Arc::new(ReviewStore::new(db.clone())),
            subscriptions: Arc::new(SubscriptionStore::new(db)),
        }
    }
}

impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    fn locations(&self) -> Arc<dyn LocationRepository> {
        self.locations.clone()
    }

    fn properties(&self) -> Arc<dyn PropertyRepository> {
        self.properties.clone()
    }

    fn reviews(&self) -> Arc<dyn ReviewRepository> {
        self.reviews.clone()
    }

    fn subscriptions(&self) -> Arc<dyn SubscriptionRepository> {
        self.subscriptions.clone()
    }
}
