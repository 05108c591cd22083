//! Infrastructure: relational store, Redis, object storage and image processing.

pub mod cache;
pub mod db;
pub mod images;
pub mod repositories;
pub mod storage;
pub mod unit_of_work;

pub use cache::Cache;
pub use db::{Database, Migrator};
pub use repositories::{
    LocationRepository, LocationStore, PropertyRepository, PropertyStore, ReviewRepository,
    ReviewStore, SubscriptionRepository, SubscriptionStore, UserRepository, UserStore,
    DUPLICATE_REVIEW_MESSAGE,
};
pub use storage::{ImageStore, ObjectStoreGateway};
pub use unit_of_work::{Persistence, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
pub use repositories::{
    MockLocationRepository, MockPropertyRepository, MockReviewRepository,
    MockSubscriptionRepository, MockUserRepository,
};
#[cfg(any(test, feature = "test-utils"))]
pub use storage::MockImageStore;
#[cfg(any(test, feature = "test-utils"))]
pub use unit_of_work::MockUnitOfWork;
