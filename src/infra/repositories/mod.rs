//! Repository layer over the relational store.
//!
//! Each aggregate gets a trait (mockable in tests) and a `*Store` backed by sea-orm.

pub(crate) mod entities;
mod location_repository;
mod property_repository;
mod review_repository;
mod subscription_repository;
mod user_repository;

pub use location_repository::{LocationRepository, LocationStore};
pub use property_repository::{PropertyRepository, PropertyStore};
pub use review_repository::{ReviewRepository, ReviewStore, DUPLICATE_REVIEW_MESSAGE};
pub use subscription_repository::{SubscriptionRepository, SubscriptionStore};
pub use user_repository::{UserRepository, UserStore};

#[cfg(any(test, feature = "test-utils"))]
pub use location_repository::MockLocationRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use property_repository::MockPropertyRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use review_repository::MockReviewRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use subscription_repository::MockSubscriptionRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
