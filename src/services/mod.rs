//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain rules over the `UnitOfWork` and the object
//! store. Each is a trait so handlers and other services depend on the
//! abstraction and tests substitute mocks.

mod auth_service;
pub mod container;
mod image_service;
mod listing_service;
mod quota_service;
mod rating_service;
mod review_service;
mod saved_service;
mod subscription_service;

// Service Container
pub use container::{parallel, ServiceContainer, Services};

// Service traits and implementations
pub use auth_service::{
    AuthService, Authenticator, Claims, LoginResponse, Registration, TokenResponse,
};
pub use image_service::{ImagePipeline, ImageService, StoredImage};
pub use listing_service::{ListingManager, ListingService};
pub use quota_service::{QuotaEngine, QuotaReservation, QuotaService};
pub use rating_service::{RatingAggregator, RatingService};
pub use review_service::{ReviewManager, ReviewService};
pub use saved_service::{SavedLists, SavedManager, SavedService};
pub use subscription_service::{SubscriptionManager, SubscriptionService};

#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
#[cfg(any(test, feature = "test-utils"))]
pub use image_service::MockImageService;
#[cfg(any(test, feature = "test-utils"))]
pub use quota_service::MockQuotaService;
#[cfg(any(test, feature = "test-utils"))]
pub use rating_service::MockRatingService;
