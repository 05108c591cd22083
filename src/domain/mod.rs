//! Domain layer - Core business entities and rules.
//!
//! These types carry no persistence or transport concerns; stores map
//! their rows into them and handlers serialize them out.

pub mod location;
pub mod password;
pub mod property;
pub mod review;
pub mod subscription;
pub mod user;

pub use location::{Location, LocationInput, LocationPatch};
pub use password::Password;
pub use property::{
    image_key_from_url, ListingStatus, NewProperty, Property, PropertyChanges, PropertyDetails,
    PropertyDraft, PropertyFilter, PropertyPatch, PropertyType, PropertyView,
};
pub use review::{
    NewReview, RatingSummary, Review, ReviewDraft, ReviewPatch, ReviewSort, ReviewSortQuery,
    ReviewView, ReviewerSummary,
};
pub use subscription::{
    AgentSubscription, NewPlan, NewSubscription, SubscriptionPlan, SubscriptionView,
};
pub use user::{
    merge_ids, Actor, NewUser, OwnerSummary, PendingToken, SavedList, User,
    UserResponse, UserRole,
};
