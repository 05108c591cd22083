//! Property listing entity and its request payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::location::{Location, LocationInput, LocationPatch};
use super::user::OwnerSummary;

/// Kind of dwelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    House,
    Apartment,
    Condo,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::House => "house",
            PropertyType::Apartment => "apartment",
            PropertyType::Condo => "condo",
        }
    }
}

impl From<&str> for PropertyType {
    fn from(s: &str) -> Self {
        match s {
            "apartment" => PropertyType::Apartment,
            "condo" => PropertyType::Condo,
            _ => PropertyType::House,
        }
    }
}

/// Whether the listing is offered for sale or for rent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ListingStatus {
    ForSale,
    ForRent,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::ForSale => "for-sale",
            ListingStatus::ForRent => "for-rent",
        }
    }
}

impl From<&str> for ListingStatus {
    fn from(s: &str) -> Self {
        match s {
            "for-rent" => ListingStatus::ForRent,
            _ => ListingStatus::ForSale,
        }
    }
}

/// Free-form extras stored alongside the listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PropertyDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_built: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parking_spaces: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub furnished: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heating: Option<String>,
}

/// Property listing as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Property {
    pub id: Uuid,
    #[schema(example = "Sunny two-bedroom apartment")]
    pub title: String,
    pub description: String,
    #[schema(example = 125000.0)]
    pub price: f64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    /// Floor area in square meters
    pub area: f64,
    pub property_type: PropertyType,
    pub status: ListingStatus,
    pub owner_id: Uuid,
    pub location_id: Uuid,
    /// Public image URLs, in upload order
    pub images: Vec<String>,
    pub details: PropertyDetails,
    pub amenities: Vec<String>,
    pub views: i64,
    pub average_rating: f64,
    pub total_reviews: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing returned to clients with its location and owner filled in.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PropertyView {
    #[serde(flatten)]
    pub property: Property,
    pub location: Option<Location>,
    pub owner: Option<OwnerSummary>,
}

impl PropertyView {
    pub fn new(property: Property, location: Option<Location>, owner: Option<OwnerSummary>) -> Self {
        Self {
            property,
            location,
            owner,
        }
    }
}

/// JSON body of a listing create request (the `data` part of the multipart form).
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PropertyDraft {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,
    #[validate(range(min = 0, message = "Bedrooms cannot be negative"))]
    pub bedrooms: i32,
    #[validate(range(min = 0, message = "Bathrooms cannot be negative"))]
    pub bathrooms: i32,
    #[validate(range(min = 0.0, message = "Area cannot be negative"))]
    pub area: f64,
    pub property_type: PropertyType,
    pub status: ListingStatus,
    #[serde(default)]
    pub details: PropertyDetails,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[validate(nested)]
    pub location: LocationInput,
}

/// JSON body of a listing update request. Images are appended separately.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct PropertyPatch {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: Option<f64>,
    #[validate(range(min = 0, message = "Bedrooms cannot be negative"))]
    pub bedrooms: Option<i32>,
    #[validate(range(min = 0, message = "Bathrooms cannot be negative"))]
    pub bathrooms: Option<i32>,
    #[validate(range(min = 0.0, message = "Area cannot be negative"))]
    pub area: Option<f64>,
    pub property_type: Option<PropertyType>,
    pub status: Option<ListingStatus>,
    pub details: Option<PropertyDetails>,
    pub amenities: Option<Vec<String>>,
    #[validate(nested)]
    pub location: Option<LocationPatch>,
}

/// Everything the store needs to insert a listing.
#[derive(Debug, Clone)]
pub struct NewProperty {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area: f64,
    pub property_type: PropertyType,
    pub status: ListingStatus,
    pub details: PropertyDetails,
    pub amenities: Vec<String>,
    pub owner_id: Uuid,
    pub location_id: Uuid,
    pub images: Vec<String>,
}

impl NewProperty {
    pub fn from_draft(draft: PropertyDraft, owner_id: Uuid, location_id: Uuid, images: Vec<String>) -> Self {
        Self {
            title: draft.title,
            description: draft.description,
            price: draft.price,
            bedrooms: draft.bedrooms,
            bathrooms: draft.bathrooms,
            area: draft.area,
            property_type: draft.property_type,
            status: draft.status,
            details: draft.details,
            amenities: draft.amenities,
            owner_id,
            location_id,
            images,
        }
    }
}

/// Column-level changes applied to a stored listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area: Option<f64>,
    pub property_type: Option<PropertyType>,
    pub status: Option<ListingStatus>,
    pub details: Option<PropertyDetails>,
    pub amenities: Option<Vec<String>>,
    /// Full replacement image list
    pub images: Option<Vec<String>>,
}

impl PropertyChanges {
    /// Split a patch into listing changes and the nested location patch.
    pub fn from_patch(patch: PropertyPatch) -> (Self, Option<LocationPatch>) {
        let changes = Self {
            title: patch.title,
            description: patch.description,
            price: patch.price,
            bedrooms: patch.bedrooms,
            bathrooms: patch.bathrooms,
            area: patch.area,
            property_type: patch.property_type,
            status: patch.status,
            details: patch.details,
            amenities: patch.amenities,
            images: None,
        };
        (changes, patch.location)
    }
}

/// Query filters for the public listing search.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PropertyFilter {
    #[serde(rename = "type")]
    #[param(rename = "type", value_type = Option<String>, example = "apartment")]
    pub property_type: Option<PropertyType>,
    #[param(value_type = Option<String>, example = "for-rent")]
    pub status: Option<ListingStatus>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_bedrooms: Option<i32>,
    /// Case-insensitive city match
    pub city: Option<String>,
}

/// Storage key of an image URL: its last path segment.
pub fn image_key_from_url(url: &str) -> Option<&str> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
}
