//! Location owned by a single property.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Street address and optional coordinates of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Location {
    pub id: Uuid,
    #[schema(example = "Rwanda")]
    pub country: String,
    #[schema(example = "Kigali")]
    pub province: String,
    #[schema(example = "Kigali")]
    pub city: String,
    #[schema(example = "Gasabo")]
    pub district: Option<String>,
    #[schema(example = "KG 11 Ave")]
    pub street: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Location payload nested in a new listing.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct LocationInput {
    #[validate(length(min = 1, message = "Country is required"))]
    pub country: String,
    #[validate(length(min = 1, message = "Province is required"))]
    pub province: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: Option<f64>,
    #[serde(default)]
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: Option<f64>,
}

/// Partial location update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate, ToSchema)]
pub struct LocationPatch {
    #[validate(length(min = 1, message = "Country cannot be empty"))]
    pub country: Option<String>,
    #[validate(length(min = 1, message = "Province cannot be empty"))]
    pub province: Option<String>,
    #[validate(length(min = 1, message = "City cannot be empty"))]
    pub city: Option<String>,
    pub district: Option<String>,
    pub street: Option<String>,
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: Option<f64>,
}

impl LocationPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_input_requires_city() {
        let input = LocationInput {
            country: "Rwanda".into(),
            province: "Kigali".into(),
            city: String::new(),
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_coordinates_are_range_checked() {
        let input = LocationInput {
            country: "Rwanda".into(),
            province: "Kigali".into(),
            city: "Kigali".into(),
            latitude: Some(120.0),
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_empty_patch() {
        assert!(LocationPatch::default().is_empty());
        let patch = LocationPatch {
            street: Some("KN 5 Rd".into()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
