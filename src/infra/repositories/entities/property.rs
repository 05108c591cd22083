//! Property database entity.

use sea_orm::entity::prelude::*;

use crate::domain::{ListingStatus, Property, PropertyDetails, PropertyType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "properties")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub price: f64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area: f64,
    pub property_type: String,
    pub status: String,
    pub owner_id: Uuid,
    pub location_id: Uuid,
    pub images: Vec<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub details: Json,
    pub amenities: Vec<String>,
    pub views: i64,
    pub average_rating: f64,
    pub total_reviews: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Property {
    fn from(model: Model) -> Self {
        // Unknown keys in older rows are ignored rather than failing the read.
        let details: PropertyDetails = serde_json::from_value(model.details).unwrap_or_default();

        Property {
            id: model.id,
            title: model.title,
            description: model.description,
            price: model.price,
            bedrooms: model.bedrooms,
            bathrooms: model.bathrooms,
            area: model.area,
            property_type: PropertyType::from(model.property_type.as_str()),
            status: ListingStatus::from(model.status.as_str()),
            owner_id: model.owner_id,
            location_id: model.location_id,
            images: model.images,
            details,
            amenities: model.amenities,
            views: model.views,
            average_rating: model.average_rating,
            total_reviews: model.total_reviews,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
