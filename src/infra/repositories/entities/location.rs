//! Location database entity.

use sea_orm::entity::prelude::*;

use crate::domain::Location;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "locations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub country: String,
    pub province: String,
    pub city: String,
    pub district: Option<String>,
    pub street: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Location {
    fn from(model: Model) -> Self {
        Location {
            id: model.id,
            country: model.country,
            province: model.province,
            city: model.city,
            district: model.district,
            street: model.street,
            latitude: model.latitude,
            longitude: model.longitude,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
