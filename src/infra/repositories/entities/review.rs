//! Review database entity.

use sea_orm::entity::prelude::*;

use crate::domain::Review;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub property_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub comment: String,
    pub likes: Vec<Uuid>,
    pub is_verified_stay: bool,
    pub images: Vec<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Review {
    fn from(model: Model) -> Self {
        Review {
            id: model.id,
            property_id: model.property_id,
            user_id: model.user_id,
            rating: model.rating,
            title: model.title,
            comment: model.comment,
            likes: model.likes,
            is_verified_stay: model.is_verified_stay,
            images: model.images,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
