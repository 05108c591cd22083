//! Subscription plan database entity.

use sea_orm::entity::prelude::*;

use crate::domain::SubscriptionPlan;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "subscription_plans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub price: f64,
    pub duration_days: i32,
    pub max_properties: i32,
    pub features: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for SubscriptionPlan {
    fn from(model: Model) -> Self {
        SubscriptionPlan {
            id: model.id,
            name: model.name,
            price: model.price,
            duration_days: model.duration_days,
            max_properties: model.max_properties,
            features: model.features,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
