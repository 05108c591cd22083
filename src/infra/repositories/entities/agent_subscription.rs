//! Agent subscription database entity.

use sea_orm::entity::prelude::*;

use crate::domain::AgentSubscription;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "agent_subscriptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub agent_id: Uuid,
    pub plan_id: Uuid,
    pub start_date: DateTimeUtc,
    pub end_date: DateTimeUtc,
    pub is_active: bool,
    pub properties_posted: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for AgentSubscription {
    fn from(model: Model) -> Self {
        AgentSubscription {
            id: model.id,
            agent_id: model.agent_id,
            plan_id: model.plan_id,
            start_date: model.start_date,
            end_date: model.end_date,
            is_active: model.is_active,
            properties_posted: model.properties_posted,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
