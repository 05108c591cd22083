//! Subscription plans and agent subscriptions, including the quota counter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use super::entities::{
    agent_subscription::{self, Entity as AgentSubscriptionEntity},
    subscription_plan::{self, Entity as PlanEntity},
};
use crate::domain::{AgentSubscription, NewPlan, NewSubscription, SubscriptionPlan};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Duplicate plan names are a `Conflict`.
    async fn create_plan(&self, plan: NewPlan) -> AppResult<SubscriptionPlan>;

    async fn find_plan(&self, id: Uuid) -> AppResult<Option<SubscriptionPlan>>;

    /// Plans open for subscription, cheapest first.
    async fn list_active_plans(&self) -> AppResult<Vec<SubscriptionPlan>>;

    /// The agent's active subscription whose period has not ended at `now`.
    async fn find_current(
        &self,
        agent_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<AgentSubscription>>;

    /// Deactivate the agent's active subscriptions and insert the new one in a
    /// single transaction. Returns the new row and how many rows were replaced.
    async fn replace_active(
        &self,
        subscription: NewSubscription,
    ) -> AppResult<(AgentSubscription, u64)>;

    /// Conditionally bump `properties_posted` while it is below `max_properties`
    /// and the subscription is still current. True when a slot was taken.
    async fn reserve_slot(
        &self,
        subscription_id: Uuid,
        max_properties: i32,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Give back a slot taken by `reserve_slot`. Never drops below zero.
    async fn release_slot(&self, subscription_id: Uuid) -> AppResult<()>;
}

pub struct SubscriptionStore {
    db: DatabaseConnection,
}

impl SubscriptionStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SubscriptionRepository for SubscriptionStore {
    async fn create_plan(&self, plan: NewPlan) -> AppResult<SubscriptionPlan> {
        let now = Utc::now();
        let active_model = subscription_plan::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(plan.name.trim().to_string()),
            price: Set(plan.price),
            duration_days: Set(plan.duration_days),
            max_properties: Set(plan.max_properties),
            features: Set(plan.features),
            is_active: Set(plan.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| AppError::from_db_unique(e, "Plan name already exists"))?;
        Ok(SubscriptionPlan::from(model))
    }

    async fn find_plan(&self, id: Uuid) -> AppResult<Option<SubscriptionPlan>> {
        let result = PlanEntity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(SubscriptionPlan::from))
    }

    async fn list_active_plans(&self) -> AppResult<Vec<SubscriptionPlan>> {
        let models = PlanEntity::find()
            .filter(subscription_plan::Column::IsActive.eq(true))
            .order_by_asc(subscription_plan::Column::Price)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(SubscriptionPlan::from).collect())
    }

    async fn find_current(
        &self,
        agent_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<AgentSubscription>> {
        let result = AgentSubscriptionEntity::find()
            .filter(agent_subscription::Column::AgentId.eq(agent_id))
            .filter(agent_subscription::Column::IsActive.eq(true))
            .filter(agent_subscription::Column::EndDate.gt(now))
            .order_by_desc(agent_subscription::Column::StartDate)
            .one(&self.db)
            .await?;
        Ok(result.map(AgentSubscription::from))
    }

    async fn replace_active(
        &self,
        subscription: NewSubscription,
    ) -> AppResult<(AgentSubscription, u64)> {
        // Dropping the transaction on an early return rolls it back.
        let txn = self.db.begin().await?;
        let replaced = deactivate_for_agent(&txn, subscription.agent_id).await?;
        let created = insert_subscription(&txn, subscription).await?;
        txn.commit().await?;
        Ok((created, replaced))
    }

    async fn reserve_slot(
        &self,
        subscription_id: Uuid,
        max_properties: i32,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = AgentSubscriptionEntity::update_many()
            .col_expr(
                agent_subscription::Column::PropertiesPosted,
                Expr::col(agent_subscription::Column::PropertiesPosted).add(1),
            )
            .col_expr(agent_subscription::Column::UpdatedAt, Expr::value(now))
            .filter(agent_subscription::Column::Id.eq(subscription_id))
            .filter(agent_subscription::Column::IsActive.eq(true))
            .filter(agent_subscription::Column::EndDate.gt(now))
            .filter(agent_subscription::Column::PropertiesPosted.lt(max_properties))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn release_slot(&self, subscription_id: Uuid) -> AppResult<()> {
        AgentSubscriptionEntity::update_many()
            .col_expr(
                agent_subscription::Column::PropertiesPosted,
                Expr::col(agent_subscription::Column::PropertiesPosted).sub(1),
            )
            .col_expr(agent_subscription::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(agent_subscription::Column::Id.eq(subscription_id))
            .filter(agent_subscription::Column::PropertiesPosted.gt(0))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}

async fn deactivate_for_agent<C: ConnectionTrait>(conn: &C, agent_id: Uuid) -> AppResult<u64> {
    let result = AgentSubscriptionEntity::update_many()
        .col_expr(agent_subscription::Column::IsActive, Expr::value(false))
        .col_expr(agent_subscription::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(agent_subscription::Column::AgentId.eq(agent_id))
        .filter(agent_subscription::Column::IsActive.eq(true))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

async fn insert_subscription<C: ConnectionTrait>(
    conn: &C,
    subscription: NewSubscription,
) -> AppResult<AgentSubscription> {
    let now = Utc::now();
    let active_model = agent_subscription::ActiveModel {
        id: Set(Uuid::new_v4()),
        agent_id: Set(subscription.agent_id),
        plan_id: Set(subscription.plan_id),
        start_date: Set(subscription.start_date),
        end_date: Set(subscription.end_date),
        is_active: Set(true),
        properties_posted: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    };

    // A concurrent subscribe for the same agent trips the partial unique index.
    let model = active_model.insert(conn).await.map_err(|e| {
        AppError::from_db_unique(e, "A subscription change is already in progress")
    })?;
    Ok(AgentSubscription::from(model))
}
