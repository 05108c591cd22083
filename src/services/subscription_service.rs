//! Plans and agent subscriptions.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{NewPlan, NewSubscription, SubscriptionPlan, SubscriptionView};
use crate::errors::{AppResult, OptionExt};
use crate::infra::UnitOfWork;

#[async_trait]
pub trait SubscriptionService: Send + Sync {
    async fn create_plan(&self, plan: NewPlan) -> AppResult<SubscriptionPlan>;

    async fn list_plans(&self) -> AppResult<Vec<SubscriptionPlan>>;

    /// Replace the agent's current subscription with a fresh period of `plan_id`.
    async fn subscribe(&self, agent_id: Uuid, plan_id: Uuid) -> AppResult<SubscriptionView>;

    async fn current(&self, agent_id: Uuid) -> AppResult<SubscriptionView>;
}

pub struct SubscriptionManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> SubscriptionManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> SubscriptionService for SubscriptionManager<U> {
    async fn create_plan(&self, plan: NewPlan) -> AppResult<SubscriptionPlan> {
        let plan = self.uow.subscriptions().create_plan(plan).await?;
        tracing::info!(plan_id = %plan.id, name = %plan.name, "Subscription plan created");
        Ok(plan)
    }

    async fn list_plans(&self) -> AppResult<Vec<SubscriptionPlan>> {
        self.uow.subscriptions().list_active_plans().await
    }

    async fn subscribe(&self, agent_id: Uuid, plan_id: Uuid) -> AppResult<SubscriptionView> {
        let subscriptions = self.uow.subscriptions();
        let plan = subscriptions
            .find_plan(plan_id)
            .await?
            .filter(|plan| plan.is_active)
            .ok_or_not_found("Subscription plan")?;

        let (subscription, replaced) = subscriptions
            .replace_active(NewSubscription::starting(agent_id, &plan, Utc::now()))
            .await?;

        tracing::info!(
            agent_id = %agent_id,
            plan_id = %plan.id,
            replaced,
            end_date = %subscription.end_date,
            "Agent subscribed"
        );
        Ok(SubscriptionView { subscription, plan })
    }

    async fn current(&self, agent_id: Uuid) -> AppResult<SubscriptionView> {
        let subscriptions = self.uow.subscriptions();
        let subscription = subscriptions
            .find_current(agent_id, Utc::now())
            .await?
            .ok_or_not_found("Active subscription")?;
        let plan = subscriptions
            .find_plan(subscription.plan_id)
            .await?
            .ok_or_not_found("Subscription plan")?;
        Ok(SubscriptionView { subscription, plan })
    }
}
