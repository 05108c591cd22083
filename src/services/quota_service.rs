//! Quota engine: may this agent post another listing under their subscription?

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::{AppResult, QuotaError};
use crate::infra::UnitOfWork;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// A slot taken from an agent's subscription. Hand it back with
/// [`QuotaService::release`] if the listing is never written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaReservation {
    pub subscription_id: Uuid,
    pub agent_id: Uuid,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait QuotaService: Send + Sync {
    /// Check the agent's current subscription and atomically take one slot.
    ///
    /// Fails with `NoActiveSubscription` or `QuotaExceeded` (both `Forbidden`).
    async fn authorize_and_reserve(&self, agent_id: Uuid) -> AppResult<QuotaReservation>;

    async fn release(&self, reservation: QuotaReservation) -> AppResult<()>;
}

pub struct QuotaEngine<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> QuotaEngine<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> QuotaService for QuotaEngine<U> {
    async fn authorize_and_reserve(&self, agent_id: Uuid) -> AppResult<QuotaReservation> {
        let now = Utc::now();
        let subscriptions = self.uow.subscriptions();

        let subscription = subscriptions
            .find_current(agent_id, now)
            .await?
            .ok_or(QuotaError::NoActiveSubscription)?;
        let plan = subscriptions
            .find_plan(subscription.plan_id)
            .await?
            .ok_or(QuotaError::NoActiveSubscription)?;

        if !subscription.has_capacity(&plan) {
            return Err(QuotaError::QuotaExceeded.into());
        }

        // The counter may have moved since the read; the conditional update decides.
        if !subscriptions
            .reserve_slot(subscription.id, plan.max_properties, now)
            .await?
        {
            tracing::debug!(agent_id = %agent_id, "Quota slot lost to a concurrent listing");
            return Err(QuotaError::QuotaExceeded.into());
        }

        tracing::debug!(
            agent_id = %agent_id,
            subscription_id = %subscription.id,
            posted = subscription.properties_posted + 1,
            max = plan.max_properties,
            "Quota slot reserved"
        );
        Ok(QuotaReservation {
            subscription_id: subscription.id,
            agent_id,
        })
    }

    async fn release(&self, reservation: QuotaReservation) -> AppResult<()> {
        self.uow
            .subscriptions()
            .release_slot(reservation.subscription_id)
            .await?;
        tracing::debug!(
            agent_id = %reservation.agent_id,
            subscription_id = %reservation.subscription_id,
            "Quota slot released"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AgentSubscription, SubscriptionPlan};
    use crate::errors::AppError;
    use crate::infra::{MockSubscriptionRepository, MockUnitOfWork, SubscriptionRepository};
    use chrono::Duration;

    fn plan(max_properties: i32) -> SubscriptionPlan {
        let now = Utc::now();
        SubscriptionPlan {
            id: Uuid::new_v4(),
            name: "Starter".into(),
            price: 10.0,
            duration_days: 30,
            max_properties,
            features: vec![],
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn subscription(agent_id: Uuid, plan: &SubscriptionPlan, posted: i32) -> AgentSubscription {
        let now = Utc::now();
        AgentSubscription {
            id: Uuid::new_v4(),
            agent_id,
            plan_id: plan.id,
            start_date: now - Duration::days(1),
            end_date: now + Duration::days(29),
            is_active: true,
            properties_posted: posted,
            created_at: now,
            updated_at: now,
        }
    }

    fn engine(repo: MockSubscriptionRepository) -> QuotaEngine<MockUnitOfWork> {
        let repo: Arc<dyn SubscriptionRepository> = Arc::new(repo);
        let mut uow = MockUnitOfWork::new();
        uow.expect_subscriptions().returning(move || repo.clone());
        QuotaEngine::new(Arc::new(uow))
    }

    fn repo_with(sub: Option<AgentSubscription>, plan: SubscriptionPlan) -> MockSubscriptionRepository {
        let mut repo = MockSubscriptionRepository::new();
        repo.expect_find_current()
            .returning(move |_, _| Ok(sub.clone()));
        repo.expect_find_plan()
            .returning(move |_| Ok(Some(plan.clone())));
        repo
    }

    #[tokio::test]
    async fn test_no_subscription_is_forbidden() {
        let mut repo = repo_with(None, plan(1));
        repo.expect_reserve_slot().never();

        let err = engine(repo)
            .authorize_and_reserve(Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Quota(QuotaError::NoActiveSubscription)));
        assert_eq!(err.to_string(), "Active subscription required to post properties");
    }

    #[tokio::test]
    async fn test_full_subscription_is_forbidden() {
        let agent = Uuid::new_v4();
        let plan = plan(1);
        let mut repo = repo_with(Some(subscription(agent, &plan, 1)), plan);
        repo.expect_reserve_slot().never();

        let err = engine(repo).authorize_and_reserve(agent).await.unwrap_err();
        assert!(matches!(err, AppError::Quota(QuotaError::QuotaExceeded)));
        assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_reserve_takes_a_slot() {
        let agent = Uuid::new_v4();
        let plan = plan(1);
        let sub = subscription(agent, &plan, 0);
        let sub_id = sub.id;
        let mut repo = repo_with(Some(sub), plan);
        repo.expect_reserve_slot()
            .withf(move |id, max, _| *id == sub_id && *max == 1)
            .times(1)
            .returning(|_, _, _| Ok(true));

        let reservation = engine(repo).authorize_and_reserve(agent).await.unwrap();
        assert_eq!(reservation.subscription_id, sub_id);
        assert_eq!(reservation.agent_id, agent);
    }

    #[tokio::test]
    async fn test_lost_race_is_quota_exceeded() {
        let agent = Uuid::new_v4();
        let plan = plan(1);
        let mut repo = repo_with(Some(subscription(agent, &plan, 0)), plan);
        repo.expect_reserve_slot().returning(|_, _, _| Ok(false));

        let err = engine(repo).authorize_and_reserve(agent).await.unwrap_err();
        assert!(matches!(err, AppError::Quota(QuotaError::QuotaExceeded)));
    }

    #[tokio::test]
    async fn test_release_gives_slot_back() {
        let sub_id = Uuid::new_v4();
        let mut repo = MockSubscriptionRepository::new();
        repo.expect_release_slot()
            .withf(move |id| *id == sub_id)
            .times(1)
            .returning(|_| Ok(()));

        engine(repo)
            .release(QuotaReservation {
                subscription_id: sub_id,
                agent_id: Uuid::new_v4(),
            })
            .await
            .unwrap();
    }
}
