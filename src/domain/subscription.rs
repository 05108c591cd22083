//! Subscription plans and the agent subscriptions that gate posting.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// A purchasable plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionPlan {
    pub id: Uuid,
    #[schema(example = "Premium")]
    pub name: String,
    #[schema(example = 49.99)]
    pub price: f64,
    /// Length of one subscription period in days
    #[schema(example = 30)]
    pub duration_days: i32,
    /// Listings an agent may post per period
    #[schema(example = 25)]
    pub max_properties: i32,
    pub features: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin request to create a plan.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewPlan {
    #[validate(length(min = 1, max = 100, message = "Plan name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,
    #[validate(range(min = 1, message = "Duration must be at least one day"))]
    pub duration_days: i32,
    #[validate(range(min = 0, message = "Property limit cannot be negative"))]
    pub max_properties: i32,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Links an agent to a plan for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AgentSubscription {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub plan_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub properties_posted: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AgentSubscription {
    /// Active and not yet expired.
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.end_date > now
    }

    pub fn has_capacity(&self, plan: &SubscriptionPlan) -> bool {
        self.properties_posted < plan.max_properties
    }
}

/// Subscription row to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubscription {
    pub agent_id: Uuid,
    pub plan_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl NewSubscription {
    /// Period starting at `start` and lasting the plan's duration.
    pub fn starting(agent_id: Uuid, plan: &SubscriptionPlan, start: DateTime<Utc>) -> Self {
        Self {
            agent_id,
            plan_id: plan.id,
            start_date: start,
            end_date: start + Duration::days(i64::from(plan.duration_days)),
        }
    }
}

/// Subscription returned to its agent, with the plan attached.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub subscription: AgentSubscription,
    pub plan: SubscriptionPlan,
}
