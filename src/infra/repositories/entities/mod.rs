//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.

pub mod agent_subscription;
pub mod location;
pub mod property;
pub mod review;
pub mod subscription_plan;
pub mod user;
