//! Estate Market - a real-estate listing marketplace API.
//!
//! Agents post listings while their subscription has quota left, buyers
//! browse, save and review them, and each review refreshes the listing's
//! rating.
//!
//! # Layers
//!
//! - **api**: routes, guards, extractors and handlers
//! - **services**: listing orchestration, quota, ratings, reviews, accounts
//! - **domain**: entities, drafts, patches and validation rules
//! - **infra**: Postgres stores, Redis, object storage, image normalization
//! - **jobs**: the account email queue
//! - **cli** / **commands**: `serve`, `migrate`, `jobs`
//!
//! ```bash
//! estate-market migrate up
//! estate-market serve --port 3000
//! estate-market jobs work
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod jobs;
pub mod services;
pub mod types;

pub use api::AppState;
pub use config::Config;
pub use domain::{Password, User, UserRole};
pub use errors::{AppError, AppResult};
pub use infra::Cache;
