//! HTTP request handlers, grouped by resource.
//!
//! Each module hands out routers split by who may call them; `routes`
//! decides which guards wrap which group.

pub mod auth_handler;
pub mod image_handler;
pub mod property_handler;
pub mod review_handler;
pub mod subscription_handler;
