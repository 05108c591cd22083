//! HTTP surface under `/api`.
//!
//! Handlers stay thin: they extract, call one service and shape the JSON.
//! Authentication, role guards and rate limiting live in `middleware`;
//! `routes` decides which guard wraps which group of handlers.

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use routes::create_router;
pub use state::AppState;
