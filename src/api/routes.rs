//! Application route configuration.

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    auth_handler, image_handler, property_handler, review_handler, subscription_handler,
};
use super::middleware::{
    auth_middleware, rate_limit_auth_middleware, rate_limit_middleware, require_admin,
    require_agent, require_lister,
};
use super::openapi::ApiDoc;
use super::AppState;
use crate::config::MAX_UPLOAD_BODY_BYTES;

/// Create the application router with all routes configured
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_routes(&state))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Everything under `/api`.
///
/// Guards are applied per group with `route_layer`; the last layer added
/// runs first, so authentication always wraps the role checks.
fn api_routes(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .merge(property_handler::public_routes())
        .merge(review_handler::public_routes())
        .merge(subscription_handler::public_routes());

    let signed_in = Router::new()
        .merge(auth_handler::account_routes())
        .merge(property_handler::saved_routes())
        .merge(review_handler::author_routes());

    let listers = Router::new()
        .merge(property_handler::listing_routes())
        .merge(image_handler::routes())
        .route_layer(middleware::from_fn(require_lister));

    let agents =
        subscription_handler::agent_routes().route_layer(middleware::from_fn(require_agent));

    let admins =
        subscription_handler::admin_routes().route_layer(middleware::from_fn(require_admin));

    let protected = Router::new()
        .merge(signed_in)
        .merge(listers)
        .merge(agents)
        .merge(admins)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let general = public
        .merge(protected)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    let auth = auth_handler::auth_routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        rate_limit_auth_middleware,
    ));

    general.merge(auth)
}

async fn root() -> &'static str {
    "Estate Market API"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    services: ServiceHealth,
}

#[derive(Serialize)]
struct ServiceHealth {
    database: ServiceStatus,
    redis: ServiceStatus,
}

#[derive(Serialize)]
struct ServiceStatus {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ServiceStatus {
    fn healthy() -> Self {
        Self {
            status: "healthy",
            error: None,
        }
    }

    fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            status: "unhealthy",
            error: Some(error.into()),
        }
    }

    fn unconfigured() -> Self {
        Self {
            status: "unconfigured",
            error: None,
        }
    }
}

/// Database and Redis connectivity. Missing backends are reported as
/// `unconfigured` and do not degrade the overall status.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match &state.database {
        Some(db) => match db.ping().await {
            Ok(()) => ServiceStatus::healthy(),
            Err(e) => ServiceStatus::unhealthy(e.to_string()),
        },
        None => ServiceStatus::unconfigured(),
    };

    let redis = match &state.cache {
        Some(cache) if cache.ping().await => ServiceStatus::healthy(),
        Some(_) => ServiceStatus::unhealthy("Redis did not answer PING"),
        None => ServiceStatus::unconfigured(),
    };

    let degraded = [&database, &redis]
        .iter()
        .any(|s| s.error.is_some());

    let code = if degraded {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        code,
        Json(HealthResponse {
            status: if degraded { "degraded" } else { "healthy" },
            services: ServiceHealth { database, redis },
        }),
    )
}
