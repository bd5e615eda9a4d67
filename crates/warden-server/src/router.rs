//! Router configuration.
//!
//! This module creates the main Axum router that combines the console
//! API, the account API, the HTML pages, and the health endpoints.

use axum::{
    http::{HeaderValue, StatusCode},
    middleware,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use warden_console::events::AuditLogger;
use warden_console::{
    account_public_router, account_router, auth_middleware, directory_router, require_admin,
};
use warden_provider::account::AccountProvider;
use warden_provider::directory::DirectoryProvider;

use crate::config::ServerConfig;
use crate::state::AppState;
use crate::ui;

/// Creates the main application router.
pub fn create_router<D, A, L>(state: AppState<D, A, L>) -> Router
where
    D: DirectoryProvider + 'static,
    A: AccountProvider + 'static,
    L: AuditLogger + 'static,
{
    let console_state = state.console.clone();

    // Directory routes: authenticated and admin-gated.
    let directory = directory_router()
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(
            console_state.clone(),
            auth_middleware::<D, A, L>,
        ))
        .with_state(console_state.clone());

    // Account routes: authenticated, no admin role required.
    let account = account_router()
        .layer(middleware::from_fn_with_state(
            console_state.clone(),
            auth_middleware::<D, A, L>,
        ))
        .with_state(console_state.clone());

    // Sign-up and sign-in stay reachable without a session.
    let account_public = account_public_router().with_state(console_state);

    let health = Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness_check))
        .route("/health/ready", get(readiness_check));

    let pages = ui::ui_router().with_state(state.clone());

    let cors = cors_layer(&state.config);

    Router::new()
        .merge(directory)
        .merge(account)
        .merge(account_public)
        .merge(health)
        .merge(pages)
        .route("/", get(root))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Builds the CORS layer from the configured origins.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    if config.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

#[derive(Serialize)]
struct ServerInfo {
    name: &'static str,
    version: &'static str,
}

/// GET / - Server identification.
async fn root() -> Json<ServerInfo> {
    Json(ServerInfo {
        name: "warden",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
}

/// GET /health - Overall health.
async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus { status: "ok" })
}

/// GET /health/live - Liveness probe.
async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready - Readiness probe.
async fn readiness_check() -> StatusCode {
    StatusCode::OK
}
