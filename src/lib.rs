pub mod auth;
pub mod cache;
pub mod config;
pub mod datasource;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{middleware::from_fn_with_state, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use state::AppState;

/// Assemble the application router. Public routes stay outside the auth
/// gate; everything under `/api` passes through it.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/data", get(handlers::data::data_get))
        .route("/api/summary", get(handlers::data::summary_get))
        .route("/api/auth/whoami", get(handlers::auth::whoami_get))
        .route_layer(from_fn_with_state(state.clone(), middleware::auth_middleware));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .merge(api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
