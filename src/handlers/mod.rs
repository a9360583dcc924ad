pub mod auth;
pub mod data;

use axum::{extract::State, response::Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - service banner
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": state.settings.app_title,
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.settings.app_env,
    }))
}

/// GET /health - liveness probe, public
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "time": Utc::now().to_rfc3339(),
    }))
}
