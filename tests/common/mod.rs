use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;

use pulseboard_api::auth::{AuthService, Claims};
use pulseboard_api::cache::{CachedRepository, MemoryStore};
use pulseboard_api::config::Settings;
use pulseboard_api::datasource::DataRepository;
use pulseboard_api::state::AppState;

/// Settings for tests: no env files, given overrides, test JWT secret.
pub fn test_settings(overrides: &[(&str, &str)]) -> Settings {
    let mut env: HashMap<String, String> = overrides
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    env.entry("JWT_SECRET".to_string())
        .or_insert_with(|| "test-secret".to_string());
    Settings::resolve(Path::new("/nonexistent"), &env).expect("test settings")
}

/// Build the full application router with an in-memory cache store.
pub fn build_app(settings: Settings) -> Router {
    let settings = Arc::new(settings);
    let repository = DataRepository::from_settings(&settings).expect("repository");
    let data = CachedRepository::new(
        repository,
        Arc::new(MemoryStore::new()),
        settings.cache_timeout_seconds,
    );
    let auth = AuthService::new(&settings);
    pulseboard_api::app(AppState {
        settings,
        auth: Arc::new(auth),
        data: Arc::new(data),
    })
}

pub fn claims(role: Option<&str>, team: Option<&str>, expires_in: i64) -> Claims {
    Claims {
        sub: "alice@corp".to_string(),
        name: Some("Alice".to_string()),
        role: role.map(str::to_string),
        team: team.map(str::to_string),
        exp: Utc::now().timestamp() + expires_in,
    }
}

pub fn token_for(settings: &Settings, claims: &Claims) -> String {
    AuthService::new(settings).issue(claims).expect("token")
}

/// Issue a GET and decode the JSON body (Null when the body is not JSON).
pub async fn get_json(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = builder.body(Body::empty()).expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}
