use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::state::AppState;

/// Auth gate in front of every `/api/*` route.
///
/// Validates the bearer token (or bypasses when `DISABLE_AUTH` is set) and
/// injects the resulting `Identity` as a request extension for handlers.
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let context = state.auth.authenticate(authorization)?;
    if context.is_bypassed() {
        tracing::debug!("authentication bypassed (DISABLE_AUTH)");
    }

    request.extensions_mut().insert(context.identity().clone());
    Ok(next.run(request).await)
}
