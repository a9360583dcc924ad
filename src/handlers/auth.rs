use axum::extract::Extension;

use crate::auth::Identity;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/auth/whoami - the caller's identity as the auth gate saw it
pub async fn whoami_get(Extension(identity): Extension<Identity>) -> ApiResult<Identity> {
    Ok(ApiResponse::success(identity))
}
