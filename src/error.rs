// HTTP API error types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::auth::AuthError;
use crate::datasource::DataSourceError;

/// HTTP API error with appropriate status codes and client-friendly
/// messages. Backend details never appear in the response body; the real
/// error is logged at the conversion site.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (upstream data service issues)
    BadGateway(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::BadGateway(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::BadGateway(_) => "BAD_GATEWAY",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code(),
        })
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

impl From<DataSourceError> for ApiError {
    fn from(err: DataSourceError) -> Self {
        match err {
            DataSourceError::Unreachable(detail) => {
                tracing::error!("REST backend unreachable: {detail}");
                ApiError::BadGateway("Upstream data service is unreachable".to_string())
            }
            DataSourceError::BadResponse(detail) => {
                tracing::error!("REST backend returned a bad response: {detail}");
                ApiError::BadGateway(
                    "Upstream data service returned an invalid response".to_string(),
                )
            }
            DataSourceError::ConnectionFailed(detail) => {
                tracing::error!("database connection failed: {detail}");
                ApiError::ServiceUnavailable("Database temporarily unavailable".to_string())
            }
            DataSourceError::QueryFailed(detail) => {
                // Don't expose internal SQL errors to clients.
                tracing::error!("database query failed: {detail}");
                ApiError::InternalServerError(
                    "An error occurred while fetching data".to_string(),
                )
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_source_errors_map_without_leaking_details() {
        let err: ApiError =
            DataSourceError::QueryFailed("password authentication failed for user".to_string())
                .into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message().contains("password"));

        let err: ApiError =
            DataSourceError::ConnectionFailed("db.internal:5432 refused".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!err.message().contains("5432"));

        let err: ApiError = DataSourceError::Unreachable("10.0.0.3 timed out".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(!err.message().contains("10.0.0.3"));
    }

    #[test]
    fn auth_errors_are_unauthorized() {
        let err: ApiError = AuthError::Expired.into();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }
}
