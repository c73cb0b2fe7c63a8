//! API error types and handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application error type
///
/// Authorization rejections carry a typed reason; the transport mapping
/// below is the only place status codes are assigned.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // Authorization gate rejections
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Access token required")]
    AccessTokenRequired,
    #[error("Refresh token required")]
    RefreshTokenRequired,
    #[error("Account not verified")]
    AccountNotVerified,
    #[error("Account suspended")]
    AccountSuspended,
    #[error("Insufficient permission")]
    InsufficientPermission,

    // Authentication
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("User not found")]
    UserNotFound,
    #[error("Email already registered")]
    EmailAlreadyExists,
    #[error("Username already taken")]
    UsernameAlreadyExists,

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),

    // Resource errors
    #[error("Resource not found")]
    NotFound,
    #[error("Resource already exists")]
    Conflict(String),

    // Internal errors
    #[error("Database error: {0}")]
    Database(String),
    #[error("Internal server error")]
    Internal,
    #[error("Service unavailable")]
    ServiceUnavailable,
}

impl ApiError {
    /// Transport status for this error kind.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotAuthenticated => StatusCode::FORBIDDEN,
            ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::AccessTokenRequired => StatusCode::UNAUTHORIZED,
            ApiError::RefreshTokenRequired => StatusCode::FORBIDDEN,
            ApiError::AccountNotVerified => StatusCode::FORBIDDEN,
            ApiError::AccountSuspended => StatusCode::UNAUTHORIZED,
            ApiError::InsufficientPermission => StatusCode::FORBIDDEN,
            ApiError::InvalidCredentials => StatusCode::BAD_REQUEST,
            ApiError::UserNotFound => StatusCode::NOT_FOUND,
            ApiError::EmailAlreadyExists => StatusCode::CONFLICT,
            ApiError::UsernameAlreadyExists => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::NotAuthenticated => "NOT_AUTHENTICATED",
            ApiError::InvalidToken => "INVALID_TOKEN",
            ApiError::AccessTokenRequired => "ACCESS_TOKEN_REQUIRED",
            ApiError::RefreshTokenRequired => "REFRESH_TOKEN_REQUIRED",
            ApiError::AccountNotVerified => "ACCOUNT_NOT_VERIFIED",
            ApiError::AccountSuspended => "ACCOUNT_SUSPENDED",
            ApiError::InsufficientPermission => "INSUFFICIENT_PERMISSION",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::UserNotFound => "USER_NOT_FOUND",
            ApiError::EmailAlreadyExists => "EMAIL_EXISTS",
            ApiError::UsernameAlreadyExists => "USERNAME_EXISTS",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::NotFound => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Database(_) => "DATABASE_ERROR",
            ApiError::Internal => "INTERNAL_ERROR",
            ApiError::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            // Never leak database details to clients
            ApiError::Database(_) => "Database error".to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message,
            }
        }));

        (self.status_code(), body).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound,
            sqlx::Error::Database(db_err) => {
                if let Some(code) = db_err.code() {
                    // PostgreSQL unique violation
                    if code == "23505" {
                        return ApiError::Conflict("Resource already exists".to_string());
                    }
                    // Foreign key violation
                    if code == "23503" {
                        return ApiError::BadRequest(
                            "Referenced resource does not exist".to_string(),
                        );
                    }
                }
                ApiError::Database(db_err.to_string())
            }
            _ => ApiError::Database(err.to_string()),
        }
    }
}

impl From<crate::auth::TokenError> for ApiError {
    fn from(err: crate::auth::TokenError) -> Self {
        use crate::auth::TokenError;
        match err {
            TokenError::Encoding(msg) => {
                tracing::error!("Token encoding error: {}", msg);
                ApiError::Internal
            }
            _ => ApiError::InvalidToken,
        }
    }
}

impl From<redis::RedisError> for ApiError {
    fn from(err: redis::RedisError) -> Self {
        // Fail closed: if the revocation store cannot be reached we cannot
        // confirm a token is live, so the request is rejected with a 5xx.
        tracing::error!("Revocation store error: {:?}", err);
        ApiError::ServiceUnavailable
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_rejection_status_mapping() {
        assert_eq!(ApiError::NotAuthenticated.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::AccessTokenRequired.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::RefreshTokenRequired.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::AccountNotVerified.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::AccountSuspended.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::InsufficientPermission.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::InvalidCredentials.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::UserNotFound.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_revocation_store_failure_is_5xx() {
        assert_eq!(
            ApiError::ServiceUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
