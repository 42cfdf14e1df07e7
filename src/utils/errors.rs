/*!
 * Error Handling
 *
 * Defines application-wide error types and conversion implementations
 * for proper error handling and HTTP response mapping. Business errors
 * are values, not exceptions: handlers and services return `AppError`
 * and the top-level `IntoResponse` impl maps them to the wire envelope
 * `{ "error": "<human message>", "code": "<symbol>" }`.
 */

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Application result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types. Each variant maps to exactly one HTTP status
/// and error code per the error handling design.
#[derive(Debug)]
pub enum AppError {
    /// Request body or query failed validation
    Validation(String),
    /// Username/password pair did not match an active account.
    /// Deliberately uniform message — never discloses which half was wrong
    /// or whether the account exists.
    InvalidCredentials,
    /// Account is locked out after too many failed attempts
    AccountLocked,
    /// Bearer token signature/claims are malformed, wrong algorithm, or revoked
    TokenInvalid,
    /// Bearer token is well-formed but past its expiry
    TokenExpired,
    /// Authenticated but not allowed to perform this action
    PermissionDenied,
    /// Resource does not exist
    NotFound(String),
    /// Resource already exists / state conflict
    Conflict(String),
    /// Order status transition not allowed from the current state
    IllegalStateTransition(String),
    /// Not enough stock to satisfy the requested quantity
    InsufficientStock,
    /// Cart had no items at checkout time
    EmptyCart,
    /// Caller exceeded the rate limit
    RateLimited,
    /// A required downstream dependency (database, cache) is unavailable
    DependencyUnavailable(String),
    /// Database error, never shown verbatim to the client
    Database(sqlx::Error),
    /// Catch-all for unexpected failures
    Internal(String),
    /// Malformed request (not JSON, oversized body, bad content-type)
    BadRequest(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "Validation error: {}", msg),
            Self::InvalidCredentials => write!(f, "Invalid username or password"),
            Self::AccountLocked => write!(f, "Account is locked, try again later"),
            Self::TokenInvalid => write!(f, "Token is invalid"),
            Self::TokenExpired => write!(f, "Token has expired"),
            Self::PermissionDenied => write!(f, "Permission denied"),
            Self::NotFound(msg) => write!(f, "Not found: {}", msg),
            Self::Conflict(msg) => write!(f, "Conflict: {}", msg),
            Self::IllegalStateTransition(msg) => write!(f, "Illegal state transition: {}", msg),
            Self::InsufficientStock => write!(f, "Insufficient stock"),
            Self::EmptyCart => write!(f, "Cart is empty"),
            Self::RateLimited => write!(f, "Rate limit exceeded"),
            Self::DependencyUnavailable(msg) => write!(f, "Dependency unavailable: {}", msg),
            Self::Database(err) => write!(f, "Database error: {}", err),
            Self::Internal(msg) => write!(f, "Internal server error: {}", msg),
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound("resource not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::Conflict("resource already exists".to_string())
            }
            _ => Self::Database(err),
        }
    }
}

/// Verification/signing failures from the JWT layer. Callers that need to
/// distinguish expired-vs-invalid should inspect the token error directly
/// rather than rely on this blanket conversion, which is used only for
/// unexpected encoding failures (e.g. during token minting).
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        tracing::warn!("JWT error: {:?}", err);
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::TokenExpired,
            _ => Self::TokenInvalid,
        }
    }
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(err: argon2::password_hash::Error) -> Self {
        tracing::error!("Password hash error: {:?}", err);
        Self::Internal(format!("password hashing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            Self::AccountLocked => (StatusCode::LOCKED, "ACCOUNT_LOCKED"),
            Self::TokenInvalid => (StatusCode::UNAUTHORIZED, "TOKEN_INVALID"),
            Self::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            Self::PermissionDenied => (StatusCode::FORBIDDEN, "PERMISSION_DENIED"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::IllegalStateTransition(_) => (StatusCode::CONFLICT, "ILLEGAL_STATE_TRANSITION"),
            Self::InsufficientStock => (StatusCode::CONFLICT, "INSUFFICIENT_STOCK"),
            Self::EmptyCart => (StatusCode::CONFLICT, "EMPTY_CART"),
            Self::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            Self::DependencyUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "DEPENDENCY_UNAVAILABLE")
            }
            Self::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Database(_) => "an internal database error occurred".to_string(),
            Self::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                "an internal server error occurred".to_string()
            }
            other => other.to_string(),
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error_code = code, "request failed with internal error");
        }

        let body = Json(json!({
            "error": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::InvalidCredentials;
        assert_eq!(err.to_string(), "Invalid username or password");

        let err = AppError::NotFound("user not found".to_string());
        assert_eq!(err.to_string(), "Not found: user not found");
    }

    #[test]
    fn test_app_error_from_sqlx_row_not_found() {
        let sqlx_err = sqlx::Error::RowNotFound;
        let app_err: AppError = sqlx_err.into();
        match app_err {
            AppError::NotFound(_) => (),
            _ => panic!("expected NotFound error"),
        }
    }

    #[test]
    fn test_account_locked_is_423() {
        let err = AppError::AccountLocked;
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::LOCKED);
        assert_eq!(code, "ACCOUNT_LOCKED");
    }

    #[test]
    fn test_token_invalid_vs_expired_distinct() {
        assert_ne!(
            AppError::TokenInvalid.status_and_code().1,
            AppError::TokenExpired.status_and_code().1
        );
    }
}
