/*!
 * Authentication Middleware
 *
 * Validates the `Authorization: Bearer <token>` header,
 * checks the session blacklist, loads the current `User` snapshot, and
 * attaches both the raw claims and an `AuthUser` to the request
 * extensions for downstream handlers/extractors. Per-route permission
 * checks (step 10) are then a one-line call to
 * `services::authorization::ensure_permission` at the top of each handler.
 */

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::models::{AuthUser, User};
use crate::services::jwt_service::Claims;
use crate::state::AppState;
use crate::utils::{AppError, Result};

fn extract_bearer_token(req: &Request<Body>) -> Result<&str> {
    let header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match header {
        Some(h) if h.starts_with("Bearer ") => Ok(&h[7..]),
        _ => Err(AppError::TokenInvalid),
    }
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> std::result::Result<Response, AppError> {
    let token = extract_bearer_token(&req)?;
    let claims: Claims = state.jwt_service.validate_access_token(token)?;

    if state.session_blacklist.is_blacklisted(&claims.session_id) {
        return Err(AppError::TokenInvalid);
    }

    let user_id = uuid::Uuid::parse_str(&claims.sub).map_err(|_| AppError::TokenInvalid)?;
    let user = User::find_by_id(&state.pool, &user_id).await?;

    if !user.is_active {
        return Err(AppError::PermissionDenied);
    }
    if user.is_locked() {
        return Err(AppError::AccountLocked);
    }

    req.extensions_mut().insert(AuthUser {
        user_id: user.id,
        role: user.role,
    });
    req.extensions_mut().insert(user);
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token_missing_header() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert!(matches!(extract_bearer_token(&req), Err(AppError::TokenInvalid)));
    }

    #[test]
    fn test_extract_bearer_token_rejects_non_bearer_scheme() {
        let req = Request::builder()
            .uri("/")
            .header("authorization", "Basic deadbeef")
            .body(Body::empty())
            .unwrap();
        assert!(matches!(extract_bearer_token(&req), Err(AppError::TokenInvalid)));
    }

    #[test]
    fn test_extract_bearer_token_success() {
        let req = Request::builder()
            .uri("/")
            .header("authorization", "Bearer abc.def.ghi")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_bearer_token(&req).unwrap(), "abc.def.ghi");
    }
}
