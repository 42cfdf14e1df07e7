/*!
 * Authentication Handlers
 *
 * Login/refresh/logout/change-password. `AppState` lives in
 * `crate::state`, not here — see DESIGN.md for why.
 */

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde::Serialize;

use crate::models::{AuditAction, AuditLog, CreateAuditLog, EntityType, RequestContext, User};
use crate::services::{ChangePasswordRequest, LoginRequest, LoginResponse, TokenPair};
use crate::state::AppState;
use crate::utils::{AppError, Result};

pub async fn login(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let username = req.username.clone();
    let result = state.auth_service.login(&state.pool, req).await;

    let (action, user_id) = match &result {
        Ok(resp) => (AuditAction::Login, Some(resp.user.id)),
        Err(_) => (AuditAction::Login, None),
    };

    let _ = AuditLog::create(
        &state.pool,
        CreateAuditLog {
            user_id,
            action,
            entity_type: EntityType::User,
            entity_id: Some(username),
            changes: None,
            ip_address: ctx.ip_address.clone(),
            user_agent: ctx.user_agent.clone(),
            request_id: Some(ctx.request_id),
        },
    )
    .await;

    Ok(Json(result?))
}

#[derive(Debug, serde::Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenPair>> {
    let tokens = state
        .auth_service
        .refresh(&state.pool, &state.session_blacklist, &req.refresh_token)
        .await?;
    Ok(Json(tokens))
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Extension(ctx): Extension<RequestContext>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse> {
    let access_token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AppError::TokenInvalid)?;

    state.auth_service.logout(&state.session_blacklist, access_token)?;

    let _ = AuditLog::create(
        &state.pool,
        CreateAuditLog {
            user_id: Some(user.id),
            action: AuditAction::Logout,
            entity_type: EntityType::User,
            entity_id: Some(user.id.to_string()),
            changes: None,
            ip_address: ctx.ip_address.clone(),
            user_agent: ctx.user_agent.clone(),
            request_id: Some(ctx.request_id),
        },
    )
    .await;

    Ok((StatusCode::OK, Json(MessageResponse { message: "logged out".to_string() })))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Extension(claims): Extension<crate::services::Claims>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse> {
    state
        .auth_service
        .change_password(&state.pool, &state.session_blacklist, &user.id, &claims.session_id, req)
        .await?;

    Ok((StatusCode::OK, Json(MessageResponse { message: "password changed".to_string() })))
}
