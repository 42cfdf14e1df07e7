/*!
 * Staff User Handlers
 *
 * Admin-only account management: created via this endpoint or the
 * bootstrap default-admin, deactivated (soft) by an admin. Password
 * rotation for one's own account is `POST /auth/change-password`, not here.
 */

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    AuditAction, AuditLog, CreateAuditLog, EntityType, RequestContext, User, UserDto, UserRole,
};
use crate::services::auth_service::require_role;
use crate::state::AppState;
use crate::utils::{AppError, PasswordHasherUtil, Result};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize)]
pub struct ListUsersResponse {
    pub users: Vec<UserDto>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse> {
    require_role(actor.role, &[UserRole::Admin])?;
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    PasswordHasherUtil::validate_password_complexity(&req.password, None)?;
    let password_hash = PasswordHasherUtil::hash_password(&req.password)?;

    let user = User::create(
        &state.pool,
        &req.username,
        &req.email,
        &password_hash,
        req.role,
        Some(actor.id),
    )
    .await?;

    let _ = AuditLog::create(
        &state.pool,
        CreateAuditLog {
            user_id: Some(actor.id),
            action: AuditAction::Create,
            entity_type: EntityType::User,
            entity_id: Some(user.id.to_string()),
            changes: Some(serde_json::json!({ "username": user.username, "role": user.role })),
            ip_address: ctx.ip_address.clone(),
            user_agent: ctx.user_agent.clone(),
            request_id: Some(ctx.request_id),
        },
    )
    .await;

    Ok((StatusCode::CREATED, Json(UserDto::from(user))))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserDto>> {
    if actor.id != user_id {
        require_role(actor.role, &[UserRole::Admin])?;
    }
    let user = User::find_by_id(&state.pool, &user_id).await?;
    Ok(Json(user.into()))
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ListUsersResponse>> {
    require_role(actor.role, &[UserRole::Admin])?;

    let users = User::list(&state.pool, query.limit, query.offset).await?;
    let total = User::count(&state.pool).await?;

    Ok(Json(ListUsersResponse {
        users: users.into_iter().map(UserDto::from).collect(),
        total,
        limit: query.limit,
        offset: query.offset,
    }))
}

pub async fn deactivate_user(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Extension(ctx): Extension<RequestContext>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserDto>> {
    require_role(actor.role, &[UserRole::Admin])?;

    let user = User::set_active(&state.pool, &user_id, false).await?;

    let _ = AuditLog::create(
        &state.pool,
        CreateAuditLog {
            user_id: Some(actor.id),
            action: AuditAction::Update,
            entity_type: EntityType::User,
            entity_id: Some(user_id.to_string()),
            changes: Some(serde_json::json!({ "is_active": false })),
            ip_address: ctx.ip_address.clone(),
            user_agent: ctx.user_agent.clone(),
            request_id: Some(ctx.request_id),
        },
    )
    .await;

    Ok(Json(user.into()))
}

pub async fn activate_user(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Extension(ctx): Extension<RequestContext>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserDto>> {
    require_role(actor.role, &[UserRole::Admin])?;

    let user = User::set_active(&state.pool, &user_id, true).await?;

    let _ = AuditLog::create(
        &state.pool,
        CreateAuditLog {
            user_id: Some(actor.id),
            action: AuditAction::Update,
            entity_type: EntityType::User,
            entity_id: Some(user_id.to_string()),
            changes: Some(serde_json::json!({ "is_active": true })),
            ip_address: ctx.ip_address.clone(),
            user_agent: ctx.user_agent.clone(),
            request_id: Some(ctx.request_id),
        },
    )
    .await;

    Ok(Json(user.into()))
}
