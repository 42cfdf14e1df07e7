/*!
 * Customer Handlers
 *
 * Standard CRUD over `customers` gated by the authorization matrix.
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

use crate::models::{CreateCustomerRequest, Customer, UpdateCustomerRequest, User};
use crate::services::authorization::{ensure_permission, Action, Resource};
use crate::state::AppState;
use crate::utils::{AppError, Result};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

pub async fn list_customers(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<Customer>>> {
    ensure_permission(actor.role, Resource::Customers, Action::Read)?;
    let (items, total) = state.customer_service.list(query.limit, query.offset).await?;
    Ok(Json(ListResponse { items, total, limit: query.limit, offset: query.offset }))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Customer>> {
    ensure_permission(actor.role, Resource::Customers, Action::Read)?;
    Ok(Json(state.customer_service.get(&id).await?))
}

pub async fn create_customer(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Json(req): Json<CreateCustomerRequest>,
) -> Result<impl IntoResponse> {
    ensure_permission(actor.role, Resource::Customers, Action::Create)?;
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let customer = state.customer_service.create(req, actor.id).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn update_customer(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCustomerRequest>,
) -> Result<Json<Customer>> {
    ensure_permission(actor.role, Resource::Customers, Action::Update)?;
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    Ok(Json(state.customer_service.update(&id, req, actor.id).await?))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    ensure_permission(actor.role, Resource::Customers, Action::Delete)?;
    state.customer_service.delete(&id, actor.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
