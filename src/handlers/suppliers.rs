/*!
 * Supplier Handlers
 *
 * Standard CRUD over `suppliers`, still gated through the same authorization
 * matrix as every other resource.
 */

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::handlers::customers::{ListQuery, ListResponse};
use crate::models::{CreateSupplierRequest, Supplier, UpdateSupplierRequest, User};
use crate::services::authorization::{ensure_permission, Action, Resource};
use crate::state::AppState;
use crate::utils::{AppError, Result};

pub async fn list_suppliers(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<Supplier>>> {
    ensure_permission(actor.role, Resource::Suppliers, Action::Read)?;
    let (items, total) = state.supplier_service.list(query.limit, query.offset).await?;
    Ok(Json(ListResponse { items, total, limit: query.limit, offset: query.offset }))
}

pub async fn get_supplier(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Supplier>> {
    ensure_permission(actor.role, Resource::Suppliers, Action::Read)?;
    Ok(Json(state.supplier_service.get(&id).await?))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Json(req): Json<CreateSupplierRequest>,
) -> Result<impl IntoResponse> {
    ensure_permission(actor.role, Resource::Suppliers, Action::Create)?;
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let supplier = state.supplier_service.create(req).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn update_supplier(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateSupplierRequest>,
) -> Result<Json<Supplier>> {
    ensure_permission(actor.role, Resource::Suppliers, Action::Update)?;
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    Ok(Json(state.supplier_service.update(&id, req).await?))
}

pub async fn delete_supplier(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    ensure_permission(actor.role, Resource::Suppliers, Action::Delete)?;
    state.supplier_service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
