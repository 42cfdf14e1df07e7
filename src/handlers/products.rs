/*!
 * Product Handlers
 *
 * Standard CRUD over `products`, plus the public, unauthenticated catalog
 * browse endpoint.
 */

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::handlers::customers::ListResponse;
use crate::models::{CreateProductRequest, Product, UpdateProductRequest, User};
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

/// GET /products/browse — no auth, no stock/cost internals beyond what the
/// storefront needs.
pub async fn browse_products(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.product_service.browse(query.limit, query.offset).await?))
}

pub async fn list_products(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<Product>>> {
    ensure_permission(actor.role, Resource::Products, Action::Read)?;
    let (items, total) = state.product_service.list(query.limit, query.offset).await?;
    Ok(Json(ListResponse { items, total, limit: query.limit, offset: query.offset }))
}

pub async fn get_product(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>> {
    ensure_permission(actor.role, Resource::Products, Action::Read)?;
    Ok(Json(state.product_service.get(&id).await?))
}

pub async fn create_product(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Json(req): Json<CreateProductRequest>,
) -> Result<impl IntoResponse> {
    ensure_permission(actor.role, Resource::Products, Action::Create)?;
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let product = state.product_service.create(req).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<Product>> {
    ensure_permission(actor.role, Resource::Products, Action::Update)?;
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    Ok(Json(state.product_service.update(&id, req).await?))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    ensure_permission(actor.role, Resource::Products, Action::Delete)?;
    state.product_service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ExpiringQuery {
    #[serde(default = "default_expiring_days")]
    pub days: i64,
}

fn default_expiring_days() -> i64 {
    30
}

/// GET /products/expiring — inventory-management helper gated the same as
/// an `inventory:read` lookup.
pub async fn expiring_products(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Query(query): Query<ExpiringQuery>,
) -> Result<Json<Vec<Product>>> {
    ensure_permission(actor.role, Resource::Inventory, Action::Read)?;
    Ok(Json(state.product_service.expiring_within(query.days).await?))
}

pub async fn adjust_stock(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
    Json(delta): Json<StockAdjustment>,
) -> Result<Json<Product>> {
    ensure_permission(actor.role, Resource::Inventory, Action::Update)?;
    if delta.delta == 0 {
        return Err(AppError::Validation("delta must be non-zero".to_string()));
    }
    Ok(Json(state.product_service.adjust_stock(&id, delta.delta).await?))
}

#[derive(Debug, Deserialize)]
pub struct StockAdjustment {
    pub delta: i32,
}
