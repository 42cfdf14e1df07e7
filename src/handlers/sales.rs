/*!
 * Sale (Point-of-Sale) Handlers
 *
 * In-store sale creation and refund. Unlike online orders, a sale is created synchronously by a
 * staff member at checkout — there is no cart or reservation step.
 */

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::handlers::customers::ListQuery;
use crate::models::{Sale, SaleItem, User};
use crate::services::authorization::{ensure_permission, Action, Resource};
use crate::services::CreateSaleRequest;
use crate::state::AppState;
use crate::utils::{AppError, Result};

#[derive(Debug, Serialize)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

pub async fn list_sales(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Sale>>> {
    ensure_permission(actor.role, Resource::Sales, Action::Read)?;
    Ok(Json(state.sale_service.list(query.limit, query.offset).await?))
}

pub async fn get_sale(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<SaleWithItems>> {
    ensure_permission(actor.role, Resource::Sales, Action::Read)?;
    let (sale, items) = state.sale_service.get(&id).await?;
    Ok(Json(SaleWithItems { sale, items }))
}

pub async fn create_sale(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Json(req): Json<CreateSaleRequest>,
) -> Result<impl IntoResponse> {
    ensure_permission(actor.role, Resource::Sales, Action::Create)?;
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let (sale, items) = state.sale_service.create(req, actor.id).await?;
    Ok((StatusCode::CREATED, Json(SaleWithItems { sale, items })))
}

#[derive(Debug, serde::Deserialize)]
pub struct RefundRequest {
    pub reason: String,
}

pub async fn refund_sale(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
    Json(req): Json<RefundRequest>,
) -> Result<Json<Sale>> {
    ensure_permission(actor.role, Resource::Sales, Action::Refund)?;
    if req.reason.trim().is_empty() {
        return Err(AppError::Validation("refund reason is required".to_string()));
    }
    Ok(Json(state.sale_service.refund(&id, actor.id, req.reason).await?))
}
