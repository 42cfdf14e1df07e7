/*!
 * Online Order Handlers
 *
 * Checkout, public tracking, and the staff-facing order list/status
 * transition. Checkout shares the cart's owner-resolution rule:
 * `customer_id` query param or `X-Session-ID` header, never the bearer
 * token.
 */

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::handlers::cart::OwnerQuery;
use crate::handlers::customers::ListQuery;
use crate::models::{OnlineOrder, OnlineOrderItem, OrderTrackingSummary, UpdateOrderStatusRequest, User};
use crate::services::authorization::{ensure_permission, Action, Resource};
use crate::services::CheckoutRequest;
use crate::state::AppState;
use crate::utils::{AppError, Result};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: OnlineOrder,
    pub items: Vec<OnlineOrderItem>,
}

fn resolve_owner(headers: &HeaderMap, query: &OwnerQuery) -> Result<crate::models::CartOwner> {
    let session_id = headers
        .get("x-session-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    crate::models::CartOwner::from_parts(query.customer_id, session_id)
}

pub async fn checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<OwnerQuery>,
    Json(req): Json<CheckoutRequest>,
) -> Result<impl IntoResponse> {
    let owner = resolve_owner(&headers, &query)?;
    req.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let (order, items) = state.order_service.checkout(&owner, req).await?;
    Ok((StatusCode::CREATED, Json(OrderWithItems { order, items })))
}

/// GET /orders/track/:number — public, no guest PII in the response.
pub async fn track_order(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Result<Json<OrderTrackingSummary>> {
    Ok(Json(state.order_service.track(&number).await?))
}

/// GET /orders/number/:number — public order-number lookup, full order
/// record (customer-facing order confirmation page).
pub async fn get_order_by_number(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Result<Json<OrderWithItems>> {
    let (order, items) = state.order_service.get_by_number(&number).await?;
    Ok(Json(OrderWithItems { order, items }))
}

/// GET /orders — staff listing. There is no customer-authenticated session
/// in this core, so this always returns the full book rather than a
/// per-customer view.
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<OnlineOrder>>> {
    ensure_permission(actor.role, Resource::Orders, Action::Read)?;
    Ok(Json(state.order_service.list(query.limit, query.offset).await?))
}

pub async fn get_order(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderWithItems>> {
    ensure_permission(actor.role, Resource::Orders, Action::Read)?;
    let (order, items) = state.order_service.get(&id).await?;
    Ok(Json(OrderWithItems { order, items }))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateOrderStatusRequest>,
) -> Result<Json<OnlineOrder>> {
    ensure_permission(actor.role, Resource::Sales, Action::Update)?;
    let order = state
        .order_service
        .transition(&id, req.status, Some(actor.id), req.reason)
        .await?;
    Ok(Json(order))
}
