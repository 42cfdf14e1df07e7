/*!
 * Cart Handlers
 *
 * Guest/registered dual-identity cart. Identity is resolved per request from either an
 * explicit `customer_id` query parameter (a registered customer known to
 * the caller) or the `X-Session-ID` header (guest) — never from the bearer
 * token, since staff accounts are not cart owners. Exactly one must be
 * present; `CartOwner::from_parts` enforces the XOR.
 */

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{CartItem, CartOwner, CartSummary};
use crate::services::{AddCartItemRequest, UpdateCartItemRequest};
use crate::state::AppState;
use crate::utils::Result;

const SESSION_ID_HEADER: &str = "x-session-id";

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub customer_id: Option<Uuid>,
}

fn resolve_owner(headers: &HeaderMap, query: &OwnerQuery) -> Result<CartOwner> {
    let session_id = headers
        .get(SESSION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    CartOwner::from_parts(query.customer_id, session_id)
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<OwnerQuery>,
    Json(req): Json<AddCartItemRequest>,
) -> Result<impl IntoResponse> {
    let owner = resolve_owner(&headers, &query)?;
    let item = state.cart_service.add(&owner, req).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn get_cart(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<CartSummary>> {
    let owner = resolve_owner(&headers, &query)?;
    Ok(Json(state.cart_service.get(&owner).await?))
}

pub async fn update_cart_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCartItemRequest>,
) -> Result<Json<CartItem>> {
    Ok(Json(state.cart_service.update_quantity(&id, req).await?))
}

pub async fn remove_cart_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.cart_service.remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_cart(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<OwnerQuery>,
) -> Result<StatusCode> {
    let owner = resolve_owner(&headers, &query)?;
    state.cart_service.clear(&owner).await?;
    Ok(StatusCode::NO_CONTENT)
}
