/*!
 * QR Code Handlers
 *
 * Issuance is staff-gated; the scan endpoint is the one deliberately public
 * surface in the whole API, so
 * it pulls the optional scanner identity straight off the bearer header
 * instead of going through the `require_auth` layer.
 */

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Extension, Json,
};
use uuid::Uuid;

use crate::handlers::customers::ListQuery;
use crate::models::{QRCode, QRScanLog, RequestContext, ScanQrRequest, User};
use crate::services::authorization::{ensure_admin, ensure_permission, Action, Resource};
use crate::services::ScanContext;
use crate::state::AppState;
use crate::utils::Result;

fn optional_scanner(headers: &HeaderMap, state: &AppState) -> Option<Uuid> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))?;
    let claims = state.auth_service.validate_access_token(token).ok()?;
    Uuid::parse_str(&claims.sub).ok()
}

pub async fn scan_qr(
    State(state): State<AppState>,
    headers: HeaderMap,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<ScanQrRequest>,
) -> Result<Json<crate::services::ScanResult>> {
    let scanner_user = optional_scanner(&headers, &state);
    let session_id = headers
        .get("x-session-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let scan_ctx = ScanContext {
        scanner_user,
        session_id,
        client_ip: ctx.ip_address,
        user_agent: ctx.user_agent,
    };

    let result = state
        .qr_service
        .scan(&req.code, req.scan_method, req.location, scan_ctx)
        .await?;
    Ok(Json(result))
}

pub async fn generate_product_qr(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<QRCode>> {
    ensure_permission(actor.role, Resource::Products, Action::Update)?;
    Ok(Json(state.qr_service.generate_for_product(&id).await?))
}

pub async fn generate_customer_qr(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<QRCode>> {
    ensure_permission(actor.role, Resource::Customers, Action::Update)?;
    Ok(Json(state.qr_service.generate_for_customer(&id).await?))
}

pub async fn scan_history(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<QRScanLog>>> {
    ensure_admin(actor.role)?;
    Ok(Json(QRScanLog::list(&state.pool, query.limit, query.offset).await?))
}
