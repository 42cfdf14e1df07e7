/*!
 * Audit Logging Middleware
 *
 * Appends an `AuditLog` row for every authenticated mutating request
 * (POST/PUT/PATCH/DELETE), capturing actor, derived action, resource kind
 * and id (from the path), request id, ip, and a sanitized body summary.
 * Runs ahead of the per-route auth layer in the chain, so it extracts the
 * actor itself from the bearer token rather than relying on an extension a
 * later layer would set; unauthenticated requests (no valid token) are not
 * logged here since the auth layer downstream will reject them anyway.
 *
 * Logging failures never block the primary operation: the
 * insert is fire-and-forget on a spawned task.
 */

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use uuid::Uuid;

use crate::models::{AuditAction, CreateAuditLog, EntityType, RequestContext};
use crate::state::AppState;

/// Field names masked out of the request-body summary before it is
/// persisted; anything resembling a credential or patient identifier.
const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "password_hash",
    "new_password",
    "current_password",
    "token",
    "access_token",
    "refresh_token",
    "national_id",
    "id_number",
    "phone",
    "phone_number",
    "address",
];

fn method_to_action(method: &Method) -> AuditAction {
    match *method {
        Method::POST => AuditAction::Create,
        Method::PUT | Method::PATCH => AuditAction::Update,
        Method::DELETE => AuditAction::Delete,
        _ => AuditAction::Update,
    }
}

/// Map the first path segment after `/api/v1` to a resource kind.
/// Example: `/api/v1/customers/123` -> (Customer, Some("123")).
fn entity_from_path(path: &str) -> (Option<EntityType>, Option<String>) {
    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let offset = if parts.first().copied() == Some("api") && parts.get(1).copied() == Some("v1") {
        2
    } else {
        0
    };

    let segment = parts.get(offset)?.trim_end_matches('s');
    let entity_type = EntityType::from_str(segment).or_else(|| EntityType::from_str(parts.get(offset)?));
    let entity_id = parts.get(offset + 1).map(|s| s.to_string());
    (entity_type, entity_id)
}

fn mask_body(bytes: &Bytes) -> Option<Value> {
    let mut value: Value = serde_json::from_slice(bytes).ok()?;
    mask_value(&mut value);
    Some(value)
}

fn mask_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                if SENSITIVE_FIELDS.iter().any(|f| f.eq_ignore_ascii_case(key)) {
                    *v = Value::String("***".to_string());
                } else {
                    mask_value(v);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(mask_value),
        _ => {}
    }
}

fn extract_user_id(request: &Request, state: &AppState) -> Option<Uuid> {
    let auth_header = request.headers().get(axum::http::header::AUTHORIZATION)?;
    let token = auth_header.to_str().ok()?.strip_prefix("Bearer ")?;
    let claims = state.auth_service.validate_access_token(token).ok()?;
    Uuid::parse_str(&claims.sub).ok()
}

/// Audit logging middleware.
pub async fn audit_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if !matches!(
        *request.method(),
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    ) {
        return next.run(request).await;
    }

    let Some(user_id) = extract_user_id(&request, &state) else {
        return next.run(request).await;
    };

    let ctx = request.extensions().get::<RequestContext>().cloned();
    let path = request.uri().path().to_string();
    let (entity_type, entity_id) = entity_from_path(&path);
    let Some(entity_type) = entity_type else {
        return next.run(request).await;
    };
    let action = method_to_action(request.method());

    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, 10 * 1024 * 1024).await.unwrap_or_default();
    let changes = mask_body(&bytes);
    let request = Request::from_parts(parts, Body::from(bytes));

    let response = next.run(request).await;

    let pool = state.pool.clone();
    tokio::spawn(async move {
        let entry = CreateAuditLog {
            user_id: Some(user_id),
            action,
            entity_type,
            entity_id,
            changes,
            ip_address: ctx.as_ref().and_then(|c| c.ip_address.clone()),
            user_agent: ctx.as_ref().and_then(|c| c.user_agent.clone()),
            request_id: ctx.as_ref().map(|c| c.request_id),
        };
        if let Err(e) = crate::models::AuditLog::create(&pool, entry).await {
            tracing::error!("failed to persist audit log: {e}");
        }
    });

    response
}
