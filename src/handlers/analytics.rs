/*!
 * Analytics Handlers
 *
 * Dashboard aggregation is explicitly standard CRUD/reporting territory, not
 * core business logic, so this stays a single read-only rollup rather than
 * a dedicated service layer: sales/orders totals for today plus a low-stock
 * count, queried straight off the pool.
 */

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::User;
use crate::services::authorization::{ensure_permission, Action, Resource};
use crate::state::AppState;
use crate::utils::Result;

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub sales_today_count: i64,
    pub sales_today_total: f64,
    pub orders_today_count: i64,
    pub orders_pending_count: i64,
    pub low_stock_count: i64,
    pub expiring_soon_count: i64,
    pub generated_at: DateTime<Utc>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
) -> Result<Json<DashboardSummary>> {
    ensure_permission(actor.role, Resource::Analytics, Action::Read)?;

    let (sales_today_count, sales_today_total): (i64, Option<f64>) = sqlx::query_as(
        r#"
        SELECT COUNT(*), SUM(total)
        FROM sales
        WHERE created_at >= date_trunc('day', now()) AND is_refunded = false
        "#,
    )
    .fetch_one(&state.pool)
    .await?;

    let orders_today_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM online_orders WHERE created_at >= date_trunc('day', now())",
    )
    .fetch_one(&state.pool)
    .await?;

    let orders_pending_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM online_orders WHERE status IN ('pending', 'payment_pending', 'prescription_needed', 'processing')",
    )
    .fetch_one(&state.pool)
    .await?;

    let low_stock_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM products WHERE deleted_at IS NULL AND stock <= min_stock",
    )
    .fetch_one(&state.pool)
    .await?;

    let expiring_soon_count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM products
        WHERE deleted_at IS NULL
          AND expiry_date IS NOT NULL
          AND expiry_date <= (CURRENT_DATE + INTERVAL '30 days')
        "#,
    )
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(DashboardSummary {
        sales_today_count,
        sales_today_total: sales_today_total.unwrap_or(0.0),
        orders_today_count,
        orders_pending_count,
        low_stock_count,
        expiring_soon_count,
        generated_at: Utc::now(),
    }))
}
