/*!
 * QR Code Model
 *
 * Opaque, printable codes referencing a product/customer/order/payment/auth
 * entity. The code text itself is
 * never authorization — the scan pipeline re-checks active/expiry/
 * max-scans on every hit.
 */

use chrono::{DateTime, Utc};
use data_encoding::BASE32_NOPAD;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::utils::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QrType {
    Product,
    Customer,
    Order,
    Payment,
    Auth,
}

impl QrType {
    fn tag(&self) -> &'static str {
        match self {
            QrType::Product => "product",
            QrType::Customer => "customer",
            QrType::Order => "order",
            QrType::Payment => "payment",
            QrType::Auth => "auth",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ScanMethod {
    Mobile,
    Web,
    Pos,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QRCode {
    pub id: Uuid,
    pub code: String,
    pub qr_type: QrType,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub payload: Value,
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub scan_count: i32,
    pub max_scans: Option<i32>,
}

impl QRCode {
    pub fn is_usable(&self) -> bool {
        if !self.active {
            return false;
        }
        if let Some(expires_at) = self.expires_at {
            if expires_at <= Utc::now() {
                return false;
            }
        }
        if let Some(max) = self.max_scans {
            if self.scan_count >= max {
                return false;
            }
        }
        true
    }

    pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Self> {
        sqlx::query_as::<_, QRCode>(
            r#"
            SELECT id, code, qr_type, entity_type, entity_id, payload,
                   issued_at, expires_at, active, scan_count, max_scans
            FROM qr_codes
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("QR code not found".to_string()),
            _ => AppError::from(e),
        })
    }

    pub async fn create(
        pool: &PgPool,
        qr_type: QrType,
        entity_type: String,
        entity_id: Uuid,
        payload: Value,
        expires_at: Option<DateTime<Utc>>,
        max_scans: Option<i32>,
    ) -> Result<Self> {
        let code = generate_code(qr_type);
        sqlx::query_as::<_, QRCode>(
            r#"
            INSERT INTO qr_codes (code, qr_type, entity_type, entity_id, payload, expires_at, active, scan_count, max_scans)
            VALUES ($1, $2, $3, $4, $5, $6, true, 0, $7)
            RETURNING id, code, qr_type, entity_type, entity_id, payload,
                      issued_at, expires_at, active, scan_count, max_scans
            "#,
        )
        .bind(code)
        .bind(qr_type)
        .bind(entity_type)
        .bind(entity_id)
        .bind(payload)
        .bind(expires_at)
        .bind(max_scans)
        .fetch_one(pool)
        .await
        .map_err(AppError::from)
    }

    /// Increment the scan counter; caller has already validated `is_usable`.
    pub async fn increment_scan_count(pool: &PgPool, id: &Uuid) -> Result<()> {
        sqlx::query("UPDATE qr_codes SET scan_count = scan_count + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

/// `v1:<type>:<base32(10 random bytes)>`.
pub fn generate_code(qr_type: QrType) -> String {
    let mut bytes = [0u8; 10];
    rand::thread_rng().fill_bytes(&mut bytes);
    let encoded = BASE32_NOPAD.encode(&bytes);
    format!("v1:{}:{}", qr_type.tag(), encoded)
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QRScanLog {
    pub id: Uuid,
    pub qr_id: Uuid,
    pub scanner_user: Option<Uuid>,
    pub session_id: Option<String>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub scan_method: ScanMethod,
    pub location: Option<String>,
    pub success: bool,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl QRScanLog {
    /// Best-effort insert.
    /// Callers should log on `Err` rather than propagate it.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        pool: &PgPool,
        qr_id: Uuid,
        scanner_user: Option<Uuid>,
        session_id: Option<String>,
        client_ip: Option<String>,
        user_agent: Option<String>,
        scan_method: ScanMethod,
        location: Option<String>,
        success: bool,
        failure_reason: Option<String>,
    ) -> Result<Self> {
        sqlx::query_as::<_, QRScanLog>(
            r#"
            INSERT INTO qr_scan_logs (
                qr_id, scanner_user, session_id, client_ip, user_agent,
                scan_method, location, success, failure_reason
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, qr_id, scanner_user, session_id, client_ip, user_agent,
                      scan_method, location, success, failure_reason, created_at
            "#,
        )
        .bind(qr_id)
        .bind(scanner_user)
        .bind(session_id)
        .bind(client_ip)
        .bind(user_agent)
        .bind(scan_method)
        .bind(location)
        .bind(success)
        .bind(failure_reason)
        .fetch_one(pool)
        .await
        .map_err(AppError::from)
    }

    /// Most recent scans first, for the admin-only scan-history listing.
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>> {
        sqlx::query_as::<_, QRScanLog>(
            r#"
            SELECT id, qr_id, scanner_user, session_id, client_ip, user_agent,
                   scan_method, location, success, failure_reason, created_at
            FROM qr_scan_logs
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanQrRequest {
    pub code: String,
    pub scan_method: ScanMethod,
    pub location: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_code_format() {
        let code = generate_code(QrType::Product);
        let parts: Vec<&str> = code.splitn(3, ':').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "v1");
        assert_eq!(parts[1], "product");
        assert!(!parts[2].is_empty());
    }

    #[test]
    fn test_is_usable_respects_active_flag() {
        let qr = sample(true, None, 0, None);
        assert!(qr.is_usable());
        let qr = sample(false, None, 0, None);
        assert!(!qr.is_usable());
    }

    #[test]
    fn test_is_usable_respects_expiry() {
        let expired = sample(true, Some(Utc::now() - chrono::Duration::hours(1)), 0, None);
        assert!(!expired.is_usable());
        let not_yet = sample(true, Some(Utc::now() + chrono::Duration::hours(1)), 0, None);
        assert!(not_yet.is_usable());
    }

    #[test]
    fn test_is_usable_respects_max_scans() {
        let exhausted = sample(true, None, 5, Some(5));
        assert!(!exhausted.is_usable());
        let remaining = sample(true, None, 4, Some(5));
        assert!(remaining.is_usable());
    }

    fn sample(
        active: bool,
        expires_at: Option<DateTime<Utc>>,
        scan_count: i32,
        max_scans: Option<i32>,
    ) -> QRCode {
        QRCode {
            id: Uuid::new_v4(),
            code: generate_code(QrType::Product),
            qr_type: QrType::Product,
            entity_type: "PRODUCT".to_string(),
            entity_id: Uuid::new_v4(),
            payload: serde_json::json!({}),
            issued_at: Utc::now(),
            expires_at,
            active,
            scan_count,
            max_scans,
        }
    }
}
