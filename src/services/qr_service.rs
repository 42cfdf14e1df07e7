/*!
 * QR Service
 *
 * Code issuance plus the public scan pipeline. Scan logging is
 * best-effort: a failure to write QRScanLog never fails the scan response,
 * it only produces a `tracing::warn!`.
 */

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Customer, OnlineOrder, Product, QRCode, QRScanLog, QrType, ScanMethod};
use crate::utils::{AppError, Result};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "entity_type", rename_all = "snake_case")]
pub enum ScanProjection {
    Product { id: Uuid, name: String, price: f64, stock: i32 },
    Customer { id: Uuid, name: String },
    Order { id: Uuid, order_number: String, status: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub entity: ScanProjection,
    pub scans_remaining: Option<i32>,
}

pub struct ScanContext {
    pub scanner_user: Option<Uuid>,
    pub session_id: Option<String>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Clone)]
pub struct QrService {
    pool: PgPool,
}

impl QrService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn generate_for_product(&self, product_id: &Uuid) -> Result<QRCode> {
        let product = Product::find_by_id(&self.pool, product_id).await?;
        QRCode::create(
            &self.pool,
            QrType::Product,
            "PRODUCT".to_string(),
            product.id,
            serde_json::json!({ "name": product.name, "sku": product.sku }),
            None,
            None,
        )
        .await
    }

    pub async fn generate_for_customer(&self, customer_id: &Uuid) -> Result<QRCode> {
        let customer = Customer::find_by_id(&self.pool, customer_id).await?;
        QRCode::create(
            &self.pool,
            QrType::Customer,
            "CUSTOMER".to_string(),
            customer.id,
            serde_json::json!({ "name": customer.full_name() }),
            None,
            None,
        )
        .await
    }

    /// Issues the tracking QR attached to a freshly created order. No expiry or scan cap: tracking codes stay valid for
    /// the lifetime of the order.
    pub async fn generate_for_order(&self, order: &OnlineOrder) -> Result<QRCode> {
        QRCode::create(
            &self.pool,
            QrType::Order,
            "ORDER".to_string(),
            order.id,
            serde_json::json!({ "order_number": order.order_number, "tracking_number": order.tracking_number }),
            None,
            None,
        )
        .await
    }

    /// The public scan pipeline.
    pub async fn scan(
        &self,
        code: &str,
        scan_method: ScanMethod,
        location: Option<String>,
        ctx: ScanContext,
    ) -> Result<ScanResult> {
        let qr = QRCode::find_by_code(&self.pool, code).await?;

        if !qr.is_usable() {
            self.log_scan(&qr, &ctx, scan_method.clone(), location.clone(), false, Some("not usable".to_string()))
                .await;
            return Err(AppError::Conflict("QR code is no longer usable".to_string()));
        }

        let projection = match self.resolve_entity(&qr).await {
            Ok(p) => p,
            Err(e) => {
                self.log_scan(&qr, &ctx, scan_method.clone(), location.clone(), false, Some(e.to_string()))
                    .await;
                return Err(e);
            }
        };

        QRCode::increment_scan_count(&self.pool, &qr.id).await?;
        self.log_scan(&qr, &ctx, scan_method, location, true, None).await;

        let scans_remaining = qr.max_scans.map(|max| (max - qr.scan_count - 1).max(0));
        Ok(ScanResult { entity: projection, scans_remaining })
    }

    async fn resolve_entity(&self, qr: &QRCode) -> Result<ScanProjection> {
        match qr.qr_type {
            QrType::Product => {
                let product = Product::find_by_id(&self.pool, &qr.entity_id).await?;
                Ok(ScanProjection::Product {
                    id: product.id,
                    name: product.name,
                    price: product.price,
                    stock: product.stock,
                })
            }
            QrType::Customer => {
                let customer = Customer::find_by_id(&self.pool, &qr.entity_id).await?;
                Ok(ScanProjection::Customer { id: customer.id, name: customer.full_name() })
            }
            QrType::Order => {
                let order = OnlineOrder::find_by_id(&self.pool, &qr.entity_id).await?;
                Ok(ScanProjection::Order {
                    id: order.id,
                    order_number: order.order_number,
                    status: format!("{:?}", order.status),
                })
            }
            QrType::Payment | QrType::Auth => Err(AppError::Validation(
                "this QR type has no scan projection".to_string(),
            )),
        }
    }

    async fn log_scan(
        &self,
        qr: &QRCode,
        ctx: &ScanContext,
        scan_method: ScanMethod,
        location: Option<String>,
        success: bool,
        failure_reason: Option<String>,
    ) {
        let result = QRScanLog::insert(
            &self.pool,
            qr.id,
            ctx.scanner_user,
            ctx.session_id.clone(),
            ctx.client_ip.clone(),
            ctx.user_agent.clone(),
            scan_method,
            location,
            success,
            failure_reason,
        )
        .await;

        if let Err(err) = result {
            tracing::warn!(error = %err, qr_id = %qr.id, "failed to write QR scan log");
        }
    }
}
