/*!
 * Online Order Model
 *
 * The order state machine.
 * `OrderStatus::can_transition_to` is the single source of truth for the
 * allowed-edges graph; every other place that needs to know a legal next
 * state calls through it rather than re-deriving the graph.
 */

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::crypto::EncryptedString;
use crate::utils::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    PaymentPending,
    Paid,
    Processing,
    PrescriptionNeeded,
    Ready,
    OutForDelivery,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled | Self::Refunded)
    }

    /// The allowed-edges graph. Any non-terminal
    /// state may additionally move to `Cancelled` or `Refunded`.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        use OrderStatus::*;

        if self.is_terminal() {
            return false;
        }
        if matches!(target, Cancelled | Refunded) {
            return true;
        }

        matches!(
            (self, target),
            (Pending, PaymentPending)
                | (Pending, PrescriptionNeeded)
                | (PaymentPending, Paid)
                | (Paid, Processing)
                | (PrescriptionNeeded, Processing)
                | (Processing, Ready)
                | (Ready, OutForDelivery)
                | (OutForDelivery, Delivered)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Pickup,
    Delivery,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OnlineOrder {
    pub id: Uuid,
    pub order_number: String,
    pub status: OrderStatus,
    pub order_type: OrderType,
    pub customer_id: Option<Uuid>,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
    pub delivery_address: Option<EncryptedString>,
    pub subtotal: f64,
    pub tax: f64,
    pub delivery_fee: f64,
    pub discount: f64,
    pub total: f64,
    pub prescription_required: bool,
    pub expected_delivery: Option<DateTime<Utc>>,
    pub actual_delivery: Option<DateTime<Utc>>,
    pub tracking_number: String,
    pub qr_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OnlineOrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: f64,
    pub line_total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderStatusHistory {
    pub id: Uuid,
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub reason: Option<String>,
    pub actor: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PrescriptionUpload {
    pub id: Uuid,
    pub order_id: Uuid,
    pub storage_handle: String,
    pub uploaded_by: Option<Uuid>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

pub fn generate_order_number() -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix: String = {
        let mut rng = rand::thread_rng();
        (0..8)
            .map(|_| std::char::from_digit(rng.gen_range(0..16), 16).unwrap())
            .collect()
    };
    format!("ORD-{}-{}", date, suffix)
}

pub fn generate_tracking_number() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..12)
        .map(|_| std::char::from_digit(rng.gen_range(0..36), 36).unwrap().to_ascii_uppercase())
        .collect();
    format!("TRK{}", suffix)
}

impl OnlineOrder {
    pub async fn find_by_id(pool: &PgPool, id: &Uuid) -> Result<Self> {
        sqlx::query_as::<_, OnlineOrder>(
            r#"
            SELECT id, order_number, status, order_type, customer_id, guest_name,
                   guest_email, guest_phone, delivery_address, subtotal, tax,
                   delivery_fee, discount, total, prescription_required,
                   expected_delivery, actual_delivery, tracking_number, qr_code,
                   created_at, updated_at
            FROM online_orders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("order not found".to_string()),
            _ => AppError::from(e),
        })
    }

    /// Public tracking lookup by order number, no
    /// guest PII or delivery address is selected here.
    pub async fn find_by_order_number(pool: &PgPool, order_number: &str) -> Result<Self> {
        sqlx::query_as::<_, OnlineOrder>(
            r#"
            SELECT id, order_number, status, order_type, customer_id, guest_name,
                   guest_email, guest_phone, delivery_address, subtotal, tax,
                   delivery_fee, discount, total, prescription_required,
                   expected_delivery, actual_delivery, tracking_number, qr_code,
                   created_at, updated_at
            FROM online_orders
            WHERE order_number = $1
            "#,
        )
        .bind(order_number)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("order not found".to_string()),
            _ => AppError::from(e),
        })
    }

    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, OnlineOrder>(
            r#"
            SELECT id, order_number, status, order_type, customer_id, guest_name,
                   guest_email, guest_phone, delivery_address, subtotal, tax,
                   delivery_fee, discount, total, prescription_required,
                   expected_delivery, actual_delivery, tracking_number, qr_code,
                   created_at, updated_at
            FROM online_orders
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn items(pool: &PgPool, order_id: &Uuid) -> Result<Vec<OnlineOrderItem>> {
        let rows = sqlx::query_as::<_, OnlineOrderItem>(
            r#"
            SELECT id, order_id, product_id, quantity, unit_price, line_total
            FROM online_order_items
            WHERE order_id = $1
            "#,
        )
        .bind(order_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// History ordered strictly by insertion.
    pub async fn status_history(pool: &PgPool, order_id: &Uuid) -> Result<Vec<OrderStatusHistory>> {
        let rows = sqlx::query_as::<_, OrderStatusHistory>(
            r#"
            SELECT id, order_id, status, reason, actor, created_at
            FROM order_status_history
            WHERE order_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        order_type: OrderType,
        customer_id: Option<Uuid>,
        guest_name: Option<String>,
        guest_email: Option<String>,
        guest_phone: Option<String>,
        delivery_address: Option<EncryptedString>,
        subtotal: f64,
        tax: f64,
        delivery_fee: f64,
        discount: f64,
        total: f64,
        prescription_required: bool,
        status: OrderStatus,
        expected_delivery: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        sqlx::query_as::<_, OnlineOrder>(
            r#"
            INSERT INTO online_orders (
                order_number, status, order_type, customer_id, guest_name,
                guest_email, guest_phone, delivery_address, subtotal, tax,
                delivery_fee, discount, total, prescription_required,
                expected_delivery, tracking_number
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING id, order_number, status, order_type, customer_id, guest_name,
                      guest_email, guest_phone, delivery_address, subtotal, tax,
                      delivery_fee, discount, total, prescription_required,
                      expected_delivery, actual_delivery, tracking_number, qr_code,
                      created_at, updated_at
            "#,
        )
        .bind(generate_order_number())
        .bind(status)
        .bind(order_type)
        .bind(customer_id)
        .bind(guest_name)
        .bind(guest_email)
        .bind(guest_phone)
        .bind(delivery_address)
        .bind(subtotal)
        .bind(tax)
        .bind(delivery_fee)
        .bind(discount)
        .bind(total)
        .bind(prescription_required)
        .bind(expected_delivery)
        .bind(generate_tracking_number())
        .fetch_one(&mut **tx)
        .await
        .map_err(AppError::from)
    }

    pub async fn set_qr_code(tx: &mut Transaction<'_, Postgres>, id: &Uuid, qr: &str) -> Result<()> {
        sqlx::query("UPDATE online_orders SET qr_code = $1 WHERE id = $2")
            .bind(qr)
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    pub async fn insert_item(
        tx: &mut Transaction<'_, Postgres>,
        order_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        unit_price: f64,
    ) -> Result<OnlineOrderItem> {
        let line_total = unit_price * quantity as f64;
        sqlx::query_as::<_, OnlineOrderItem>(
            r#"
            INSERT INTO online_order_items (order_id, product_id, quantity, unit_price, line_total)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, order_id, product_id, quantity, unit_price, line_total
            "#,
        )
        .bind(order_id)
        .bind(product_id)
        .bind(quantity)
        .bind(unit_price)
        .bind(line_total)
        .fetch_one(&mut **tx)
        .await
        .map_err(AppError::from)
    }

    pub async fn insert_status_history(
        tx: &mut Transaction<'_, Postgres>,
        order_id: Uuid,
        status: OrderStatus,
        reason: Option<String>,
        actor: Option<Uuid>,
    ) -> Result<OrderStatusHistory> {
        sqlx::query_as::<_, OrderStatusHistory>(
            r#"
            INSERT INTO order_status_history (order_id, status, reason, actor)
            VALUES ($1, $2, $3, $4)
            RETURNING id, order_id, status, reason, actor, created_at
            "#,
        )
        .bind(order_id)
        .bind(status)
        .bind(reason)
        .bind(actor)
        .fetch_one(&mut **tx)
        .await
        .map_err(AppError::from)
    }

    /// Apply a validated status transition. Caller must have already checked
    /// `current.status.can_transition_to(new_status)`.
    pub async fn apply_transition(
        pool: &PgPool,
        id: &Uuid,
        new_status: OrderStatus,
        actor: Option<Uuid>,
        reason: Option<String>,
    ) -> Result<Self> {
        let mut tx = pool.begin().await?;

        let current = sqlx::query_as::<_, OnlineOrder>(
            r#"
            SELECT id, order_number, status, order_type, customer_id, guest_name,
                   guest_email, guest_phone, delivery_address, subtotal, tax,
                   delivery_fee, discount, total, prescription_required,
                   expected_delivery, actual_delivery, tracking_number, qr_code,
                   created_at, updated_at
            FROM online_orders
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("order not found".to_string()),
            _ => AppError::from(e),
        })?;

        if !current.status.can_transition_to(new_status) {
            return Err(AppError::IllegalStateTransition(format!(
                "cannot transition order from {:?} to {:?}",
                current.status, new_status
            )));
        }

        let actual_delivery = if new_status == OrderStatus::Delivered {
            Some(Utc::now())
        } else {
            current.actual_delivery
        };

        let updated = sqlx::query_as::<_, OnlineOrder>(
            r#"
            UPDATE online_orders
            SET status = $1, actual_delivery = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING id, order_number, status, order_type, customer_id, guest_name,
                      guest_email, guest_phone, delivery_address, subtotal, tax,
                      delivery_fee, discount, total, prescription_required,
                      expected_delivery, actual_delivery, tracking_number, qr_code,
                      created_at, updated_at
            "#,
        )
        .bind(new_status)
        .bind(actual_delivery)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        Self::insert_status_history(&mut tx, *id, new_status, reason, actor).await?;

        tx.commit().await?;
        Ok(updated)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
    pub reason: Option<String>,
}

/// Public-safe tracking projection: no guest PII,
/// no delivery address.
#[derive(Debug, Clone, Serialize)]
pub struct OrderTrackingSummary {
    pub order_number: String,
    pub status: OrderStatus,
    pub order_type: OrderType,
    pub created_at: DateTime<Utc>,
    pub expected_delivery: Option<DateTime<Utc>>,
    pub actual_delivery: Option<DateTime<Utc>>,
    pub tracking_number: String,
    pub status_history: Vec<OrderStatusHistory>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn test_order_number_format() {
        let n = generate_order_number();
        assert!(n.starts_with("ORD-"));
    }

    #[test]
    fn test_happy_path_transitions_allowed() {
        assert!(Pending.can_transition_to(PaymentPending));
        assert!(PaymentPending.can_transition_to(Paid));
        assert!(Paid.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Ready));
        assert!(Ready.can_transition_to(OutForDelivery));
        assert!(OutForDelivery.can_transition_to(Delivered));
    }

    #[test]
    fn test_prescription_branch() {
        assert!(Pending.can_transition_to(PrescriptionNeeded));
        assert!(PrescriptionNeeded.can_transition_to(Processing));
    }

    #[test]
    fn test_any_nonterminal_can_cancel_or_refund() {
        for s in [Pending, PaymentPending, Paid, Processing, PrescriptionNeeded, Ready, OutForDelivery] {
            assert!(s.can_transition_to(Cancelled));
            assert!(s.can_transition_to(Refunded));
        }
    }

    #[test]
    fn test_terminal_states_reject_all_transitions() {
        for terminal in [Delivered, Cancelled, Refunded] {
            assert!(terminal.is_terminal());
            for target in [Pending, PaymentPending, Paid, Processing, Ready, OutForDelivery, Delivered, Cancelled, Refunded] {
                assert!(!terminal.can_transition_to(target));
            }
        }
    }

    #[test]
    fn test_skip_edges_rejected() {
        assert!(!Pending.can_transition_to(Paid));
        assert!(!Pending.can_transition_to(Processing));
        assert!(!Paid.can_transition_to(Ready));
    }
}
