/*!
 * Sale Model
 *
 * In-store point-of-sale transactions. A sale
 * is written atomically with its line items and the corresponding product
 * stock decrements; refunds are a stand-alone admin-only action afterward,
 * not a status machine.
 */

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::utils::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    Insurance,
    Gcash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum DiscountType {
    None,
    SeniorCitizen,
    Pwd,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Sale {
    pub id: Uuid,
    pub sale_number: String,
    pub customer_id: Option<Uuid>,
    pub user_id: Uuid,
    pub subtotal: f64,
    pub discount_amount: f64,
    pub discount_type: DiscountType,
    pub tax_amount: f64,
    pub total: f64,
    pub payment_method: PaymentMethod,
    pub prescription_number: Option<String>,
    pub is_refunded: bool,
    pub refunded_at: Option<DateTime<Utc>>,
    pub refunded_by: Option<Uuid>,
    pub refund_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SaleItem {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: f64,
    pub line_total: f64,
}

/// A human-readable, collision-resistant sale number: `SALE-YYYYMMDD-<8 hex>`
///.
pub fn generate_sale_number() -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix: String = {
        let mut rng = rand::thread_rng();
        (0..8)
            .map(|_| std::char::from_digit(rng.gen_range(0..16), 16).unwrap())
            .collect()
    };
    format!("SALE-{}-{}", date, suffix)
}

impl Sale {
    pub async fn find_by_id(pool: &PgPool, id: &Uuid) -> Result<Self> {
        sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, sale_number, customer_id, user_id, subtotal, discount_amount,
                   discount_type, tax_amount, total, payment_method, prescription_number,
                   is_refunded, refunded_at, refunded_by, refund_reason, created_at
            FROM sales
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("sale not found".to_string()),
            _ => AppError::from(e),
        })
    }

    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, sale_number, customer_id, user_id, subtotal, discount_amount,
                   discount_type, tax_amount, total, payment_method, prescription_number,
                   is_refunded, refunded_at, refunded_by, refund_reason, created_at
            FROM sales
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

    pub async fn items(pool: &PgPool, sale_id: &Uuid) -> Result<Vec<SaleItem>> {
        let rows = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, quantity, unit_price, line_total
            FROM sale_items
            WHERE sale_id = $1
            "#,
        )
        .bind(sale_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Insert the sale header row within an active transaction; caller owns
    /// the stock-decrement and line-item writes.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        customer_id: Option<Uuid>,
        user_id: Uuid,
        subtotal: f64,
        discount_amount: f64,
        discount_type: DiscountType,
        tax_amount: f64,
        total: f64,
        payment_method: PaymentMethod,
        prescription_number: Option<String>,
    ) -> Result<Self> {
        sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (
                sale_number, customer_id, user_id, subtotal, discount_amount,
                discount_type, tax_amount, total, payment_method, prescription_number,
                is_refunded
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, false)
            RETURNING id, sale_number, customer_id, user_id, subtotal, discount_amount,
                      discount_type, tax_amount, total, payment_method, prescription_number,
                      is_refunded, refunded_at, refunded_by, refund_reason, created_at
            "#,
        )
        .bind(generate_sale_number())
        .bind(customer_id)
        .bind(user_id)
        .bind(subtotal)
        .bind(discount_amount)
        .bind(discount_type)
        .bind(tax_amount)
        .bind(total)
        .bind(payment_method)
        .bind(prescription_number)
        .fetch_one(&mut **tx)
        .await
        .map_err(AppError::from)
    }

    pub async fn insert_item(
        tx: &mut Transaction<'_, Postgres>,
        sale_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        unit_price: f64,
    ) -> Result<SaleItem> {
        let line_total = unit_price * quantity as f64;
        sqlx::query_as::<_, SaleItem>(
            r#"
            INSERT INTO sale_items (sale_id, product_id, quantity, unit_price, line_total)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, sale_id, product_id, quantity, unit_price, line_total
            "#,
        )
        .bind(sale_id)
        .bind(product_id)
        .bind(quantity)
        .bind(unit_price)
        .bind(line_total)
        .fetch_one(&mut **tx)
        .await
        .map_err(AppError::from)
    }

    /// Admin-only refund. Idempotency is
    /// enforced by the `is_refunded = false` guard in the WHERE clause.
    pub async fn refund(pool: &PgPool, id: &Uuid, actor: Uuid, reason: String) -> Result<Self> {
        sqlx::query_as::<_, Sale>(
            r#"
            UPDATE sales SET
                is_refunded = true, refunded_at = NOW(), refunded_by = $1, refund_reason = $2
            WHERE id = $3 AND is_refunded = false
            RETURNING id, sale_number, customer_id, user_id, subtotal, discount_amount,
                      discount_type, tax_amount, total, payment_method, prescription_number,
                      is_refunded, refunded_at, refunded_by, refund_reason, created_at
            "#,
        )
        .bind(actor)
        .bind(reason)
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                AppError::Conflict("sale not found or already refunded".to_string())
            }
            _ => AppError::from(e),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefundSaleRequest {
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_sale_number_format() {
        let n = generate_sale_number();
        assert!(n.starts_with("SALE-"));
        let parts: Vec<&str> = n.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_sale_number_unique_enough() {
        let a = generate_sale_number();
        let b = generate_sale_number();
        // Same-second collisions are astronomically unlikely with 8 hex chars.
        assert_ne!(a, b);
    }
}
