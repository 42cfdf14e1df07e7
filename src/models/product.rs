/*!
 * Product Model
 *
 * Catalog items. `stock` is mutated only inside a transaction that also
 * writes the corresponding SaleItem/OnlineOrderItem row, using a row-level
 * lock; never trust an
 * application-level in-memory lock alone for this.
 */

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use crate::utils::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub generic_name: Option<String>,
    pub category: Option<String>,
    pub sku: String,
    pub barcode: Option<String>,
    pub manufacturer: Option<String>,
    pub dosage_form: Option<String>,
    pub price: f64,
    pub cost: f64,
    pub stock: i32,
    pub min_stock: i32,
    pub expiry_date: Option<NaiveDate>,
    pub batch_number: Option<String>,
    pub prescription_required: bool,
    pub is_active: bool,
    pub supplier_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Product {
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }

    pub async fn find_by_id(pool: &PgPool, id: &Uuid) -> Result<Self> {
        sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, generic_name, category, sku, barcode, manufacturer,
                   dosage_form, price, cost, stock, min_stock, expiry_date,
                   batch_number, prescription_required, is_active, supplier_id,
                   created_at, updated_at, deleted_at
            FROM products
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("product not found".to_string()),
            _ => AppError::from(e),
        })
    }

    /// Load and lock a product row within an active transaction, for
    /// checkout/sale stock decrement.
    pub async fn find_by_id_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: &Uuid,
    ) -> Result<Self> {
        sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, generic_name, category, sku, barcode, manufacturer,
                   dosage_form, price, cost, stock, min_stock, expiry_date,
                   batch_number, prescription_required, is_active, supplier_id,
                   created_at, updated_at, deleted_at
            FROM products
            WHERE id = $1 AND deleted_at IS NULL
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("product not found".to_string()),
            _ => AppError::from(e),
        })
    }

    /// Decrement stock by `quantity` inside an active transaction. Caller
    /// must have already locked the row via `find_by_id_for_update` and
    /// checked `stock >= quantity`; this guards against the race by
    /// re-checking at the SQL level as well.
    pub async fn decrement_stock(
        tx: &mut Transaction<'_, Postgres>,
        id: &Uuid,
        quantity: i32,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - $1, updated_at = NOW()
            WHERE id = $2 AND stock >= $1
            "#,
        )
        .bind(quantity)
        .bind(id)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::InsufficientStock);
        }
        Ok(())
    }

    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, generic_name, category, sku, barcode, manufacturer,
                   dosage_form, price, cost, stock, min_stock, expiry_date,
                   batch_number, prescription_required, is_active, supplier_id,
                   created_at, updated_at, deleted_at
            FROM products
            WHERE deleted_at IS NULL
            ORDER BY name ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Products publicly browsable without auth:
    /// active, in-stock items only.
    pub async fn browse(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, generic_name, category, sku, barcode, manufacturer,
                   dosage_form, price, cost, stock, min_stock, expiry_date,
                   batch_number, prescription_required, is_active, supplier_id,
                   created_at, updated_at, deleted_at
            FROM products
            WHERE deleted_at IS NULL AND is_active = true
            ORDER BY name ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Products expiring within 30 days of now;
    /// products already past expiry remain visible elsewhere for archival.
    pub async fn expiring_within(pool: &PgPool, days: i64) -> Result<Vec<Self>> {
        let cutoff = (Utc::now() + chrono::Duration::days(days)).date_naive();
        let rows = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, generic_name, category, sku, barcode, manufacturer,
                   dosage_form, price, cost, stock, min_stock, expiry_date,
                   batch_number, prescription_required, is_active, supplier_id,
                   created_at, updated_at, deleted_at
            FROM products
            WHERE deleted_at IS NULL AND expiry_date IS NOT NULL AND expiry_date <= $1
            ORDER BY expiry_date ASC
            "#,
        )
        .bind(cutoff)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn count(pool: &PgPool) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE deleted_at IS NULL")
                .fetch_one(pool)
                .await?;
        Ok(count)
    }

    pub async fn create(pool: &PgPool, req: CreateProductRequest) -> Result<Self> {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                name, generic_name, category, sku, barcode, manufacturer,
                dosage_form, price, cost, stock, min_stock, expiry_date,
                batch_number, prescription_required, is_active, supplier_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, true, $15)
            RETURNING id, name, generic_name, category, sku, barcode, manufacturer,
                      dosage_form, price, cost, stock, min_stock, expiry_date,
                      batch_number, prescription_required, is_active, supplier_id,
                      created_at, updated_at, deleted_at
            "#,
        )
        .bind(req.name)
        .bind(req.generic_name)
        .bind(req.category)
        .bind(req.sku)
        .bind(req.barcode)
        .bind(req.manufacturer)
        .bind(req.dosage_form)
        .bind(req.price)
        .bind(req.cost)
        .bind(req.stock)
        .bind(req.min_stock)
        .bind(req.expiry_date)
        .bind(req.batch_number)
        .bind(req.prescription_required)
        .bind(req.supplier_id)
        .fetch_one(pool)
        .await
        .map_err(AppError::from)
    }

    pub async fn update(pool: &PgPool, id: &Uuid, req: UpdateProductRequest) -> Result<Self> {
        let existing = Self::find_by_id(pool, id).await?;

        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                name = $1, generic_name = $2, category = $3, sku = $4, barcode = $5,
                manufacturer = $6, dosage_form = $7, price = $8, cost = $9,
                min_stock = $10, expiry_date = $11, batch_number = $12,
                prescription_required = $13, supplier_id = $14, updated_at = NOW()
            WHERE id = $15 AND deleted_at IS NULL
            RETURNING id, name, generic_name, category, sku, barcode, manufacturer,
                      dosage_form, price, cost, stock, min_stock, expiry_date,
                      batch_number, prescription_required, is_active, supplier_id,
                      created_at, updated_at, deleted_at
            "#,
        )
        .bind(req.name.unwrap_or(existing.name))
        .bind(req.generic_name.or(existing.generic_name))
        .bind(req.category.or(existing.category))
        .bind(req.sku.unwrap_or(existing.sku))
        .bind(req.barcode.or(existing.barcode))
        .bind(req.manufacturer.or(existing.manufacturer))
        .bind(req.dosage_form.or(existing.dosage_form))
        .bind(req.price.unwrap_or(existing.price))
        .bind(req.cost.unwrap_or(existing.cost))
        .bind(req.min_stock.unwrap_or(existing.min_stock))
        .bind(req.expiry_date.or(existing.expiry_date))
        .bind(req.batch_number.or(existing.batch_number))
        .bind(req.prescription_required.unwrap_or(existing.prescription_required))
        .bind(req.supplier_id.or(existing.supplier_id))
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("product not found".to_string()),
            _ => AppError::from(e),
        })
    }

    /// Direct stock adjustment outside the checkout path, e.g. restocking or manual correction. Not used by the
    /// checkout/sale transactions, which go through `decrement_stock`.
    pub async fn adjust_stock(pool: &PgPool, id: &Uuid, delta: i32) -> Result<Self> {
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET stock = stock + $1, updated_at = NOW()
            WHERE id = $2 AND deleted_at IS NULL AND stock + $1 >= 0
            RETURNING id, name, generic_name, category, sku, barcode, manufacturer,
                      dosage_form, price, cost, stock, min_stock, expiry_date,
                      batch_number, prescription_required, is_active, supplier_id,
                      created_at, updated_at, deleted_at
            "#,
        )
        .bind(delta)
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::InsufficientStock,
            _ => AppError::from(e),
        })
    }

    pub async fn soft_delete(pool: &PgPool, id: &Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE products SET deleted_at = NOW(), is_active = false WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("product not found".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub generic_name: Option<String>,
    pub category: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub sku: String,
    pub barcode: Option<String>,
    pub manufacturer: Option<String>,
    pub dosage_form: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[validate(range(min = 0.0))]
    pub cost: f64,
    #[validate(range(min = 0))]
    pub stock: i32,
    #[validate(range(min = 0))]
    pub min_stock: i32,
    pub expiry_date: Option<NaiveDate>,
    pub batch_number: Option<String>,
    #[serde(default)]
    pub prescription_required: bool,
    pub supplier_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub generic_name: Option<String>,
    pub category: Option<String>,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub manufacturer: Option<String>,
    pub dosage_form: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    #[validate(range(min = 0.0))]
    pub cost: Option<f64>,
    #[validate(range(min = 0))]
    pub min_stock: Option<i32>,
    pub expiry_date: Option<NaiveDate>,
    pub batch_number: Option<String>,
    pub prescription_required: Option<bool>,
    pub supplier_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(stock: i32, min_stock: i32) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Amoxicillin 500mg".to_string(),
            generic_name: Some("Amoxicillin".to_string()),
            category: Some("Antibiotic".to_string()),
            sku: "AMX-500".to_string(),
            barcode: None,
            manufacturer: None,
            dosage_form: Some("Capsule".to_string()),
            price: 12.5,
            cost: 8.0,
            stock,
            min_stock,
            expiry_date: None,
            batch_number: None,
            prescription_required: true,
            is_active: true,
            supplier_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_is_low_stock() {
        assert!(sample(5, 10).is_low_stock());
        assert!(!sample(20, 10).is_low_stock());
        assert!(sample(10, 10).is_low_stock());
    }
}
