/*!
 * Supplier Model
 *
 * Vendor contacts referenced optionally by Product. Standard CRUD with no
 * domain invariants beyond uniqueness.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::utils::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Supplier {
    pub async fn find_by_id(pool: &PgPool, id: &Uuid) -> Result<Self> {
        sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, name, contact_name, email, phone, address, is_active,
                   created_at, updated_at, deleted_at
            FROM suppliers
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("supplier not found".to_string()),
            _ => AppError::from(e),
        })
    }

    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, name, contact_name, email, phone, address, is_active,
                   created_at, updated_at, deleted_at
            FROM suppliers
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

    pub async fn count(pool: &PgPool) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM suppliers WHERE deleted_at IS NULL")
                .fetch_one(pool)
                .await?;
        Ok(count)
    }

    pub async fn create(pool: &PgPool, req: CreateSupplierRequest) -> Result<Self> {
        sqlx::query_as::<_, Supplier>(
            r#"
            INSERT INTO suppliers (name, contact_name, email, phone, address, is_active)
            VALUES ($1, $2, $3, $4, $5, true)
            RETURNING id, name, contact_name, email, phone, address, is_active,
                      created_at, updated_at, deleted_at
            "#,
        )
        .bind(req.name)
        .bind(req.contact_name)
        .bind(req.email)
        .bind(req.phone)
        .bind(req.address)
        .fetch_one(pool)
        .await
        .map_err(AppError::from)
    }

    pub async fn update(pool: &PgPool, id: &Uuid, req: UpdateSupplierRequest) -> Result<Self> {
        let existing = Self::find_by_id(pool, id).await?;

        sqlx::query_as::<_, Supplier>(
            r#"
            UPDATE suppliers SET
                name = $1, contact_name = $2, email = $3, phone = $4, address = $5,
                updated_at = NOW()
            WHERE id = $6 AND deleted_at IS NULL
            RETURNING id, name, contact_name, email, phone, address, is_active,
                      created_at, updated_at, deleted_at
            "#,
        )
        .bind(req.name.unwrap_or(existing.name))
        .bind(req.contact_name.or(existing.contact_name))
        .bind(req.email.or(existing.email))
        .bind(req.phone.or(existing.phone))
        .bind(req.address.or(existing.address))
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("supplier not found".to_string()),
            _ => AppError::from(e),
        })
    }

    pub async fn soft_delete(pool: &PgPool, id: &Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE suppliers SET deleted_at = NOW(), is_active = false WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("supplier not found".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSupplierRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub contact_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateSupplierRequest {
    pub name: Option<String>,
    pub contact_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}
