/*!
 * Cart Item Model
 *
 * A prospective line item, not yet an order. Owned by exactly one of a
 * registered customer or a guest session string.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::utils::{AppError, Result};

/// The two mutually-exclusive ways a cart can be identified. Constructed once at the service boundary and passed
/// down instead of letting callers juggle two `Option`s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartOwner {
    Customer(Uuid),
    Session(String),
}

impl CartOwner {
    pub fn customer_id(&self) -> Option<Uuid> {
        match self {
            CartOwner::Customer(id) => Some(*id),
            CartOwner::Session(_) => None,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        match self {
            CartOwner::Customer(_) => None,
            CartOwner::Session(s) => Some(s.as_str()),
        }
    }

    /// Build from the two optional identity sources a request can carry;
    /// fails if neither or both are present.
    pub fn from_parts(customer_id: Option<Uuid>, session_id: Option<String>) -> Result<Self> {
        match (customer_id, session_id) {
            (Some(id), None) => Ok(CartOwner::Customer(id)),
            (None, Some(s)) if !s.is_empty() => Ok(CartOwner::Session(s)),
            (None, None) => Err(AppError::Validation(
                "request must carry either an authenticated customer or X-Session-ID".to_string(),
            )),
            _ => Err(AppError::Validation(
                "request must carry exactly one cart identity, not both".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CartItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub session_id: Option<String>,
    pub quantity: i32,
    pub unit_price: f64,
    pub dosage: Option<String>,
    pub instructions: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    pub fn line_total(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }

    /// Non-expired items for the given owner.
    pub async fn find_by_owner(pool: &PgPool, owner: &CartOwner) -> Result<Vec<Self>> {
        let rows = match owner {
            CartOwner::Customer(id) => {
                sqlx::query_as::<_, CartItem>(
                    r#"
                    SELECT id, product_id, customer_id, session_id, quantity,
                           unit_price, dosage, instructions, expires_at, added_at
                    FROM cart_items
                    WHERE customer_id = $1 AND expires_at > NOW()
                    ORDER BY added_at ASC
                    "#,
                )
                .bind(id)
                .fetch_all(pool)
                .await?
            }
            CartOwner::Session(session) => {
                sqlx::query_as::<_, CartItem>(
                    r#"
                    SELECT id, product_id, customer_id, session_id, quantity,
                           unit_price, dosage, instructions, expires_at, added_at
                    FROM cart_items
                    WHERE session_id = $1 AND expires_at > NOW()
                    ORDER BY added_at ASC
                    "#,
                )
                .bind(session)
                .fetch_all(pool)
                .await?
            }
        };
        Ok(rows)
    }

    pub async fn find_existing_for_product(
        pool: &PgPool,
        owner: &CartOwner,
        product_id: &Uuid,
    ) -> Result<Option<Self>> {
        let row = match owner {
            CartOwner::Customer(id) => {
                sqlx::query_as::<_, CartItem>(
                    r#"
                    SELECT id, product_id, customer_id, session_id, quantity,
                           unit_price, dosage, instructions, expires_at, added_at
                    FROM cart_items
                    WHERE customer_id = $1 AND product_id = $2 AND expires_at > NOW()
                    "#,
                )
                .bind(id)
                .bind(product_id)
                .fetch_optional(pool)
                .await?
            }
            CartOwner::Session(session) => {
                sqlx::query_as::<_, CartItem>(
                    r#"
                    SELECT id, product_id, customer_id, session_id, quantity,
                           unit_price, dosage, instructions, expires_at, added_at
                    FROM cart_items
                    WHERE session_id = $1 AND product_id = $2 AND expires_at > NOW()
                    "#,
                )
                .bind(session)
                .bind(product_id)
                .fetch_optional(pool)
                .await?
            }
        };
        Ok(row)
    }

    pub async fn find_by_id(pool: &PgPool, id: &Uuid) -> Result<Self> {
        sqlx::query_as::<_, CartItem>(
            r#"
            SELECT id, product_id, customer_id, session_id, quantity,
                   unit_price, dosage, instructions, expires_at, added_at
            FROM cart_items
            WHERE id = $1 AND expires_at > NOW()
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("cart item not found".to_string()),
            _ => AppError::from(e),
        })
    }

    pub async fn insert(
        pool: &PgPool,
        owner: &CartOwner,
        product_id: Uuid,
        quantity: i32,
        unit_price: f64,
        dosage: Option<String>,
        instructions: Option<String>,
        ttl_hours: i64,
    ) -> Result<Self> {
        sqlx::query_as::<_, CartItem>(
            r#"
            INSERT INTO cart_items (
                product_id, customer_id, session_id, quantity, unit_price,
                dosage, instructions, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW() + ($8 || ' hours')::interval)
            RETURNING id, product_id, customer_id, session_id, quantity,
                      unit_price, dosage, instructions, expires_at, added_at
            "#,
        )
        .bind(product_id)
        .bind(owner.customer_id())
        .bind(owner.session_id())
        .bind(quantity)
        .bind(unit_price)
        .bind(dosage)
        .bind(instructions)
        .bind(ttl_hours.to_string())
        .fetch_one(pool)
        .await
        .map_err(AppError::from)
    }

    pub async fn increment_quantity(pool: &PgPool, id: &Uuid, by: i32) -> Result<Self> {
        sqlx::query_as::<_, CartItem>(
            r#"
            UPDATE cart_items SET quantity = quantity + $1
            WHERE id = $2
            RETURNING id, product_id, customer_id, session_id, quantity,
                      unit_price, dosage, instructions, expires_at, added_at
            "#,
        )
        .bind(by)
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(AppError::from)
    }

    pub async fn set_quantity(pool: &PgPool, id: &Uuid, quantity: i32) -> Result<Self> {
        sqlx::query_as::<_, CartItem>(
            r#"
            UPDATE cart_items SET quantity = $1
            WHERE id = $2
            RETURNING id, product_id, customer_id, session_id, quantity,
                      unit_price, dosage, instructions, expires_at, added_at
            "#,
        )
        .bind(quantity)
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("cart item not found".to_string()),
            _ => AppError::from(e),
        })
    }

    pub async fn remove(pool: &PgPool, id: &Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("cart item not found".to_string()));
        }
        Ok(())
    }

    /// Same as `remove`, but against an open transaction — used by checkout
    /// so consuming the cart commits or rolls back with the order and stock.
    pub async fn remove_tx(tx: &mut Transaction<'_, Postgres>, id: &Uuid) -> Result<()> {
        sqlx::query("DELETE FROM cart_items WHERE id = $1").bind(id).execute(&mut **tx).await?;
        Ok(())
    }

    pub async fn clear(pool: &PgPool, owner: &CartOwner) -> Result<u64> {
        let result = match owner {
            CartOwner::Customer(id) => {
                sqlx::query("DELETE FROM cart_items WHERE customer_id = $1")
                    .bind(id)
                    .execute(pool)
                    .await?
            }
            CartOwner::Session(session) => {
                sqlx::query("DELETE FROM cart_items WHERE session_id = $1")
                    .bind(session)
                    .execute(pool)
                    .await?
            }
        };
        Ok(result.rows_affected())
    }

    /// Delete cart items whose expiry has elapsed, run on a ticker by the background sweeper.
    pub async fn purge_expired(pool: &PgPool) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cart_items WHERE expires_at <= NOW()")
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CartSummary {
    pub items: Vec<CartItemView>,
    pub total_items: i64,
    pub item_count: i32,
    pub total_amount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: f64,
    pub line_total: f64,
    pub dosage: Option<String>,
    pub instructions: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_from_parts_customer_only() {
        let id = Uuid::new_v4();
        let owner = CartOwner::from_parts(Some(id), None).unwrap();
        assert_eq!(owner, CartOwner::Customer(id));
    }

    #[test]
    fn test_owner_from_parts_session_only() {
        let owner = CartOwner::from_parts(None, Some("guest-123".to_string())).unwrap();
        assert_eq!(owner, CartOwner::Session("guest-123".to_string()));
    }

    #[test]
    fn test_owner_from_parts_neither_is_error() {
        assert!(CartOwner::from_parts(None, None).is_err());
    }

    #[test]
    fn test_owner_from_parts_both_is_error() {
        assert!(CartOwner::from_parts(Some(Uuid::new_v4()), Some("s".to_string())).is_err());
    }

    #[test]
    fn test_line_total() {
        let item = CartItem {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            customer_id: None,
            session_id: Some("s".to_string()),
            quantity: 3,
            unit_price: 12.5,
            dosage: None,
            instructions: None,
            expires_at: Utc::now() + chrono::Duration::hours(1),
            added_at: Utc::now(),
        };
        assert_eq!(item.line_total(), 37.5);
        assert!(!item.is_expired());
    }
}
