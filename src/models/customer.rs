/*!
 * Customer Model
 *
 * Pharmacy customers. Government-ID numbers and medical history are
 * encrypted at rest via the transparent `EncryptedString`/`EncryptedStringList`
 * carriers; discount eligibility flags drive checkout pricing.
 */

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::crypto::{EncryptedString, EncryptedStringList};
use crate::utils::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub medical_history: EncryptedStringList,
    pub allergies: EncryptedStringList,
    pub current_medications: EncryptedStringList,
    pub insurance_id: Option<EncryptedString>,
    pub senior_citizen_id: Option<EncryptedString>,
    pub pwd_id: Option<EncryptedString>,
    pub is_senior_citizen: bool,
    pub is_pwd: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Discount rate applicable at checkout. Senior Citizen takes priority
    /// over PWD when both are set, but both carry the same 20% rate
    ///.
    pub fn discount_rate(&self) -> f64 {
        if self.is_senior_citizen || self.is_pwd {
            0.20
        } else {
            0.0
        }
    }

    pub async fn find_by_id(pool: &PgPool, id: &Uuid) -> Result<Self> {
        sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, first_name, last_name, email, phone, date_of_birth,
                   medical_history, allergies, current_medications,
                   insurance_id, senior_citizen_id, pwd_id,
                   is_senior_citizen, is_pwd, is_active,
                   created_at, updated_at, deleted_at, created_by, updated_by
            FROM customers
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("customer not found".to_string()),
            _ => AppError::from(e),
        })
    }

    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, first_name, last_name, email, phone, date_of_birth,
                   medical_history, allergies, current_medications,
                   insurance_id, senior_citizen_id, pwd_id,
                   is_senior_citizen, is_pwd, is_active,
                   created_at, updated_at, deleted_at, created_by, updated_by
            FROM customers
            WHERE deleted_at IS NULL
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

    pub async fn count(pool: &PgPool) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE deleted_at IS NULL")
                .fetch_one(pool)
                .await?;
        Ok(count)
    }

    pub async fn create(pool: &PgPool, req: CreateCustomerRequest, actor: Uuid) -> Result<Self> {
        sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (
                first_name, last_name, email, phone, date_of_birth,
                medical_history, allergies, current_medications,
                insurance_id, senior_citizen_id, pwd_id,
                is_senior_citizen, is_pwd, is_active, created_by, updated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, true, $14, $14)
            RETURNING id, first_name, last_name, email, phone, date_of_birth,
                      medical_history, allergies, current_medications,
                      insurance_id, senior_citizen_id, pwd_id,
                      is_senior_citizen, is_pwd, is_active,
                      created_at, updated_at, deleted_at, created_by, updated_by
            "#,
        )
        .bind(req.first_name)
        .bind(req.last_name)
        .bind(req.email)
        .bind(req.phone)
        .bind(req.date_of_birth)
        .bind(EncryptedStringList::new(req.medical_history))
        .bind(EncryptedStringList::new(req.allergies))
        .bind(EncryptedStringList::new(req.current_medications))
        .bind(req.insurance_id.map(EncryptedString::new))
        .bind(req.senior_citizen_id.map(EncryptedString::new))
        .bind(req.pwd_id.map(EncryptedString::new))
        .bind(req.is_senior_citizen)
        .bind(req.is_pwd)
        .bind(actor)
        .fetch_one(pool)
        .await
        .map_err(AppError::from)
    }

    pub async fn update(
        pool: &PgPool,
        id: &Uuid,
        req: UpdateCustomerRequest,
        actor: Uuid,
    ) -> Result<Self> {
        let existing = Self::find_by_id(pool, id).await?;

        sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET
                first_name = $1, last_name = $2, email = $3, phone = $4,
                date_of_birth = $5, medical_history = $6, allergies = $7,
                current_medications = $8, insurance_id = $9,
                senior_citizen_id = $10, pwd_id = $11,
                is_senior_citizen = $12, is_pwd = $13,
                updated_at = NOW(), updated_by = $14
            WHERE id = $15 AND deleted_at IS NULL
            RETURNING id, first_name, last_name, email, phone, date_of_birth,
                      medical_history, allergies, current_medications,
                      insurance_id, senior_citizen_id, pwd_id,
                      is_senior_citizen, is_pwd, is_active,
                      created_at, updated_at, deleted_at, created_by, updated_by
            "#,
        )
        .bind(req.first_name.unwrap_or(existing.first_name))
        .bind(req.last_name.unwrap_or(existing.last_name))
        .bind(req.email.or(existing.email))
        .bind(req.phone.or(existing.phone))
        .bind(req.date_of_birth.or(existing.date_of_birth))
        .bind(EncryptedStringList::new(
            req.medical_history.unwrap_or_else(|| existing.medical_history.into_inner()),
        ))
        .bind(EncryptedStringList::new(
            req.allergies.unwrap_or_else(|| existing.allergies.into_inner()),
        ))
        .bind(EncryptedStringList::new(
            req.current_medications
                .unwrap_or_else(|| existing.current_medications.into_inner()),
        ))
        .bind(
            req.insurance_id
                .map(EncryptedString::new)
                .or(existing.insurance_id),
        )
        .bind(
            req.senior_citizen_id
                .map(EncryptedString::new)
                .or(existing.senior_citizen_id),
        )
        .bind(req.pwd_id.map(EncryptedString::new).or(existing.pwd_id))
        .bind(req.is_senior_citizen.unwrap_or(existing.is_senior_citizen))
        .bind(req.is_pwd.unwrap_or(existing.is_pwd))
        .bind(actor)
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("customer not found".to_string()),
            _ => AppError::from(e),
        })
    }

    pub async fn soft_delete(pool: &PgPool, id: &Uuid, actor: Uuid) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE customers
            SET deleted_at = NOW(), is_active = false, updated_at = NOW(), updated_by = $1
            WHERE id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(actor)
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("customer not found".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub medical_history: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub current_medications: Vec<String>,
    pub insurance_id: Option<String>,
    pub senior_citizen_id: Option<String>,
    pub pwd_id: Option<String>,
    #[serde(default)]
    pub is_senior_citizen: bool,
    #[serde(default)]
    pub is_pwd: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateCustomerRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub medical_history: Option<Vec<String>>,
    pub allergies: Option<Vec<String>>,
    pub current_medications: Option<Vec<String>>,
    pub insurance_id: Option<String>,
    pub senior_citizen_id: Option<String>,
    pub pwd_id: Option<String>,
    pub is_senior_citizen: Option<bool>,
    pub is_pwd: Option<bool>,
}

/// Customer summary as used by cart/order services, derived
/// from either a registered customer or the guest identity triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub id: Option<Uuid>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_senior_citizen: bool,
    pub is_pwd: bool,
}

impl From<&Customer> for CustomerSummary {
    fn from(c: &Customer) -> Self {
        Self {
            id: Some(c.id),
            name: c.full_name(),
            email: c.email.clone(),
            phone: c.phone.clone(),
            is_senior_citizen: c.is_senior_citizen,
            is_pwd: c.is_pwd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(senior: bool, pwd: bool) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            first_name: "Jane".to_string(),
            last_name: "Dela Cruz".to_string(),
            email: None,
            phone: None,
            date_of_birth: None,
            medical_history: EncryptedStringList::new(vec![]),
            allergies: EncryptedStringList::new(vec![]),
            current_medications: EncryptedStringList::new(vec![]),
            insurance_id: None,
            senior_citizen_id: None,
            pwd_id: None,
            is_senior_citizen: senior,
            is_pwd: pwd,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
            created_by: None,
            updated_by: None,
        }
    }

    #[test]
    fn test_discount_rate_none() {
        assert_eq!(sample(false, false).discount_rate(), 0.0);
    }

    #[test]
    fn test_discount_rate_senior_or_pwd() {
        assert_eq!(sample(true, false).discount_rate(), 0.20);
        assert_eq!(sample(false, true).discount_rate(), 0.20);
    }

    #[test]
    fn test_discount_rate_both_flags_same_rate() {
        // Senior takes priority over PWD, but both are 20% so the amount
        // is identical either way.
        assert_eq!(sample(true, true).discount_rate(), 0.20);
    }

    #[test]
    fn test_full_name() {
        assert_eq!(sample(false, false).full_name(), "Jane Dela Cruz");
    }
}
