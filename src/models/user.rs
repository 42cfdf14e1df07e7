/*!
 * User Model
 *
 * Staff accounts: administrators, managers, pharmacists, and assistants.
 * Authentication and lockout state live here; see `services::auth_service`
 * for the login flow that drives `is_locked`/`increment_failed_login`.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::utils::{AppError, Result};

/// Staff role. Drives the static authorization matrix in
/// `services::authorization` — there is no per-user permission override.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "VARCHAR", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[sqlx(rename = "ADMIN")]
    Admin,
    #[sqlx(rename = "MANAGER")]
    Manager,
    #[sqlx(rename = "PHARMACIST")]
    Pharmacist,
    #[sqlx(rename = "ASSISTANT")]
    Assistant,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "ADMIN"),
            UserRole::Manager => write!(f, "MANAGER"),
            UserRole::Pharmacist => write!(f, "PHARMACIST"),
            UserRole::Assistant => write!(f, "ASSISTANT"),
        }
    }
}

/// A staff user account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub failed_login_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

impl User {
    /// Find a user by username, case-insensitively.
    pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Self> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role, is_active,
                   last_login, failed_login_attempts, locked_until,
                   created_at, updated_at, created_by
            FROM users
            WHERE LOWER(username) = LOWER($1)
            "#,
        )
        .bind(username)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("user not found".to_string()),
            _ => AppError::from(e),
        })
    }

    pub async fn find_by_id(pool: &PgPool, user_id: &Uuid) -> Result<Self> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role, is_active,
                   last_login, failed_login_attempts, locked_until,
                   created_at, updated_at, created_by
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("user not found".to_string()),
            _ => AppError::from(e),
        })
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Self> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role, is_active,
                   last_login, failed_login_attempts, locked_until,
                   created_at, updated_at, created_by
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("user not found".to_string()),
            _ => AppError::from(e),
        })
    }

    /// True if a previous failed-login lockout is still in effect.
    pub fn is_locked(&self) -> bool {
        self.locked_until.map(|until| until > Utc::now()).unwrap_or(false)
    }

    pub async fn count(pool: &PgPool) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// List staff accounts newest-first. No soft-delete filter — deactivation only flips `is_active`.
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role, is_active,
                   last_login, failed_login_attempts, locked_until,
                   created_at, updated_at, created_by
            FROM users
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

    /// Create a staff account (admin endpoint or bootstrap default-admin).
    /// `password_hash` must already be hashed.
    pub async fn create(
        pool: &PgPool,
        username: &str,
        email: &str,
        password_hash: &str,
        role: UserRole,
        created_by: Option<Uuid>,
    ) -> Result<Self> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, role, is_active, created_by)
            VALUES ($1, $2, $3, $4, true, $5)
            RETURNING id, username, email, password_hash, role, is_active,
                      last_login, failed_login_attempts, locked_until,
                      created_at, updated_at, created_by
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .bind(created_by)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.constraint().is_some() => {
                AppError::Conflict("username or email already in use".to_string())
            }
            _ => AppError::from(e),
        })
    }

    /// Soft-deactivate/reactivate a staff account. Does not remove the row.
    pub async fn set_active(pool: &PgPool, user_id: &Uuid, is_active: bool) -> Result<Self> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_active = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, username, email, password_hash, role, is_active,
                      last_login, failed_login_attempts, locked_until,
                      created_at, updated_at, created_by
            "#,
        )
        .bind(is_active)
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("user not found".to_string()),
            _ => AppError::from(e),
        })
    }

    /// Reset lockout state and record a successful login.
    pub async fn record_successful_login(&self, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET last_login = NOW(),
                failed_login_attempts = 0,
                locked_until = NULL,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(self.id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Atomically increment the failed-login counter and apply a lockout
    /// once `max_attempts` is reached. Runs inside its own transaction with
    /// a row lock so concurrent failed attempts against the same account
    /// cannot race past the threshold.
    pub async fn record_failed_login(
        pool: &PgPool,
        user_id: &Uuid,
        max_attempts: u32,
        lockout_minutes: i64,
    ) -> Result<i32> {
        let mut tx = pool.begin().await?;

        let (current,): (i32,) =
            sqlx::query_as("SELECT failed_login_attempts FROM users WHERE id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;

        let new_attempts = current + 1;
        let locked_until = if new_attempts >= max_attempts as i32 {
            Some(Utc::now() + chrono::Duration::minutes(lockout_minutes))
        } else {
            None
        };

        sqlx::query(
            r#"
            UPDATE users
            SET failed_login_attempts = $1,
                locked_until = COALESCE($2, locked_until),
                updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(new_attempts)
        .bind(locked_until)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(new_attempts)
    }
}

/// User data transfer object for safe serialization (without the password hash).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            is_active: user.is_active,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}
