//! User entity and repository
//!
//! The narrow persistence interface the auth subsystem depends on: lookups
//! by email/id for the gate and login, plus the mutations the verification
//! and password-reset flows delegate here.

use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use herodex_shared::AccountStatus;

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone: Option<String>,
    pub is_verified: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub verified_at: Option<OffsetDateTime>,
    pub status: AccountStatus,
    pub role: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Fields required to insert a new account
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

const USER_COLUMNS: &str = "id, first_name, last_name, username, email, password_hash, \
     phone, is_verified, verified_at, status, role, created_at";

/// Repository over the `users` table
#[derive(Clone)]
pub struct UserRepo {
    pool: PgPool,
}

impl UserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_email(&self, email: &str) -> ApiResult<User> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ApiError::UserNotFound)
    }

    pub async fn get_by_id(&self, id: Uuid) -> ApiResult<User> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ApiError::UserNotFound)
    }

    pub async fn email_exists(&self, email: &str) -> ApiResult<bool> {
        let exists: Option<(bool,)> =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email.to_lowercase())
                .fetch_optional(&self.pool)
                .await?;
        Ok(exists.map(|r| r.0).unwrap_or(false))
    }

    pub async fn username_exists(&self, username: &str) -> ApiResult<bool> {
        let exists: Option<(bool,)> =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        Ok(exists.map(|r| r.0).unwrap_or(false))
    }

    /// Insert a new unverified account with the default role.
    pub async fn create(&self, new_user: NewUser) -> ApiResult<User> {
        let query = format!(
            r#"
            INSERT INTO users (id, first_name, last_name, username, email, password_hash, status, role)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending', 'USER')
            RETURNING {USER_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(&new_user.first_name)
            .bind(&new_user.last_name)
            .bind(&new_user.username)
            .bind(new_user.email.to_lowercase())
            .bind(&new_user.password_hash)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!(user_id = %user.id, "User account created");
        Ok(user)
    }

    /// Flip the verification flags and activate the account.
    pub async fn mark_verified(&self, id: Uuid) -> ApiResult<User> {
        let query = format!(
            r#"
            UPDATE users
            SET is_verified = TRUE, verified_at = NOW(), status = 'active'
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ApiError::UserNotFound)?;

        tracing::info!(user_id = %id, "User verified");
        Ok(user)
    }

    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> ApiResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::UserNotFound);
        }
        tracing::info!(user_id = %id, "Password updated");
        Ok(())
    }

    pub async fn update_profile(
        &self,
        id: Uuid,
        first_name: Option<&str>,
        last_name: Option<&str>,
        phone: Option<&str>,
    ) -> ApiResult<User> {
        let query = format!(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone = COALESCE($4, phone)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(first_name)
            .bind(last_name)
            .bind(phone)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ApiError::UserNotFound)
    }

    pub async fn list(&self, limit: i64, offset: i64, search: Option<&str>) -> ApiResult<Vec<User>> {
        let query = format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE ($3::text IS NULL OR email ILIKE '%' || $3 || '%' OR username ILIKE '%' || $3 || '%')
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        );
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(limit)
            .bind(offset)
            .bind(search)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn delete(&self, id: Uuid) -> ApiResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::UserNotFound);
        }
        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }
}
