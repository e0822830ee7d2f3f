// Credential store backed by the users table

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::auth::{error::AuthError, models::User};

/// User repository for credential and refresh token state
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user.
    ///
    /// Uniqueness is enforced by the database constraint, so a concurrent
    /// duplicate registration surfaces here as `UsernameTaken` rather than
    /// relying on a prior existence check.
    pub async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, AuthError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password_hash) VALUES ($1, $2) \
             RETURNING id, username, password_hash, refresh_token_hash, refresh_token_expires_at, created_at"
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AuthError::UsernameTaken;
                }
            }
            AuthError::DatabaseError(e.to_string())
        })?;

        Ok(user)
    }

    /// Find a user by username (exact, case-sensitive match)
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, refresh_token_hash, refresh_token_expires_at, created_at \
             FROM users WHERE username = $1"
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        Ok(user)
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: i32) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, refresh_token_hash, refresh_token_expires_at, created_at \
             FROM users WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        Ok(user)
    }

    /// Find the user currently holding a refresh token digest
    pub async fn find_by_refresh_token(&self, token_hash: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, refresh_token_hash, refresh_token_expires_at, created_at \
             FROM users WHERE refresh_token_hash = $1"
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        Ok(user)
    }

    /// Overwrite the stored refresh token digest (login path).
    /// No history is kept; the previous token is invalid from here on.
    pub async fn set_refresh_token(
        &self,
        user_id: i32,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        sqlx::query(
            "UPDATE users SET refresh_token_hash = $1, refresh_token_expires_at = $2 WHERE id = $3",
        )
        .bind(token_hash)
        .bind(expires_at)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    /// Swap the stored refresh token digest, conditional on the old value.
    ///
    /// The WHERE clause keys on the old digest, so of two concurrent
    /// rotations presenting the same token exactly one observes a row
    /// change; the loser sees `false` and is rejected without mutation.
    pub async fn rotate_refresh_token(
        &self,
        user_id: i32,
        old_token_hash: &str,
        new_token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AuthError> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token_hash = $1, refresh_token_expires_at = $2 \
             WHERE id = $3 AND refresh_token_hash = $4",
        )
        .bind(new_token_hash)
        .bind(expires_at)
        .bind(user_id)
        .bind(old_token_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    /// Clear the stored refresh token (revocation)
    pub async fn clear_refresh_token(&self, user_id: i32) -> Result<(), AuthError> {
        sqlx::query(
            "UPDATE users SET refresh_token_hash = NULL, refresh_token_expires_at = NULL WHERE id = $1",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}
