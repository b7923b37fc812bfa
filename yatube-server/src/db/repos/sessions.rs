//! Session repository - login sessions keyed by an opaque cookie token

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::{DbError, User};

/// Session repository
pub struct SessionRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SessionRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        token: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(token)
        .bind(user_id)
        .bind(Utc::now())
        .bind(expires_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// The user behind a live session. Expired tokens resolve to `None`.
    pub async fn user_for_token(&self, token: &str) -> Result<Option<User>, DbError> {
        Ok(sqlx::query_as(
            r#"
            SELECT u.id, u.username, u.first_name, u.last_name, u.email, u.password_hash, u.date_joined
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token = ? AND s.expires_at > ?
            "#,
        )
        .bind(token)
        .bind(Utc::now())
        .fetch_optional(self.pool)
        .await?)
    }

    pub async fn delete(&self, token: &str) -> Result<(), DbError> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Drop every session of `user_id` except `keep`. Used after a password change.
    pub async fn delete_others(&self, user_id: i64, keep: &str) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = ? AND token <> ?")
            .bind(user_id)
            .bind(keep)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn purge_expired(&self) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
