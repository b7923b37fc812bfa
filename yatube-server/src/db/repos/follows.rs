//! Follow repository
//!
//! A (follower, author) pair exists at most once and nobody follows
//! themselves; both rules are enforced by the schema, so follow and unfollow
//! are plain idempotent writes.

use sqlx::SqlitePool;

use super::DbError;

/// Follow repository
pub struct FollowRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FollowRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Follow `author_id`. Returns whether a new row was created.
    pub async fn follow(&self, user_id: i64, author_id: i64) -> Result<bool, DbError> {
        if user_id == author_id {
            return Ok(false);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO follows (user_id, author_id)
            VALUES (?, ?)
            ON CONFLICT (user_id, author_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(author_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Stop following `author_id`. Returns whether a row was removed.
    pub async fn unfollow(&self, user_id: i64, author_id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM follows WHERE user_id = ? AND author_id = ?")
            .bind(user_id)
            .bind(author_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool, DbError> {
        Ok(sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE user_id = ? AND author_id = ?)",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(self.pool)
        .await?)
    }

    /// How many users follow `author_id`.
    pub async fn follower_count(&self, author_id: i64) -> Result<i64, DbError> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE author_id = ?")
                .bind(author_id)
                .fetch_one(self.pool)
                .await?,
        )
    }

    /// How many authors `user_id` follows.
    pub async fn following_count(&self, user_id: i64) -> Result<i64, DbError> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(self.pool)
                .await?,
        )
    }
}
