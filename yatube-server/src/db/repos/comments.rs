//! Comment repository

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use super::DbError;
use crate::models::CommentText;

/// Comment record from database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
    pub created: DateTime<Utc>,
}

/// Comment joined with its author's username
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CommentWithAuthor {
    pub id: i64,
    pub text: String,
    pub created: DateTime<Utc>,
    pub author_username: String,
}

/// Comment repository
pub struct CommentRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CommentRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Add a comment. A missing post surfaces as `NotFound`.
    pub async fn create(
        &self,
        post_id: i64,
        author_id: i64,
        text: &CommentText,
    ) -> Result<Comment, DbError> {
        let post_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?)")
            .bind(post_id)
            .fetch_one(self.pool)
            .await?;

        if !post_exists {
            return Err(DbError::not_found("post", post_id));
        }

        Ok(sqlx::query_as(
            r#"
            INSERT INTO comments (post_id, author_id, text, created)
            VALUES (?, ?, ?, ?)
            RETURNING id, post_id, author_id, text, created
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(text.as_str())
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?)
    }

    /// Comments on a post, oldest first.
    pub async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentWithAuthor>, DbError> {
        Ok(sqlx::query_as(
            r#"
            SELECT c.id, c.text, c.created, u.username AS author_username
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = ?
            ORDER BY c.created, c.id
            "#,
        )
        .bind(post_id)
        .fetch_all(self.pool)
        .await?)
    }
}
