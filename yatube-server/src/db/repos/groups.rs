//! Group repository

use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use super::DbError;
use crate::models::{GroupSlug, GroupTitle};

/// Group record from database
#[derive(Debug, Clone, FromRow, Serialize, PartialEq, Eq)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

/// Group repository
pub struct GroupRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> GroupRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a group. A taken slug is reported as `Conflict`.
    pub async fn create(
        &self,
        slug: &GroupSlug,
        title: &GroupTitle,
        description: &str,
    ) -> Result<Group, DbError> {
        sqlx::query_as(
            r#"
            INSERT INTO post_groups (title, slug, description)
            VALUES (?, ?, ?)
            RETURNING id, title, slug, description
            "#,
        )
        .bind(title.as_str())
        .bind(slug.as_str())
        .bind(description)
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::from_insert(e, "group", slug.as_str()))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Group, DbError> {
        sqlx::query_as("SELECT id, title, slug, description FROM post_groups WHERE slug = ?")
            .bind(slug)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("group", slug))
    }

    /// All groups, alphabetically. Feeds the group choice on the post form.
    pub async fn list(&self) -> Result<Vec<Group>, DbError> {
        Ok(
            sqlx::query_as("SELECT id, title, slug, description FROM post_groups ORDER BY title, id")
                .fetch_all(self.pool)
                .await?,
        )
    }

    /// Delete a group. Its posts stay, detached from any group.
    pub async fn delete(&self, slug: &str) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM post_groups WHERE slug = ?")
            .bind(slug)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("group", slug));
        }
        Ok(())
    }
}
