//! User repository

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use super::DbError;
use crate::models::Username;

/// User record from database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// "First Last", falling back to the username.
    pub fn display_name(&self) -> String {
        display_name(&self.username, &self.first_name, &self.last_name)
    }
}

pub(crate) fn display_name(username: &str, first_name: &str, last_name: &str) -> String {
    let full = format!("{} {}", first_name.trim(), last_name.trim());
    let full = full.trim();
    if full.is_empty() {
        username.to_owned()
    } else {
        full.to_owned()
    }
}

/// Fields for a new account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: Username,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// User repository
pub struct UserRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a user. A taken username is reported as `Conflict`.
    pub async fn create(&self, user: NewUser) -> Result<User, DbError> {
        sqlx::query_as(
            r#"
            INSERT INTO users (username, first_name, last_name, email, password_hash, date_joined)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, username, first_name, last_name, email, password_hash, date_joined
            "#,
        )
        .bind(user.username.as_str())
        .bind(user.first_name.trim())
        .bind(user.last_name.trim())
        .bind(user.email.trim())
        .bind(&user.password_hash)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::from_insert(e, "user", user.username.as_str()))
    }

    pub async fn get(&self, id: i64) -> Result<User, DbError> {
        sqlx::query_as(
            r#"
            SELECT id, username, first_name, last_name, email, password_hash, date_joined
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("user", id))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<User, DbError> {
        sqlx::query_as(
            r#"
            SELECT id, username, first_name, last_name, email, password_hash, date_joined
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("user", username))
    }

    pub async fn set_password(&self, id: i64, password_hash: &str) -> Result<(), DbError> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("user", id));
        }
        Ok(())
    }
}
