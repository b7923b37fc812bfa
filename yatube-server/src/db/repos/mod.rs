//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Uses JOINs for list operations (no N+1)
//! - Handles conflicts via UNIQUE constraints (no check-then-insert)
//! - Borrows the pool; construct one per request

pub mod comments;
pub mod follows;
pub mod groups;
pub mod posts;
pub mod sessions;
pub mod users;

pub use comments::{Comment, CommentRepo, CommentWithAuthor};
pub use follows::FollowRepo;
pub use groups::{Group, GroupRepo};
pub use posts::{AuthorRef, GroupRef, ImageUpdate, NewPost, Post, PostCard, PostRepo};
pub use sessions::SessionRepo;
pub use users::{NewUser, User, UserRepo};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("already exists: {resource} '{id}'")]
    Conflict { resource: &'static str, id: String },
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        Self::Sqlx(e)
    }
}

impl DbError {
    pub(crate) fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Turn a UNIQUE violation into `Conflict`, pass everything else through.
    pub(crate) fn from_insert(e: sqlx::Error, resource: &'static str, id: &str) -> Self {
        let unique = e
            .as_database_error()
            .map(|db| db.is_unique_violation())
            .unwrap_or(false);

        if unique {
            Self::Conflict {
                resource,
                id: id.to_owned(),
            }
        } else {
            Self::Sqlx(e)
        }
    }
}
