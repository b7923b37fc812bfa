//! Route handlers organized by resource

pub mod about;
pub mod accounts;
pub mod groups;
pub mod health;
pub mod posts;
pub mod profiles;

use axum::http::Uri;
use serde::Serialize;

use super::error::AppError;
use crate::db::User;

/// A user shown as the author of a page
#[derive(Serialize)]
pub(crate) struct AuthorView<'a> {
    #[serde(flatten)]
    user: &'a User,
    display_name: String,
}

impl<'a> AuthorView<'a> {
    pub(crate) fn new(user: &'a User) -> Self {
        Self {
            display_name: user.display_name(),
            user,
        }
    }
}

/// Post ids in URLs are integers; anything else is a missing page.
pub(crate) fn parse_post_id(raw: &str) -> Result<i64, AppError> {
    raw.parse().map_err(|_| AppError::NotFound {
        resource: "post",
        id: raw.to_owned(),
    })
}

/// Fallback for unmatched routes
pub async fn page_not_found(uri: Uri) -> AppError {
    AppError::NotFound {
        resource: "page",
        id: uri.path().to_owned(),
    }
}
