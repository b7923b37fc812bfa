//! Handler error type with IntoResponse
//!
//! Errors become responses with the right status code. Not-found and
//! internal errors are tagged with an [`ErrorPage`] extension; the
//! [`error_pages`] middleware swaps the body for the `misc/404.html` or
//! `misc/500.html` template, since rendering needs state that
//! `IntoResponse` does not have.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::render::View;
use crate::db::DbError;
use crate::models::ValidationError;
use crate::state::AppState;

/// Handler error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum AppError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Malformed request body (400)
    BadRequest { message: String },

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Unique constraint hit (409)
    Conflict { resource: &'static str, id: String },

    /// Database error (500, logged)
    Database(DbError),

    /// Template failed to render (500, logged)
    Template(tera::Error),

    /// Media storage failed (500, logged)
    Media(std::io::Error),
}

/// Marks a response whose body should be replaced by an error template
#[derive(Debug, Clone, Copy)]
pub struct ErrorPage;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Database(_) | Self::Template(_) | Self::Media(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn bad_request(message: impl ToString) -> Self {
        Self::BadRequest {
            message: message.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Validation(e) => e.to_string(),
            Self::BadRequest { message } => message.clone(),
            Self::NotFound { resource, id } => format!("{} '{}' not found", resource, id),
            Self::Conflict { resource, id } => format!("{} '{}' already exists", resource, id),
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!("Database error: {}", e);
                "an internal error occurred".to_string()
            }
            Self::Template(e) => {
                tracing::error!("Template error: {:?}", e);
                "an internal error occurred".to_string()
            }
            Self::Media(e) => {
                tracing::error!("Media storage error: {}", e);
                "an internal error occurred".to_string()
            }
        };

        let mut response = (status, message).into_response();
        if status == StatusCode::NOT_FOUND || status.is_server_error() {
            response.extensions_mut().insert(ErrorPage);
        }
        response
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for AppError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::Conflict { resource, id } => Self::Conflict { resource, id },
            _ => Self::Database(e),
        }
    }
}

impl From<tera::Error> for AppError {
    fn from(e: tera::Error) -> Self {
        Self::Template(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        Self::Media(e)
    }
}

/// Render `misc/404.html` / `misc/500.html` for responses tagged [`ErrorPage`].
pub async fn error_pages(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let response = next.run(request).await;

    if response.extensions().get::<ErrorPage>().is_none() {
        return response;
    }

    let status = response.status();
    let view = if status == StatusCode::NOT_FOUND {
        View::new("misc/404.html").insert("path", &path)
    } else {
        View::new("misc/500.html")
    };

    match view.status(status).render(state.templates(), None) {
        Ok(page) => page,
        Err(e) => {
            tracing::error!("Failed to render error page: {:?}", e);
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_is_400() {
        let err = AppError::Validation(ValidationError::Empty { field: "text" });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.extensions().get::<ErrorPage>().is_none());
    }

    #[test]
    fn not_found_is_404_and_tagged() {
        let err = AppError::from(DbError::NotFound {
            resource: "post",
            id: "18273".into(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<ErrorPage>().is_some());
    }

    #[test]
    fn conflict_is_409() {
        let err = AppError::from(DbError::Conflict {
            resource: "group",
            id: "cats".into(),
        });
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn io_error_is_500_and_tagged() {
        let err = AppError::from(std::io::Error::other("disk full"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.extensions().get::<ErrorPage>().is_some());
    }
}
