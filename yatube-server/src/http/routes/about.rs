//! Static "about" pages

use axum::extract::State;
use axum::response::Response;
use axum::{routing::get, Router};

use crate::http::error::AppError;
use crate::http::extractors::MaybeUser;
use crate::http::render::View;
use crate::state::AppState;

/// GET /about/author/
async fn author(State(state): State<AppState>, viewer: MaybeUser) -> Result<Response, AppError> {
    View::new("author.html").render(state.templates(), viewer.user())
}

/// GET /about/tech/
async fn tech(State(state): State<AppState>, viewer: MaybeUser) -> Result<Response, AppError> {
    View::new("tech.html").render(state.templates(), viewer.user())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/about/author/", get(author))
        .route("/about/tech/", get(tech))
}
