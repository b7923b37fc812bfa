//! Community group pages

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::{routing::get, Router};

use crate::db::{GroupRepo, PostRepo};
use crate::http::error::AppError;
use crate::http::extractors::MaybeUser;
use crate::http::render::View;
use crate::models::{PaginationParams, Paginator, GROUP_POSTS_PER_PAGE};
use crate::state::AppState;

/// GET /group/{slug}/
async fn group_posts(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(slug): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Response, AppError> {
    let group = GroupRepo::new(state.pool()).get_by_slug(&slug).await?;
    let page = PostRepo::new(state.pool())
        .list_for_group(group.id, Paginator::new(GROUP_POSTS_PER_PAGE), params.raw())
        .await?;

    View::new("group.html")
        .insert("group", &group)
        .insert("posts", &page.object_list)
        .insert("page", &page)
        .render(state.templates(), viewer.user())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/group/{slug}/", get(group_posts))
}
