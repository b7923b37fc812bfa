//! Author profiles and subscriptions

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::{routing::get, Router};

use super::AuthorView;
use crate::db::{FollowRepo, PostRepo, UserRepo};
use crate::http::error::AppError;
use crate::http::extractors::{MaybeUser, RequireUser};
use crate::http::render::{found, profile_url, View};
use crate::models::{PaginationParams, Paginator, POSTS_PER_PAGE};
use crate::state::AppState;

/// GET /{username}/
async fn profile(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(username): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Response, AppError> {
    let author = UserRepo::new(state.pool()).get_by_username(&username).await?;
    let page = PostRepo::new(state.pool())
        .list_for_author(author.id, Paginator::new(POSTS_PER_PAGE), params.raw())
        .await?;

    let follows = FollowRepo::new(state.pool());
    let following = match viewer.id() {
        Some(id) => follows.is_following(id, author.id).await?,
        None => false,
    };
    let follower_count = follows.follower_count(author.id).await?;
    let following_count = follows.following_count(author.id).await?;

    View::new("profile.html")
        .insert("author", &AuthorView::new(&author))
        .insert("page", &page)
        .insert("post_count", &page.count)
        .insert("following", &following)
        .insert("follower_count", &follower_count)
        .insert("following_count", &following_count)
        .render(state.templates(), viewer.user())
}

/// GET /follow/
async fn follow_index(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
    Query(params): Query<PaginationParams>,
) -> Result<Response, AppError> {
    let page = PostRepo::new(state.pool())
        .list_for_follower(viewer.user.id, Paginator::new(POSTS_PER_PAGE), params.raw())
        .await?;

    View::new("follow.html")
        .insert("page", &page)
        .render(state.templates(), Some(&viewer.user))
}

/// GET /{username}/follow/
///
/// Following yourself or someone already followed changes nothing.
async fn profile_follow(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
    Path(username): Path<String>,
) -> Result<Response, AppError> {
    let author = UserRepo::new(state.pool()).get_by_username(&username).await?;
    let created = FollowRepo::new(state.pool())
        .follow(viewer.user.id, author.id)
        .await?;

    if created {
        tracing::info!(follower = %viewer.user.username, author = %author.username, "followed");
    }
    Ok(found(&profile_url(&author.username)))
}

/// GET /{username}/unfollow/
async fn profile_unfollow(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
    Path(username): Path<String>,
) -> Result<Response, AppError> {
    let author = UserRepo::new(state.pool()).get_by_username(&username).await?;
    let removed = FollowRepo::new(state.pool())
        .unfollow(viewer.user.id, author.id)
        .await?;

    if removed {
        tracing::info!(follower = %viewer.user.username, author = %author.username, "unfollowed");
    }
    Ok(found(&profile_url(&author.username)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/follow/", get(follow_index))
        .route("/{username}/", get(profile))
        .route("/{username}/follow/", get(profile_follow))
        .route("/{username}/unfollow/", get(profile_unfollow))
}
