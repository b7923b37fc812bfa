//! Post feed, post pages, publishing, editing and comments

use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::Response;
use axum::{routing::get, Form, Router};

use super::{parse_post_id, AuthorView};
use crate::cache::PageCache;
use crate::db::{
    CommentRepo, FollowRepo, GroupRepo, ImageUpdate, NewPost, PostCard, PostRepo, User, UserRepo,
};
use crate::http::error::AppError;
use crate::http::extractors::{MaybeUser, RequireUser};
use crate::http::forms::{
    comment_fields, post_fields, CommentSubmission, FormView, PostFormValues,
    PostSubmission, ValidPost,
};
use crate::http::render::{found, page_response, post_url, View};
use crate::media::new_post_image_path;
use crate::models::{PaginationParams, Paginator, POSTS_PER_PAGE};
use crate::state::AppState;

/// GET /
///
/// Served from the page cache while a rendered copy is fresh.
async fn index(
    State(state): State<AppState>,
    viewer: MaybeUser,
    uri: Uri,
    Query(params): Query<PaginationParams>,
) -> Result<Response, AppError> {
    let request_uri = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let key = PageCache::key(request_uri, viewer.id());

    if let Some(page) = state.index_cache().get(&key) {
        tracing::debug!(%key, "index served from cache");
        return Ok(page_response(StatusCode::OK, page));
    }

    let page = PostRepo::new(state.pool())
        .list_all(Paginator::new(POSTS_PER_PAGE), params.raw())
        .await?;

    let rendered = View::new("index.html")
        .insert("page", &page)
        .render_page(state.templates(), viewer.user())?;

    state.index_cache().put(key, rendered.clone());
    Ok(page_response(StatusCode::OK, rendered))
}

/// Render the create/edit form.
fn render_post_form(
    state: &AppState,
    viewer: &User,
    form: FormView,
    editing: Option<&PostCard>,
) -> Result<Response, AppError> {
    View::new("new_post.html")
        .insert("form", &form.multipart())
        .insert("is_edit", &editing.is_some())
        .insert("post", &editing)
        .render(state.templates(), Some(viewer))
}

/// GET /new
async fn new_post_form(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
) -> Result<Response, AppError> {
    let groups = GroupRepo::new(state.pool()).list().await?;
    let form = FormView::unbound(post_fields(&groups, &PostFormValues::default()));
    render_post_form(&state, &viewer.user, form, None)
}

/// Store an uploaded image, returning its media path.
async fn store_image(state: &AppState, valid: &ValidPost) -> Result<Option<String>, AppError> {
    match &valid.image {
        Some((kind, bytes)) => {
            let path = new_post_image_path(*kind);
            state.media().save(&path, bytes).await?;
            Ok(Some(path))
        }
        None => Ok(None),
    }
}

/// Best-effort removal of an image that is no longer referenced.
async fn discard_image(state: &AppState, path: Option<&str>) {
    if let Some(path) = path {
        if let Err(e) = state.media().delete(path).await {
            tracing::warn!(path, "failed to remove image: {}", e);
        }
    }
}

/// POST /new
async fn create_post(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
    submission: PostSubmission,
) -> Result<Response, AppError> {
    let groups = GroupRepo::new(state.pool()).list().await?;

    let valid = match submission.validate(&groups) {
        Ok(valid) => valid,
        Err(errors) => {
            let fields = post_fields(&groups, &PostFormValues::from(&submission));
            return render_post_form(&state, &viewer.user, FormView::bound(fields, &errors), None);
        }
    };

    let image = store_image(&state, &valid).await?;
    let created = PostRepo::new(state.pool())
        .create(NewPost {
            author_id: viewer.user.id,
            text: valid.text,
            group_id: valid.group_id,
            image: image.clone(),
        })
        .await;
    let post = match created {
        Ok(post) => post,
        Err(e) => {
            discard_image(&state, image.as_deref()).await;
            return Err(e.into());
        }
    };

    tracing::info!(post_id = post.id, author = %viewer.user.username, "post published");
    Ok(found("/"))
}

/// Look up a post under its author's username.
async fn author_and_post(
    state: &AppState,
    username: &str,
    raw_post_id: &str,
) -> Result<(User, PostCard), AppError> {
    let author = UserRepo::new(state.pool()).get_by_username(username).await?;
    let post_id = parse_post_id(raw_post_id)?;
    let post = PostRepo::new(state.pool())
        .get_for_author(author.id, post_id)
        .await?;
    Ok((author, post))
}

/// GET /{username}/{post_id}/
async fn post_view(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path((username, post_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let (author, post) = author_and_post(&state, &username, &post_id).await?;

    let posts_count = PostRepo::new(state.pool()).count_for_author(author.id).await?;
    let comments = CommentRepo::new(state.pool()).list_for_post(post.id).await?;
    let following = match viewer.id() {
        Some(id) => FollowRepo::new(state.pool()).is_following(id, author.id).await?,
        None => false,
    };

    View::new("post.html")
        .insert("author", &AuthorView::new(&author))
        .insert("post", &post)
        .insert("posts_count", &posts_count)
        .insert("comments", &comments)
        .insert("following", &following)
        .insert("form", &FormView::unbound(comment_fields()))
        .render(state.templates(), viewer.user())
}

/// GET /{username}/{post_id}/edit/
///
/// Anyone but the author is sent back to the post page.
async fn edit_form(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
    Path((username, post_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let (author, post) = author_and_post(&state, &username, &post_id).await?;
    if viewer.user.id != author.id {
        return Ok(found(&post_url(&author.username, post.id)));
    }

    let groups = GroupRepo::new(state.pool()).list().await?;
    let form = FormView::unbound(post_fields(&groups, &PostFormValues::from(&post)));
    render_post_form(&state, &viewer.user, form, Some(&post))
}

/// POST /{username}/{post_id}/edit/
async fn update_post(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
    Path((username, post_id)): Path<(String, String)>,
    submission: PostSubmission,
) -> Result<Response, AppError> {
    let (author, post) = author_and_post(&state, &username, &post_id).await?;
    let target = post_url(&author.username, post.id);
    if viewer.user.id != author.id {
        return Ok(found(&target));
    }

    let groups = GroupRepo::new(state.pool()).list().await?;
    let valid = match submission.validate(&groups) {
        Ok(valid) => valid,
        Err(errors) => {
            let mut values = PostFormValues::from(&submission);
            values.current_image = post.image.clone();
            let form = FormView::bound(post_fields(&groups, &values), &errors);
            return render_post_form(&state, &viewer.user, form, Some(&post));
        }
    };

    let stored = store_image(&state, &valid).await?;
    let update = match &stored {
        Some(path) => ImageUpdate::Replace(path.clone()),
        None if valid.image_clear => ImageUpdate::Clear,
        None => ImageUpdate::Keep,
    };
    let replaces_image = update != ImageUpdate::Keep;

    let updated = PostRepo::new(state.pool())
        .update(post.id, &valid.text, valid.group_id, update)
        .await;
    if let Err(e) = updated {
        discard_image(&state, stored.as_deref()).await;
        return Err(e.into());
    }

    if replaces_image {
        discard_image(&state, post.image.as_deref()).await;
    }

    tracing::info!(post_id = post.id, "post edited");
    Ok(found(&target))
}

/// POST /{username}/{post_id}/comment
///
/// Invalid comments are dropped; the reader always lands back on the post.
async fn add_comment(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
    Path((username, post_id)): Path<(String, String)>,
    Form(submission): Form<CommentSubmission>,
) -> Result<Response, AppError> {
    let (author, post) = author_and_post(&state, &username, &post_id).await?;

    match submission.validate() {
        Ok(text) => {
            let comment = CommentRepo::new(state.pool())
                .create(post.id, viewer.user.id, &text)
                .await?;
            tracing::debug!(comment_id = comment.id, post_id = post.id, "comment added");
        }
        Err(errors) => tracing::debug!(?errors, "comment rejected"),
    }

    Ok(found(&post_url(&author.username, post.id)))
}

/// GET /{username}/{post_id}/comment
async fn comment_redirect(
    State(state): State<AppState>,
    RequireUser(_viewer): RequireUser,
    Path((username, post_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let (author, post) = author_and_post(&state, &username, &post_id).await?;
    Ok(found(&post_url(&author.username, post.id)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/new", get(new_post_form).post(create_post))
        .route("/{username}/{post_id}/", get(post_view))
        .route("/{username}/{post_id}/edit/", get(edit_form).post(update_post))
        .route(
            "/{username}/{post_id}/comment",
            get(comment_redirect).post(add_comment),
        )
}
