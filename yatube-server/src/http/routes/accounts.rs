//! Sign up, log in, log out and password change under /auth/

use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::HeaderValue;
use axum::response::Response;
use axum::{routing::get, Form, Router};
use serde::Deserialize;

use crate::auth::{
    authenticate, clear_session_cookie, hash_password, session_cookie, start_session,
    verify_password,
};
use crate::db::{DbError, NewUser, SessionRepo, User, UserRepo};
use crate::http::error::AppError;
use crate::http::extractors::{safe_next, MaybeUser, RequireUser, LOGIN_URL};
use crate::http::forms::{
    login_fields, password_change_fields, signup_fields, FormErrors, FormView, LoginSubmission,
    PasswordChangeSubmission, SignupSubmission, MSG_BAD_CREDENTIALS, MSG_USERNAME_TAKEN,
    MSG_WRONG_OLD_PASSWORD,
};
use crate::http::render::{found, View};
use crate::state::AppState;

const PASSWORD_CHANGE_DONE_URL: &str = "/auth/password_change/done/";

fn with_cookie(mut response: Response, cookie: &str) -> Response {
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(e) => tracing::error!("unencodable Set-Cookie header: {}", e),
    }
    response
}

// ---------------------------------------------------------------------------
// Signup
// ---------------------------------------------------------------------------

fn render_signup(state: &AppState, viewer: Option<&User>, form: FormView) -> Result<Response, AppError> {
    View::new("users/signup.html")
        .insert("form", &form)
        .render(state.templates(), viewer)
}

/// GET /auth/signup/
async fn signup_form(State(state): State<AppState>, viewer: MaybeUser) -> Result<Response, AppError> {
    render_signup(&state, viewer.user(), FormView::unbound(signup_fields()))
}

/// POST /auth/signup/
async fn signup(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Form(submission): Form<SignupSubmission>,
) -> Result<Response, AppError> {
    let valid = match submission.validate() {
        Ok(valid) => valid,
        Err(errors) => {
            return render_signup(&state, viewer.user(), FormView::bound(submission.fields(), &errors));
        }
    };

    let created = UserRepo::new(state.pool())
        .create(NewUser {
            username: valid.username,
            password_hash: hash_password(valid.password.as_str()),
            first_name: submission.first_name.clone(),
            last_name: submission.last_name.clone(),
            email: submission.email.clone(),
        })
        .await;

    match created {
        Ok(user) => {
            tracing::info!(user_id = user.id, username = %user.username, "account created");
            Ok(found(LOGIN_URL))
        }
        Err(DbError::Conflict { .. }) => {
            let mut errors = FormErrors::default();
            errors.add("username", MSG_USERNAME_TAKEN);
            render_signup(&state, viewer.user(), FormView::bound(submission.fields(), &errors))
        }
        Err(e) => Err(e.into()),
    }
}

// ---------------------------------------------------------------------------
// Login / logout
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct NextParam {
    next: Option<String>,
}

fn render_login(
    state: &AppState,
    viewer: Option<&User>,
    form: FormView,
    next: Option<&str>,
) -> Result<Response, AppError> {
    View::new("registration/login.html")
        .insert("form", &form)
        .insert("next", &safe_next(next))
        .render(state.templates(), viewer)
}

/// GET /auth/login/
async fn login_form(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Query(params): Query<NextParam>,
) -> Result<Response, AppError> {
    render_login(
        &state,
        viewer.user(),
        FormView::unbound(login_fields("")),
        params.next.as_deref(),
    )
}

/// POST /auth/login/
///
/// `next` may come from the form body or the query string.
async fn login(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Query(params): Query<NextParam>,
    Form(submission): Form<LoginSubmission>,
) -> Result<Response, AppError> {
    let next = submission.next.as_deref().or(params.next.as_deref());

    let mut errors = match submission.validate() {
        Ok(()) => FormErrors::default(),
        Err(errors) => errors,
    };

    if errors.is_empty() {
        match authenticate(state.pool(), &submission.username, &submission.password).await? {
            Some(user) => {
                let ttl = state.config().session_ttl();
                let token = start_session(state.pool(), user.id, ttl).await?;
                tracing::info!(user_id = user.id, "logged in");

                let cookie = session_cookie(&token, ttl, state.config().secure_cookies);
                return Ok(with_cookie(found(safe_next(next).unwrap_or("/")), &cookie));
            }
            None => errors.add(FormErrors::NON_FIELD, MSG_BAD_CREDENTIALS),
        }
    }

    let form = FormView::bound(login_fields(&submission.username), &errors);
    render_login(&state, viewer.user(), form, next)
}

/// GET /auth/logout/
async fn logout(State(state): State<AppState>, MaybeUser(viewer): MaybeUser) -> Result<Response, AppError> {
    if let Some(viewer) = viewer {
        SessionRepo::new(state.pool())
            .delete(&viewer.session_token)
            .await?;
        tracing::info!(user_id = viewer.user.id, "logged out");
    }

    let response = View::new("registration/logged_out.html").render(state.templates(), None)?;
    Ok(with_cookie(response, &clear_session_cookie()))
}

// ---------------------------------------------------------------------------
// Password change
// ---------------------------------------------------------------------------

fn render_password_change(state: &AppState, viewer: &User, form: FormView) -> Result<Response, AppError> {
    View::new("registration/password_change_form.html")
        .insert("form", &form)
        .render(state.templates(), Some(viewer))
}

/// GET /auth/password_change/
async fn password_change_form(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
) -> Result<Response, AppError> {
    render_password_change(&state, &viewer.user, FormView::unbound(password_change_fields()))
}

/// POST /auth/password_change/
///
/// Other sessions of the user are closed; the current one survives.
async fn password_change(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
    Form(submission): Form<PasswordChangeSubmission>,
) -> Result<Response, AppError> {
    let old_ok = submission.old_password.is_empty()
        || verify_password(&submission.old_password, &viewer.user.password_hash);

    let password = match (submission.validate(), old_ok) {
        (Ok(password), true) => password,
        (result, old_ok) => {
            let mut errors = result.err().unwrap_or_default();
            if !old_ok {
                errors.add("old_password", MSG_WRONG_OLD_PASSWORD);
            }
            let form = FormView::bound(password_change_fields(), &errors);
            return render_password_change(&state, &viewer.user, form);
        }
    };

    UserRepo::new(state.pool())
        .set_password(viewer.user.id, &hash_password(password.as_str()))
        .await?;
    let closed = SessionRepo::new(state.pool())
        .delete_others(viewer.user.id, &viewer.session_token)
        .await?;

    tracing::info!(user_id = viewer.user.id, closed_sessions = closed, "password changed");
    Ok(found(PASSWORD_CHANGE_DONE_URL))
}

/// GET /auth/password_change/done/
async fn password_change_done(
    State(state): State<AppState>,
    RequireUser(viewer): RequireUser,
) -> Result<Response, AppError> {
    View::new("registration/password_change_done.html").render(state.templates(), Some(&viewer.user))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/signup/", get(signup_form).post(signup))
        .route("/auth/login/", get(login_form).post(login))
        .route("/auth/logout/", get(logout))
        .route(
            "/auth/password_change/",
            get(password_change_form).post(password_change),
        )
        .route("/auth/password_change/done/", get(password_change_done))
}
