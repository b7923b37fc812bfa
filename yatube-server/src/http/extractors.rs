//! Custom Axum extractors

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};

use super::error::AppError;
use super::render::found;
use crate::auth::token_from_headers;
use crate::db::{SessionRepo, User};
use crate::state::AppState;

/// Where anonymous visitors are sent
pub const LOGIN_URL: &str = "/auth/login/";

/// The signed-in user and the session they came in on
#[derive(Debug, Clone)]
pub struct Viewer {
    pub user: User,
    pub session_token: String,
}

/// Resolve the session cookie, at most once per request.
async fn viewer_from_parts(parts: &mut Parts, state: &AppState) -> Result<Option<Viewer>, AppError> {
    if let Some(cached) = parts.extensions.get::<Option<Viewer>>() {
        return Ok(cached.clone());
    }

    let viewer = match token_from_headers(&parts.headers) {
        Some(token) => SessionRepo::new(state.pool())
            .user_for_token(&token)
            .await?
            .map(|user| Viewer {
                user,
                session_token: token,
            }),
        None => None,
    };

    parts.extensions.insert(viewer.clone());
    Ok(viewer)
}

/// Signed-in user if there is one
pub struct MaybeUser(pub Option<Viewer>);

impl MaybeUser {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref().map(|v| &v.user)
    }

    pub fn id(&self) -> Option<i64> {
        self.user().map(|u| u.id)
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Self(viewer_from_parts(parts, state).await?))
    }
}

/// Signed-in user, or a redirect to the login page
pub struct RequireUser(pub Viewer);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match viewer_from_parts(parts, state).await {
            Ok(Some(viewer)) => Ok(Self(viewer)),
            Ok(None) => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                Err(found(&login_url(next)))
            }
            Err(e) => Err(e.into_response()),
        }
    }
}

/// Login page URL that returns to `next` afterwards.
pub fn login_url(next: &str) -> String {
    format!("{LOGIN_URL}?next={}", encode_keep_slashes(next))
}

pub(crate) fn encode_keep_slashes(value: &str) -> String {
    urlencoding::encode(value).replace("%2F", "/")
}

/// Only same-site absolute paths are followed after login.
///
/// Control characters are refused outright: browsers drop tabs and newlines
/// from a `Location`, so `/\t/host` would turn into `//host`.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| {
        n.starts_with('/')
            && !n.starts_with("//")
            && !n.contains('\\')
            && !n.chars().any(|c| c.is_control())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_url_keeps_slashes() {
        assert_eq!(login_url("/new"), "/auth/login/?next=/new");
        assert_eq!(
            login_url("/TestUser/1/edit/"),
            "/auth/login/?next=/TestUser/1/edit/"
        );
        assert_eq!(login_url("/?page=2"), "/auth/login/?next=/%3Fpage%3D2");
    }

    #[test]
    fn next_must_be_local() {
        assert_eq!(safe_next(Some("/follow/")), Some("/follow/"));
        assert_eq!(safe_next(Some("//evil.example")), None);
        assert_eq!(safe_next(Some("https://evil.example")), None);
        assert_eq!(safe_next(Some("/\\evil.example")), None);
        assert_eq!(safe_next(Some("/\t/evil.example/")), None);
        assert_eq!(safe_next(Some("/\r\n/evil.example/")), None);
        assert_eq!(safe_next(Some("/\u{0}/x")), None);
        assert_eq!(safe_next(None), None);
    }
}
