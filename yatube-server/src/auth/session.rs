//! Session cookies
//!
//! The cookie carries an opaque random token; everything else lives in the
//! `sessions` table.

use std::time::Duration;

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use chrono::Utc;
use rand::RngCore;
use sqlx::SqlitePool;

use super::password::{to_hex, verify_password};
use crate::db::{DbError, SessionRepo, User, UserRepo};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "sessionid";

/// Generate a fresh 256-bit session token.
pub fn new_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    to_hex(&bytes)
}

/// Read the session token from the request's `Cookie` headers.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim_matches('"').to_owned())
        .filter(|token| !token.is_empty())
}

/// `Set-Cookie` value establishing a session.
pub fn session_cookie(token: &str, ttl: Duration, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        ttl.as_secs()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value removing the session cookie.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Check credentials. Unknown users and wrong passwords both yield `None`.
pub async fn authenticate(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<Option<User>, DbError> {
    match UserRepo::new(pool).get_by_username(username.trim()).await {
        Ok(user) if verify_password(password, &user.password_hash) => Ok(Some(user)),
        Ok(_) | Err(DbError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Open a session for `user_id`, returning its token.
pub async fn start_session(
    pool: &SqlitePool,
    user_id: i64,
    ttl: Duration,
) -> Result<String, DbError> {
    let token = new_token();
    let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(14));
    SessionRepo::new(pool)
        .create(&token, user_id, Utc::now() + ttl)
        .await?;
    Ok(token)
}
