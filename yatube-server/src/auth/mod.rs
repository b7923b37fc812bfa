//! Accounts: password hashing and cookie sessions

pub mod password;
pub mod session;

pub use password::{hash_password, verify_password};
pub use session::{
    authenticate, clear_session_cookie, session_cookie, start_session, token_from_headers,
    SESSION_COOKIE,
};
