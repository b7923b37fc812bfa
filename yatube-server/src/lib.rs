//! yatube-server: a small blogging platform
//!
//! Users publish posts, file them under community groups, comment on each
//! other's posts and follow authors. Pages are server-rendered HTML backed
//! by SQLite.

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod http;
pub mod media;
pub mod models;
pub mod state;

pub use config::{ConfigError, ServerConfig};
pub use http::{build_router, run_server, AppError, RenderedTemplate, ServerError};
pub use state::AppState;
