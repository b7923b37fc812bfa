//! HTTP layer
//!
//! Axum router with:
//! - HTML pages rendered from Tera templates
//! - Cookie sessions
//! - Template-backed 404 / 500 pages
//! - Graceful shutdown

pub mod error;
pub mod extractors;
pub mod forms;
pub mod render;
pub mod routes;
pub mod server;

pub use error::AppError;
pub use render::{RenderedTemplate, Templates};
pub use server::{build_router, run_server, ServerError};
