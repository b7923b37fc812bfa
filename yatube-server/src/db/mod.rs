//! Database layer - connection pool and repositories
//!
//! # Design Principles
//!
//! - Connection pool, never a shared `Mutex<Connection>`
//! - All list operations use JOINs - no N+1 queries
//! - Rely on DB constraints, handle conflicts - no check-then-insert

pub mod pool;
pub mod repos;

pub use pool::{create_memory_pool, create_pool, migrate};
pub use repos::*;
